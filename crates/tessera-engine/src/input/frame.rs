use std::collections::HashSet;

use super::types::{Button, InputEvent};

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what changed
/// since the previous frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Buttons that went down this frame.
    pub pressed: HashSet<Button>,

    /// Buttons that went up this frame.
    pub released: HashSet<Button>,

    /// Where a touch started this frame, in bottom-screen pixels.
    pub touch_began: Option<(f32, f32)>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.pressed.clear();
        self.released.clear();
        self.touch_began = None;
    }

    #[inline]
    pub fn was_pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    #[inline]
    pub fn was_released(&self, button: Button) -> bool {
        self.released.contains(&button)
    }
}
