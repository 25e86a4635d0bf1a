use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{Button, ButtonState, InputEvent};

/// Current input state of the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,

    /// Pointer position over the bottom screen, if it is over it.
    pub pointer: Option<(f32, f32)>,

    /// Position of the touch in progress.
    pub touch: Option<(f32, f32)>,

    pub held: HashSet<Button>,

    /// The pointer button is down, on or off the bottom screen.
    pointer_down: bool,
}

impl InputState {
    /// Applies an event to the current state and records the deltas in `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // avoid stuck buttons when focus changes mid-press
                    self.held.clear();
                    self.touch = None;
                    self.pointer_down = false;
                }
            }

            InputEvent::Button { button, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.held.insert(button) {
                        frame.pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    if self.held.remove(&button) {
                        frame.released.insert(button);
                    }
                }
            },

            InputEvent::TouchMoved(pos) => {
                self.pointer = pos;
                // dragging off the screen lifts the stylus
                self.touch = if self.pointer_down { pos } else { None };
            }

            InputEvent::TouchPressed => {
                self.pointer_down = true;
                self.touch = self.pointer;
                if self.touch.is_some() {
                    frame.touch_began = self.touch;
                }
            }

            InputEvent::TouchReleased => {
                self.pointer_down = false;
                self.touch = None;
            }
        }

        frame.events.push(ev);
    }

    #[inline]
    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }
}
