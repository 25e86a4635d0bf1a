use std::fmt;

/// Pad button identifier.
///
/// The runtime maps keyboard keys onto these; see
/// [`platform::map_key`](super::platform::map_key) for the bindings.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    L,
    R,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 12] = [
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::L,
        Self::R,
        Self::Start,
        Self::Select,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
    ];
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Platform-agnostic input events emitted by the runtime.
///
/// Touch coordinates are bottom-screen pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Button {
        button: Button,
        state: ButtonState,
        /// True when the event is a key repeat.
        repeat: bool,
    },

    /// The pointer moved; `None` when it is off the bottom screen.
    TouchMoved(Option<(f32, f32)>),

    TouchPressed,
    TouchReleased,

    /// Window focus change.
    Focused(bool),
}
