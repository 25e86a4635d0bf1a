//! Input subsystem.
//!
//! A small pad (buttons plus a bottom-screen touch point). The public API
//! does not expose winit types; `platform` translates window events.

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{Button, ButtonState, InputEvent};
