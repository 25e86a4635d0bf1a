use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{Button, ButtonState, InputEvent};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// `to_bottom_screen` maps a surface position (physical pixels) onto the
/// bottom screen. Returns `None` for events the input subsystem ignores.
pub fn translate_window_event(
    event: &WindowEvent,
    to_bottom_screen: impl Fn(f32, f32) -> Option<(f32, f32)>,
) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::TouchMoved(None)),

        WindowEvent::CursorMoved { position, .. } => {
            Some(InputEvent::TouchMoved(to_bottom_screen(position.x as f32, position.y as f32)))
        }

        WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => Some(match state {
            ElementState::Pressed => InputEvent::TouchPressed,
            ElementState::Released => InputEvent::TouchReleased,
        }),

        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(code) = event.physical_key else { return None };
            let button = map_key(code)?;
            let state = match event.state {
                ElementState::Pressed => ButtonState::Pressed,
                ElementState::Released => ButtonState::Released,
            };
            Some(InputEvent::Button { button, state, repeat: event.repeat })
        }

        _ => None,
    }
}

/// Keyboard bindings of the pad buttons.
pub fn map_key(code: KeyCode) -> Option<Button> {
    let button = match code {
        KeyCode::KeyX => Button::A,
        KeyCode::KeyZ => Button::B,
        KeyCode::KeyS => Button::X,
        KeyCode::KeyA => Button::Y,
        KeyCode::KeyQ => Button::L,
        KeyCode::KeyW => Button::R,
        KeyCode::Enter => Button::Start,
        KeyCode::Backspace => Button::Select,
        KeyCode::ArrowUp => Button::Up,
        KeyCode::ArrowDown => Button::Down,
        KeyCode::ArrowLeft => Button::Left,
        KeyCode::ArrowRight => Button::Right,
        _ => return None,
    };
    Some(button)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_button_has_a_key() {
        let codes = [
            KeyCode::KeyX,
            KeyCode::KeyZ,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyQ,
            KeyCode::KeyW,
            KeyCode::Enter,
            KeyCode::Backspace,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
        ];
        let mapped: Vec<Button> = codes.iter().filter_map(|c| map_key(*c)).collect();
        assert_eq!(mapped, Button::ALL.to_vec());
        assert_eq!(map_key(KeyCode::F5), None);
    }

    #[test]
    fn focus_passes_through() {
        let ev = WindowEvent::Focused(true);
        assert_eq!(translate_window_event(&ev, |_, _| None), Some(InputEvent::Focused(true)));
        assert_eq!(translate_window_event(&WindowEvent::Destroyed, |_, _| None), None);
    }
}
