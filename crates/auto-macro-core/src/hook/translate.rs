use crate::{KeyCode, MouseButton, hook::RawInput};

use rdev::{Button, EventType, Key};

/// Convert an rdev event into the engine's raw input, if it has a
/// counterpart.
pub(crate) fn raw_input(event_type: &EventType) -> Option<RawInput> {
    let input = match *event_type {
        EventType::MouseMove { x, y } => RawInput::MouseMove { x, y },
        EventType::ButtonPress(button) => RawInput::Button {
            button: mouse_button(button)?,
            pressed: true,
        },
        EventType::ButtonRelease(button) => RawInput::Button {
            button: mouse_button(button)?,
            pressed: false,
        },
        EventType::Wheel { delta_x, delta_y } => RawInput::Wheel {
            dx: delta_x,
            dy: delta_y,
        },
        EventType::KeyPress(key) => RawInput::Key {
            key: key_code(key)?,
            pressed: true,
        },
        EventType::KeyRelease(key) => RawInput::Key {
            key: key_code(key)?,
            pressed: false,
        },
    };
    Some(input)
}

pub(crate) fn mouse_button(button: Button) -> Option<MouseButton> {
    match button {
        Button::Left => Some(MouseButton::Left),
        Button::Right => Some(MouseButton::Right),
        Button::Middle => Some(MouseButton::Middle),
        // X buttons as reported by the Windows and X11 backends.
        Button::Unknown(1) | Button::Unknown(8) => Some(MouseButton::Back),
        Button::Unknown(2) | Button::Unknown(9) => Some(MouseButton::Forward),
        Button::Unknown(_) => None,
    }
}

pub(crate) fn key_code(key: Key) -> Option<KeyCode> {
    let code = match key {
        Key::Alt => KeyCode::Alt,
        Key::AltGr => KeyCode::AltGr,
        Key::Backspace => KeyCode::Backspace,
        Key::CapsLock => KeyCode::CapsLock,
        Key::ControlLeft | Key::ControlRight => KeyCode::Control,
        Key::Delete | Key::KpDelete => KeyCode::Delete,
        Key::DownArrow => KeyCode::Down,
        Key::End => KeyCode::End,
        Key::Escape => KeyCode::Escape,
        Key::F1 => KeyCode::F(1),
        Key::F2 => KeyCode::F(2),
        Key::F3 => KeyCode::F(3),
        Key::F4 => KeyCode::F(4),
        Key::F5 => KeyCode::F(5),
        Key::F6 => KeyCode::F(6),
        Key::F7 => KeyCode::F(7),
        Key::F8 => KeyCode::F(8),
        Key::F9 => KeyCode::F(9),
        Key::F10 => KeyCode::F(10),
        Key::F11 => KeyCode::F(11),
        Key::F12 => KeyCode::F(12),
        Key::Home => KeyCode::Home,
        Key::LeftArrow => KeyCode::Left,
        Key::MetaLeft | Key::MetaRight => KeyCode::Meta,
        Key::PageDown => KeyCode::PageDown,
        Key::PageUp => KeyCode::PageUp,
        Key::Return | Key::KpReturn => KeyCode::Return,
        Key::RightArrow => KeyCode::Right,
        Key::ShiftLeft | Key::ShiftRight => KeyCode::Shift,
        Key::Space => KeyCode::Space,
        Key::Tab => KeyCode::Tab,
        Key::UpArrow => KeyCode::Up,
        Key::Unknown(code) => KeyCode::Raw(code),
        other => KeyCode::Char(printable(other)?),
    };
    Some(code)
}

fn printable(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        Key::BackQuote => '`',
        Key::Minus | Key::KpMinus => '-',
        Key::Equal => '=',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::SemiColon => ';',
        Key::Quote => '\'',
        Key::BackSlash | Key::IntlBackslash => '\\',
        Key::Comma => ',',
        Key::Dot => '.',
        Key::Slash | Key::KpDivide => '/',
        Key::KpPlus => '+',
        Key::KpMultiply => '*',
        _ => return None,
    };
    Some(c)
}
