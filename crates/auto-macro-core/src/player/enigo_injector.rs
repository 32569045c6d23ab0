use crate::{
    KeyCode, MouseButton,
    player::{Direction, InjectionRejected, InjectorFactory, InputInjector},
};

use std::sync::Arc;

use enigo::{Axis, Button, Coordinate, Enigo, Key, Keyboard, Mouse, Settings};
use tracing::debug;

/// [`InputInjector`] backed by `enigo`.
///
/// `Enigo` is not `Send`, so instances are created on the thread that uses
/// them; see [`EnigoInjector::factory`].
pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    /// Connect to the platform input backend.
    pub fn new() -> Result<Self, InjectionRejected> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectionRejected::new(format!("Failed to create Enigo: {}", e)))?;

        debug!("Enigo injector created");

        Ok(Self { enigo })
    }

    /// Factory producing a fresh injector on the calling thread.
    pub fn factory() -> InjectorFactory {
        Arc::new(|| Ok(Box::new(EnigoInjector::new()?) as Box<dyn InputInjector>))
    }
}

impl InputInjector for EnigoInjector {
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<(), InjectionRejected> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| InjectionRejected::new(format!("Failed to move mouse: {}", e)))
    }

    fn click(
        &mut self,
        button: MouseButton,
        direction: Direction,
    ) -> Result<(), InjectionRejected> {
        self.enigo
            .button(enigo_button(button)?, enigo_direction(direction))
            .map_err(|e| {
                InjectionRejected::new(format!("Failed to {:?} {:?}: {}", direction, button, e))
            })
    }

    fn scroll(&mut self, dx: i64, dy: i64) -> Result<(), InjectionRejected> {
        // enigo scrolls down and right for positive lengths.
        if dy != 0 {
            self.enigo
                .scroll(clamp_i32(dy.saturating_neg()), Axis::Vertical)
                .map_err(|e| InjectionRejected::new(format!("Failed to scroll: {}", e)))?;
        }
        if dx != 0 {
            self.enigo
                .scroll(clamp_i32(dx), Axis::Horizontal)
                .map_err(|e| InjectionRejected::new(format!("Failed to scroll: {}", e)))?;
        }
        Ok(())
    }

    fn key(&mut self, key: KeyCode, direction: Direction) -> Result<(), InjectionRejected> {
        self.enigo
            .key(enigo_key(key)?, enigo_direction(direction))
            .map_err(|e| {
                InjectionRejected::new(format!("Failed to {:?} key {}: {}", direction, key, e))
            })
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn enigo_direction(direction: Direction) -> enigo::Direction {
    match direction {
        Direction::Press => enigo::Direction::Press,
        Direction::Release => enigo::Direction::Release,
    }
}

fn enigo_button(button: MouseButton) -> Result<Button, InjectionRejected> {
    match button {
        MouseButton::Left => Ok(Button::Left),
        MouseButton::Right => Ok(Button::Right),
        MouseButton::Middle => Ok(Button::Middle),
        #[cfg(not(target_os = "macos"))]
        MouseButton::Back => Ok(Button::Back),
        #[cfg(not(target_os = "macos"))]
        MouseButton::Forward => Ok(Button::Forward),
        #[cfg(target_os = "macos")]
        MouseButton::Back | MouseButton::Forward => Err(InjectionRejected::new(format!(
            "{:?} button is not supported on this platform",
            button
        ))),
    }
}

pub(crate) fn enigo_key(key: KeyCode) -> Result<Key, InjectionRejected> {
    let mapped = match key {
        KeyCode::Alt | KeyCode::AltGr => Key::Alt,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::CapsLock => Key::CapsLock,
        KeyCode::Control => Key::Control,
        KeyCode::Delete => Key::Delete,
        KeyCode::Down => Key::DownArrow,
        KeyCode::End => Key::End,
        KeyCode::Escape => Key::Escape,
        KeyCode::F(1) => Key::F1,
        KeyCode::F(2) => Key::F2,
        KeyCode::F(3) => Key::F3,
        KeyCode::F(4) => Key::F4,
        KeyCode::F(5) => Key::F5,
        KeyCode::F(6) => Key::F6,
        KeyCode::F(7) => Key::F7,
        KeyCode::F(8) => Key::F8,
        KeyCode::F(9) => Key::F9,
        KeyCode::F(10) => Key::F10,
        KeyCode::F(11) => Key::F11,
        KeyCode::F(12) => Key::F12,
        KeyCode::F(n) => {
            return Err(InjectionRejected::new(format!(
                "F{n} is not supported for playback"
            )));
        }
        KeyCode::Home => Key::Home,
        KeyCode::Left => Key::LeftArrow,
        KeyCode::Meta => Key::Meta,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::Return => Key::Return,
        KeyCode::Right => Key::RightArrow,
        KeyCode::Shift => Key::Shift,
        KeyCode::Space => Key::Space,
        KeyCode::Tab => Key::Tab,
        KeyCode::Up => Key::UpArrow,
        KeyCode::Char(c) => Key::Unicode(c),
        KeyCode::Raw(code) => Key::Other(code),
    };
    Ok(mapped)
}
