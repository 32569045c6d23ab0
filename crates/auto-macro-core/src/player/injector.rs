use crate::{InputAction, KeyCode, MouseButton};

use std::sync::Arc;

use thiserror::Error;

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Transition to the down state.
    Press,
    /// Transition to the up state.
    Release,
}

/// The injection backend refused an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct InjectionRejected {
    /// Backend-supplied description.
    pub reason: String,
}

impl InjectionRejected {
    /// Wrap a backend error description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Synthesizes OS-level input.
///
/// Implementations need not be `Send`: the player builds its injector on
/// the playback thread through an [`InjectorFactory`].
pub trait InputInjector {
    /// Move the pointer to absolute screen coordinates.
    fn move_mouse(&mut self, x: i32, y: i32) -> Result<(), InjectionRejected>;

    /// Press or release a mouse button.
    fn click(&mut self, button: MouseButton, direction: Direction)
    -> Result<(), InjectionRejected>;

    /// Scroll the wheel. Positive `dy` scrolls up, positive `dx` right.
    fn scroll(&mut self, dx: i64, dy: i64) -> Result<(), InjectionRejected>;

    /// Press or release a key.
    fn key(&mut self, key: KeyCode, direction: Direction) -> Result<(), InjectionRejected>;
}

/// Builds an injector on the thread that will use it.
pub type InjectorFactory =
    Arc<dyn Fn() -> Result<Box<dyn InputInjector>, InjectionRejected> + Send + Sync>;

/// Synthesize one recorded action.
pub(crate) fn inject(
    injector: &mut dyn InputInjector,
    action: &InputAction,
) -> Result<(), InjectionRejected> {
    match *action {
        InputAction::MouseMove { x, y } => injector.move_mouse(x, y),
        InputAction::MouseDown { button } => injector.click(button, Direction::Press),
        InputAction::MouseUp { button } => injector.click(button, Direction::Release),
        InputAction::MouseScroll { dx, dy } => injector.scroll(dx, dy),
        InputAction::KeyDown { key } => injector.key(key, Direction::Press),
        InputAction::KeyUp { key } => injector.key(key, Direction::Release),
    }
}
