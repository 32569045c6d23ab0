use crate::{
    InputAction, KeyCode, MouseButton,
    player::{Direction, InputInjector},
};

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeldInput {
    Key(KeyCode),
    Button(MouseButton),
}

/// Keys and buttons pressed by playback and not yet released, in press
/// order.
#[derive(Debug, Default)]
pub(crate) struct HeldInputs {
    held: Vec<HeldInput>,
}

impl HeldInputs {
    /// Track the effect of an action that was injected successfully.
    pub(crate) fn observe(&mut self, action: &InputAction) {
        match *action {
            InputAction::KeyDown { key } => self.press(HeldInput::Key(key)),
            InputAction::KeyUp { key } => self.lift(HeldInput::Key(key)),
            InputAction::MouseDown { button } => self.press(HeldInput::Button(button)),
            InputAction::MouseUp { button } => self.lift(HeldInput::Button(button)),
            InputAction::MouseMove { .. } | InputAction::MouseScroll { .. } => {}
        }
    }

    /// Release everything still held, most recent press first.
    ///
    /// Release failures are logged and skipped so one stuck input does not
    /// prevent the others from being released.
    pub(crate) fn release_all(&mut self, injector: &mut dyn InputInjector) {
        if self.held.is_empty() {
            return;
        }

        debug!(count = self.held.len(), "Releasing held inputs");

        while let Some(input) = self.held.pop() {
            let result = match input {
                HeldInput::Key(key) => injector.key(key, Direction::Release),
                HeldInput::Button(button) => injector.click(button, Direction::Release),
            };
            if let Err(e) = result {
                warn!(input = ?input, error = %e, "Failed to release held input");
            }
        }
    }

    fn press(&mut self, input: HeldInput) {
        if !self.held.contains(&input) {
            self.held.push(input);
        }
    }

    fn lift(&mut self, input: HeldInput) {
        self.held.retain(|held| *held != input);
    }
}
