use crate::event::{KeyCode, MouseButton};

use serde::{Deserialize, Serialize};

/// One input action, without timing.
///
/// Serialized internally tagged so each event reads as
/// `{"kind": "KeyDown", "key": "a", "timestamp_ms": 50}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InputAction {
    /// Pointer moved to absolute screen coordinates.
    MouseMove {
        /// Horizontal position in pixels.
        x: i32,
        /// Vertical position in pixels.
        y: i32,
    },
    /// Mouse button pressed.
    MouseDown {
        /// Button that was pressed.
        button: MouseButton,
    },
    /// Mouse button released.
    MouseUp {
        /// Button that was released.
        button: MouseButton,
    },
    /// Wheel scrolled. Positive `dy` scrolls up, positive `dx` scrolls right.
    MouseScroll {
        /// Horizontal wheel delta.
        dx: i64,
        /// Vertical wheel delta.
        dy: i64,
    },
    /// Key pressed.
    KeyDown {
        /// Key that was pressed.
        key: KeyCode,
    },
    /// Key released.
    KeyUp {
        /// Key that was released.
        key: KeyCode,
    },
}

/// Discriminant of an [`InputAction`], for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`InputAction::MouseMove`].
    MouseMove,
    /// See [`InputAction::MouseDown`].
    MouseDown,
    /// See [`InputAction::MouseUp`].
    MouseUp,
    /// See [`InputAction::MouseScroll`].
    MouseScroll,
    /// See [`InputAction::KeyDown`].
    KeyDown,
    /// See [`InputAction::KeyUp`].
    KeyUp,
}

impl InputAction {
    /// The kind of this action.
    pub fn kind(&self) -> EventKind {
        match self {
            InputAction::MouseMove { .. } => EventKind::MouseMove,
            InputAction::MouseDown { .. } => EventKind::MouseDown,
            InputAction::MouseUp { .. } => EventKind::MouseUp,
            InputAction::MouseScroll { .. } => EventKind::MouseScroll,
            InputAction::KeyDown { .. } => EventKind::KeyDown,
            InputAction::KeyUp { .. } => EventKind::KeyUp,
        }
    }
}

/// A captured input action stamped with its offset from recording start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// What happened.
    #[serde(flatten)]
    pub action: InputAction,
    /// Milliseconds elapsed since the recording started.
    pub timestamp_ms: u64,
}

impl InputEvent {
    /// Create an event at the given offset.
    pub fn new(timestamp_ms: u64, action: InputAction) -> Self {
        Self {
            action,
            timestamp_ms,
        }
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        self.action.kind()
    }
}
