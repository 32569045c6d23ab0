use serde::{Deserialize, Serialize};

/// Mouse button identifier carried by button events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
    /// Side button, usually "back" in browsers.
    Back,
    /// Side button, usually "forward" in browsers.
    Forward,
}
