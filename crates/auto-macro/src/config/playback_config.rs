use crate::config::default_speed;

use serde::{Deserialize, Serialize};

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Speed multiplier used by the play hotkey.
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Macro played by the play hotkey; updated after every recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_macro: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            last_macro: None,
        }
    }
}
