use crate::config::default_min_move_delta;

use serde::{Deserialize, Serialize};

/// Recording configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Minimum pointer travel in pixels before a move is recorded.
    #[serde(default = "default_min_move_delta")]
    pub min_move_delta: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_move_delta: default_min_move_delta(),
        }
    }
}
