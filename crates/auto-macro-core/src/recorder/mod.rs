//! Capture of global input into timestamped macros.

pub(crate) mod assembler;
mod capture;

pub use capture::Recorder;

/// Default minimum pointer travel, in pixels, for a move to be recorded.
pub const DEFAULT_MIN_MOVE_DELTA: f64 = 3.0;

/// Recorder tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderSettings {
    /// Minimum euclidean distance from the last recorded pointer position
    /// for a move to be recorded. `0.0` records every distinct position.
    pub min_move_delta: f64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            min_move_delta: DEFAULT_MIN_MOVE_DELTA,
        }
    }
}
