/// Session states. Recording and Playing/Paused are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Neither recording nor playing.
    Idle,
    /// Capturing global input.
    Recording,
    /// Replaying a macro.
    Playing,
    /// Replay suspended at the current event.
    Paused,
}
