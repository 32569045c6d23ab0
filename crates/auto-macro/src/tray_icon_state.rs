use auto_macro_core::SessionState;

/// Tray icon states mirroring the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to record or play.
    Idle,
    /// Capturing input.
    Recording,
    /// Replaying a macro.
    Playing,
    /// Playback suspended.
    Paused,
    /// Idle after a playback that halted on an error.
    Failed,
}

impl From<SessionState> for TrayIconState {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => TrayIconState::Idle,
            SessionState::Recording => TrayIconState::Recording,
            SessionState::Playing => TrayIconState::Playing,
            SessionState::Paused => TrayIconState::Paused,
        }
    }
}

impl TrayIconState {
    /// Hover text for this state.
    pub fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "Auto-Macro - Ready",
            TrayIconState::Recording => "Auto-Macro - Recording...",
            TrayIconState::Playing => "Auto-Macro - Playing...",
            TrayIconState::Paused => "Auto-Macro - Paused",
            TrayIconState::Failed => "Auto-Macro - Last playback failed",
        }
    }

    /// Fill colour of the generated icon.
    pub fn color(self) -> [u8; 4] {
        match self {
            TrayIconState::Idle => [128, 128, 128, 255],
            TrayIconState::Recording => [220, 40, 40, 255],
            TrayIconState::Playing => [40, 180, 70, 255],
            TrayIconState::Paused => [230, 170, 30, 255],
            TrayIconState::Failed => [150, 40, 160, 255],
        }
    }
}
