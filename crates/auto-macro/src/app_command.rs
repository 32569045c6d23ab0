use uuid::Uuid;

/// Commands sent from the hotkey handler and tray menu to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start recording when idle, or stop and save the recording.
    ToggleRecording {
        /// Correlates the log lines of one hotkey press.
        session_id: Uuid,
    },
    /// Play the last macro when idle, pause when playing, resume when paused.
    TogglePlayback {
        /// Correlates the log lines of one hotkey press.
        session_id: Uuid,
    },
    /// Cancel playback, releasing any held inputs.
    StopPlayback,
    /// Request application shutdown.
    Shutdown,
}
