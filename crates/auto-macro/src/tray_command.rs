use crate::TrayIconState;

/// Requests from the command loop to the UI thread.
///
/// `TrayIcon` is `!Send`, so the tray stays with the tao event loop and is
/// only touched through these messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Show the icon and tooltip for a session state.
    SetState(TrayIconState),
    /// Exit the event loop.
    Shutdown,
}
