//! Fire-and-forget user notifications.

use crate::{CoreResult, MacroError};

use std::panic::Location;

use error_location::ErrorLocation;
use notify_rust::Notification;
use tracing::{debug, warn};

/// Application name shown by the notification daemon.
const APP_NAME: &str = "Auto-Macro";

/// Delivers short user-facing messages.
pub trait Notifier: Send + Sync {
    /// Show `message` under `title`.
    fn notify(&self, title: &str, message: &str) -> CoreResult<()>;
}

/// OS toast notifications via `notify-rust`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    #[track_caller]
    fn notify(&self, title: &str, message: &str) -> CoreResult<()> {
        Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(message)
            .show()
            .map(|_| ())
            .map_err(|e| MacroError::NotificationFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Notifier that only logs, for when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, title: &str, message: &str) -> CoreResult<()> {
        debug!(title, message, "Notification suppressed");
        Ok(())
    }
}

/// Deliver a notification, logging instead of propagating failures.
pub fn notify_best_effort(notifier: &dyn Notifier, title: &str, message: &str) {
    if let Err(e) = notifier.notify(title, message) {
        warn!(title, error = %e, "Notification failed");
    }
}
