use crate::SessionState;

use error_location::ErrorLocation;
use thiserror::Error;

/// Macro engine errors with source location tracking.
#[derive(Error, Debug)]
pub enum MacroError {
    /// Operation not allowed from the current session state.
    #[error("Cannot {operation} while {state:?} {location}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the session was in when the operation was rejected.
        state: SessionState,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No macro with the requested name exists in the store.
    #[error("Macro not found: {name} {location}")]
    NotFound {
        /// Requested macro name.
        name: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Persisted macro data could not be interpreted.
    #[error("Corrupt macro {name}: {reason} {location}")]
    CorruptMacro {
        /// Name of the macro being loaded.
        name: String,
        /// Description of what was wrong with the document.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The injection backend rejected a synthetic input action.
    #[error("Injection failed at event {index}: {reason} {location}")]
    Injection {
        /// Index of the event that could not be synthesized.
        index: usize,
        /// Description reported by the backend.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The OS refused to install the global input hook.
    #[error("Input hook permission denied: {reason} {location}")]
    PermissionDenied {
        /// Description reported by the hook backend.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Macro name cannot be used as a store key.
    #[error("Invalid macro name {name:?}: {reason} {location}")]
    InvalidMacroName {
        /// Rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Playback speed multiplier is not a positive finite number.
    #[error("Invalid playback speed: {speed} {location}")]
    InvalidSpeed {
        /// Rejected speed multiplier.
        speed: f64,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The notification backend could not show a message.
    #[error("Notification failed: {reason} {location}")]
    NotificationFailed {
        /// Description reported by the backend.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A background worker thread panicked.
    #[error("The {name} thread panicked {location}")]
    WorkerPanicked {
        /// Name of the worker thread.
        name: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A background worker thread could not be started.
    #[error("Failed to spawn {name} thread: {source} {location}")]
    ThreadSpawn {
        /// Name of the worker thread.
        name: &'static str,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for MacroError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        MacroError::Io {
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Result type alias using [`MacroError`].
pub type Result<T> = std::result::Result<T, MacroError>;
