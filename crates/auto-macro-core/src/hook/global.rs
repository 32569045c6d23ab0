use crate::{
    CoreResult, MacroError, SessionState,
    hook::{HookMessage, InputHook, translate::raw_input},
};

use std::{
    panic::Location,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread,
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// How long `acquire` waits for the OS listener to report a startup failure.
///
/// `rdev::listen` only returns on error, so silence within this window is
/// taken as a successfully installed hook.
const LISTENER_STARTUP_WINDOW: Duration = Duration::from_millis(150);

/// Subscriber receiving forwarded callbacks. `None` while nobody records.
static SUBSCRIBER: Mutex<Option<Sender<HookMessage>>> = Mutex::new(None);

/// Set once the OS listener thread is running. Cleared if it exits.
static LISTENER_RUNNING: AtomicBool = AtomicBool::new(false);

/// Process-wide global input hook backed by `rdev::listen`.
///
/// The OS hook cannot be unregistered once installed, so the listener
/// thread is started on first [`acquire`](InputHook::acquire) and kept for
/// the process lifetime. Acquire and release only swap the subscriber
/// slot, which makes the hook a singleton no matter how many handles exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalInputHook;

impl GlobalInputHook {
    /// Create a handle to the process-wide hook.
    pub fn new() -> Self {
        Self
    }

    #[track_caller]
    fn ensure_listener() -> CoreResult<()> {
        if LISTENER_RUNNING.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let (startup_tx, startup_rx) = mpsc::channel::<String>();

        let spawned = thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                info!("Global input listener started");

                let result = rdev::listen(|event| {
                    let Some(input) = raw_input(&event.event_type) else {
                        debug!(event = ?event.event_type, "Ignoring unmapped input");
                        return;
                    };
                    let message = HookMessage::now(input);

                    // Recover from lock poison rather than dropping input.
                    let subscriber = SUBSCRIBER.lock().unwrap_or_else(|e| {
                        error!("Hook subscriber lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    if let Some(sink) = subscriber.as_ref() {
                        let _ = sink.send(message);
                    }
                });

                LISTENER_RUNNING.store(false, Ordering::Release);

                if let Err(e) = result {
                    let reason = format!("{:?}", e);
                    error!(reason = %reason, "Global input listener stopped");
                    let _ = startup_tx.send(reason);
                }
            });

        if let Err(source) = spawned {
            LISTENER_RUNNING.store(false, Ordering::Release);
            return Err(MacroError::ThreadSpawn {
                name: "input-hook",
                source,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match startup_rx.recv_timeout(LISTENER_STARTUP_WINDOW) {
            Ok(reason) => Err(MacroError::PermissionDenied {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(RecvTimeoutError::Timeout) => {
                debug!("Global input listener installed");
                Ok(())
            }
            Err(RecvTimeoutError::Disconnected) => Err(MacroError::PermissionDenied {
                reason: "listener exited without reporting an error".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl InputHook for GlobalInputHook {
    #[track_caller]
    #[instrument(skip(self, sink))]
    fn acquire(&self, sink: Sender<HookMessage>) -> CoreResult<()> {
        {
            let subscriber = SUBSCRIBER.lock().unwrap_or_else(|e| e.into_inner());
            if subscriber.is_some() {
                return Err(MacroError::InvalidState {
                    operation: "acquire the input hook",
                    state: SessionState::Recording,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Self::ensure_listener()?;

        let mut subscriber = SUBSCRIBER.lock().unwrap_or_else(|e| e.into_inner());
        if subscriber.is_some() {
            warn!("Input hook acquired concurrently");
            return Err(MacroError::InvalidState {
                operation: "acquire the input hook",
                state: SessionState::Recording,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        *subscriber = Some(sink);

        info!("Input hook acquired");

        Ok(())
    }

    #[instrument(skip(self))]
    fn release(&self) {
        let previous = SUBSCRIBER.lock().unwrap_or_else(|e| e.into_inner()).take();
        if previous.is_some() {
            info!("Input hook released");
        }
    }
}
