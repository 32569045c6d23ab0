use crate::{
    CoreResult, InputEvent, Macro, MacroError, SessionState,
    hook::{HookMessage, InputHook},
    recorder::{RecorderSettings, assembler::EventAssembler},
};

use std::{
    mem,
    panic::Location,
    sync::{Arc, Mutex, mpsc},
    thread::{self, JoinHandle},
    time::Instant,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Captures global input into a timestamped event buffer.
///
/// Hook callbacks are queued on a channel; a single consumer thread drains
/// the queue, stamps and coalesces each message, and appends the result to
/// the shared buffer. [`stop`](Recorder::stop) releases the hook, which
/// closes the channel, then joins the consumer so every queued message is
/// in the buffer before it is finalized.
pub struct Recorder {
    hook: Arc<dyn InputHook>,
    settings: RecorderSettings,
    buffer: Arc<Mutex<Vec<InputEvent>>>,
    consumer: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl Recorder {
    /// Create an idle recorder bound to `hook`.
    pub fn new(hook: Arc<dyn InputHook>, settings: RecorderSettings) -> Self {
        Self {
            hook,
            settings,
            buffer: Arc::new(Mutex::new(Vec::new())),
            consumer: None,
            started_at: None,
        }
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.consumer.is_some()
    }

    /// Instant event timestamps are measured from, while recording.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Settings applied to the next recording.
    pub fn settings(&self) -> RecorderSettings {
        self.settings
    }

    /// Replace the settings used by the next recording.
    pub fn set_settings(&mut self, settings: RecorderSettings) {
        self.settings = settings;
    }

    /// Clear the buffer, acquire the hook and start capturing.
    ///
    /// # Errors
    ///
    /// `InvalidState` if already recording, `PermissionDenied` if the hook
    /// cannot be installed, `ThreadSpawn` if the consumer cannot start.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.consumer.is_some() {
            return Err(MacroError::InvalidState {
                operation: "start recording",
                state: SessionState::Recording,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let (sink, queue) = mpsc::channel::<HookMessage>();
        let started_at = Instant::now();

        self.hook.acquire(sink)?;

        let buffer = Arc::clone(&self.buffer);
        let min_move_delta = self.settings.min_move_delta;

        let spawned = thread::Builder::new()
            .name("recorder".to_string())
            .spawn(move || {
                let mut assembler = EventAssembler::new(started_at, min_move_delta);
                let mut pending = Vec::with_capacity(2);

                while let Ok(message) = queue.recv() {
                    assembler.push(message, &mut pending);
                    if pending.is_empty() {
                        continue;
                    }
                    // Recover from lock poison rather than dropping events.
                    let mut buf = buffer.lock().unwrap_or_else(|e| {
                        error!("Event buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    buf.append(&mut pending);
                }

                debug!("Recorder queue closed");
            });

        match spawned {
            Ok(handle) => {
                self.consumer = Some(handle);
                self.started_at = Some(started_at);
                info!(
                    min_move_delta = self.settings.min_move_delta,
                    "Recording started"
                );
                Ok(())
            }
            Err(source) => {
                self.hook.release();
                Err(MacroError::ThreadSpawn {
                    name: "recorder",
                    source,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Release the hook and finalize the buffer into a [`Macro`].
    ///
    /// # Errors
    ///
    /// `InvalidState` if not recording.
    #[track_caller]
    #[instrument(skip(self, name))]
    pub fn stop(&mut self, name: impl Into<String>) -> CoreResult<Macro> {
        let Some(consumer) = self.consumer.take() else {
            return Err(MacroError::InvalidState {
                operation: "stop recording",
                state: SessionState::Idle,
                location: ErrorLocation::from(Location::caller()),
            });
        };

        self.started_at = None;

        // Dropping the sender lets the consumer drain what is queued and exit.
        self.hook.release();

        if consumer.join().is_err() {
            warn!("Recorder consumer thread panicked, keeping captured events");
        }

        let events = mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()));
        let recorded = Macro::new(name, events);

        info!(
            name = %recorded.name,
            event_count = recorded.len(),
            duration_ms = recorded.duration_ms(),
            "Recording stopped"
        );

        Ok(recorded)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.consumer.is_some() {
            self.hook.release();
        }
    }
}
