use crate::{
    CoreResult, Macro, MacroError,
    player::{
        InjectorFactory,
        control::{PlaybackControl, Wait},
        held_inputs::HeldInputs,
        injector::inject,
    },
};

use std::{
    panic::{self, AssertUnwindSafe, Location},
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tracing::{error, info, instrument, warn};

/// How a playback run ended.
#[derive(Debug)]
pub enum PlaybackOutcome {
    /// Every event was synthesized.
    Completed {
        /// Number of events played.
        events: usize,
    },
    /// Stopped before the event at `at_index` was synthesized.
    Cancelled {
        /// Index of the first event that was not played.
        at_index: usize,
    },
    /// Playback halted on an error, typically [`MacroError::Injection`].
    Failed(MacroError),
}

/// Control surface of a running playback, cheap to clone.
#[derive(Debug, Clone)]
pub struct PlaybackRemote {
    control: Arc<PlaybackControl>,
}

impl PlaybackRemote {
    /// Suspend at the current position. Returns `false` if not running.
    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    /// Continue from the paused position. Returns `false` if not paused.
    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    /// Abort playback. Held inputs are released by the playback thread.
    pub fn cancel(&self) {
        self.control.cancel();
    }
}

#[derive(Debug, Default)]
struct Finish {
    finished: bool,
    outcome: Option<PlaybackOutcome>,
}

/// Signalled once a playback thread has released its held inputs and run
/// its completion callback. Any number of threads may wait on it; the
/// outcome itself goes to the first one that collects it.
#[derive(Debug, Default)]
pub(crate) struct PlaybackCompletion {
    slot: Mutex<Finish>,
    done: Condvar,
}

impl PlaybackCompletion {
    fn lock(&self) -> MutexGuard<'_, Finish> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish(&self, outcome: PlaybackOutcome) {
        let mut slot = self.lock();
        slot.finished = true;
        slot.outcome = Some(outcome);
        self.done.notify_all();
    }

    fn wait_finished(&self) -> MutexGuard<'_, Finish> {
        let mut slot = self.lock();
        while !slot.finished {
            slot = self.done.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
        slot
    }

    /// Block until the run has finished.
    pub(crate) fn wait(&self) {
        drop(self.wait_finished());
    }

    /// Block until the run has finished, then collect its outcome.
    pub(crate) fn wait_outcome(&self) -> Option<PlaybackOutcome> {
        self.wait_finished().outcome.take()
    }

    fn take_outcome(&self) -> Option<PlaybackOutcome> {
        self.lock().outcome.take()
    }
}

/// Handle to a playback thread.
#[derive(Debug)]
pub struct PlaybackHandle {
    remote: PlaybackRemote,
    completion: Arc<PlaybackCompletion>,
    thread: JoinHandle<()>,
}

impl PlaybackHandle {
    /// A clonable control surface for this run.
    pub fn remote(&self) -> PlaybackRemote {
        self.remote.clone()
    }

    pub(crate) fn completion(&self) -> Arc<PlaybackCompletion> {
        Arc::clone(&self.completion)
    }

    /// Wait for the playback thread and return its outcome.
    #[track_caller]
    pub fn join(self) -> PlaybackOutcome {
        let location = ErrorLocation::from(Location::caller());
        if self.thread.join().is_err() {
            error!("Playback thread panicked");
        }
        self.completion.take_outcome().unwrap_or(PlaybackOutcome::Failed(
            MacroError::WorkerPanicked {
                name: "playback",
                location,
            },
        ))
    }
}

/// Replays macros through an injection backend.
#[derive(Clone)]
pub struct Player {
    injector_factory: InjectorFactory,
}

impl Player {
    /// Create a player that builds its injector with `injector_factory`.
    pub fn new(injector_factory: InjectorFactory) -> Self {
        Self { injector_factory }
    }

    /// Start replaying `recorded` at `speed` on a new thread.
    ///
    /// `on_finish` runs on the playback thread after held inputs have been
    /// released and before the run is marked finished.
    ///
    /// # Errors
    ///
    /// `InvalidSpeed` if `speed` is not finite and positive, `ThreadSpawn`
    /// if the playback thread cannot start.
    #[track_caller]
    #[instrument(skip(self, recorded, on_finish), fields(name = %recorded.name))]
    pub fn play<F>(&self, recorded: Arc<Macro>, speed: f64, on_finish: F) -> CoreResult<PlaybackHandle>
    where
        F: FnOnce(&PlaybackOutcome) + Send + 'static,
    {
        let speed = validate_speed(speed)?;
        let control = Arc::new(PlaybackControl::new());
        let factory = Arc::clone(&self.injector_factory);
        let worker_control = Arc::clone(&control);
        let completion = Arc::new(PlaybackCompletion::default());
        let worker_completion = Arc::clone(&completion);

        let thread = thread::Builder::new()
            .name("playback".to_string())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    run(&recorded, speed, &worker_control, &factory)
                }))
                .unwrap_or_else(|_| {
                    error!("Playback run panicked");
                    PlaybackOutcome::Failed(MacroError::WorkerPanicked {
                        name: "playback",
                        location: ErrorLocation::from(Location::caller()),
                    })
                });

                if panic::catch_unwind(AssertUnwindSafe(|| on_finish(&outcome))).is_err() {
                    error!("Playback completion callback panicked");
                }
                worker_completion.finish(outcome);
            })
            .map_err(|source| MacroError::ThreadSpawn {
                name: "playback",
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(speed, "Playback started");

        Ok(PlaybackHandle {
            remote: PlaybackRemote { control },
            completion,
            thread,
        })
    }
}

/// Check that `speed` is a usable multiplier.
#[track_caller]
pub fn validate_speed(speed: f64) -> CoreResult<f64> {
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(MacroError::InvalidSpeed {
            speed,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Deadline offset of an event recorded at `timestamp_ms` when played at
/// `speed`.
pub(crate) fn scaled_offset(timestamp_ms: u64, speed: f64) -> Duration {
    Duration::try_from_secs_f64(timestamp_ms as f64 / 1000.0 / speed).unwrap_or(Duration::MAX)
}

fn run(
    recorded: &Macro,
    speed: f64,
    control: &PlaybackControl,
    factory: &InjectorFactory,
) -> PlaybackOutcome {
    let mut injector = match factory() {
        Ok(injector) => injector,
        Err(e) => {
            warn!(error = %e, "Injection backend unavailable");
            return PlaybackOutcome::Failed(MacroError::Injection {
                index: 0,
                reason: e.reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let mut held = HeldInputs::default();
    let started = Instant::now();
    control.begin();

    for (index, event) in recorded.events.iter().enumerate() {
        if control.wait_until(scaled_offset(event.timestamp_ms, speed)) == Wait::Cancelled {
            held.release_all(injector.as_mut());
            info!(
                at_index = index,
                elapsed_ms = started.elapsed().as_millis(),
                "Playback cancelled"
            );
            return PlaybackOutcome::Cancelled { at_index: index };
        }

        if let Err(e) = inject(injector.as_mut(), &event.action) {
            held.release_all(injector.as_mut());
            warn!(index, kind = ?event.kind(), error = %e, "Injection rejected");
            return PlaybackOutcome::Failed(MacroError::Injection {
                index,
                reason: e.reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        held.observe(&event.action);
    }

    // A macro may end with inputs still down, e.g. when recording stopped
    // mid-press.
    held.release_all(injector.as_mut());

    info!(
        events = recorded.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "Playback complete"
    );

    PlaybackOutcome::Completed {
        events: recorded.len(),
    }
}
