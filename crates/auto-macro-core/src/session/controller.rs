//! Session state machine guarding the recorder and player.
//!
//! Transitions:
//!
//! ```text
//! Idle --record_start--> Recording --record_stop--> Idle
//! Idle --play--> Playing --pause--> Paused --resume--> Playing
//! Playing | Paused --stop / completion / failure--> Idle
//! ```
//!
//! Every operation takes the single session mutex, validates the source
//! state and either completes the transition or returns an error with the
//! state unchanged.

use crate::{
    CoreResult, Macro, MacroError, MacroStore, SessionState,
    hook::{GlobalInputHook, InputHook},
    notification::{DesktopNotifier, Notifier, SilentNotifier, notify_best_effort},
    player::{
        DEFAULT_PLAYBACK_SPEED, EnigoInjector, InjectorFactory, PlaybackOutcome, PlaybackRemote,
        Player, playback::PlaybackCompletion, validate_speed,
    },
    recorder::{Recorder, RecorderSettings},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Local;
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Tunables applied by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Recorder tuning.
    pub recorder: RecorderSettings,
    /// Speed used by [`SessionController::play_default`].
    pub default_speed: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            recorder: RecorderSettings::default(),
            default_speed: DEFAULT_PLAYBACK_SPEED,
        }
    }
}

/// A playback run that halted on an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFailure {
    /// Name of the macro that was playing.
    pub name: String,
    /// Rendered error.
    pub reason: String,
}

struct ActivePlayback {
    run_id: u64,
    name: String,
    remote: PlaybackRemote,
    completion: Arc<PlaybackCompletion>,
}

struct Session {
    state: SessionState,
    recorder: Recorder,
    playback: Option<ActivePlayback>,
    /// Completion of the most recent run, kept after it finishes.
    last_run: Option<Arc<PlaybackCompletion>>,
    last_failure: Option<PlaybackFailure>,
    next_run_id: u64,
    default_speed: f64,
}

/// Thread-safe facade over recording, storage and playback.
///
/// All methods may be called from any thread. Blocking is bounded: the
/// longest waits are joining the recorder consumer in
/// [`record_stop`](Self::record_stop) and the playback thread in
/// [`stop`](Self::stop), both of which exit promptly once signalled.
pub struct SessionController {
    session: Arc<Mutex<Session>>,
    store: MacroStore,
    player: Player,
    notifier: Arc<dyn Notifier>,
}

impl SessionController {
    /// Assemble a controller from explicit backends.
    pub fn new(
        store: MacroStore,
        hook: Arc<dyn InputHook>,
        injector_factory: InjectorFactory,
        notifier: Arc<dyn Notifier>,
        settings: SessionSettings,
    ) -> Self {
        let session = Session {
            state: SessionState::Idle,
            recorder: Recorder::new(hook, settings.recorder),
            playback: None,
            last_run: None,
            last_failure: None,
            next_run_id: 1,
            default_speed: settings.default_speed,
        };

        Self {
            session: Arc::new(Mutex::new(session)),
            store,
            player: Player::new(injector_factory),
            notifier,
        }
    }

    /// Controller wired to the OS hook, `enigo` injection and, when
    /// `notifications` is set, desktop notifications.
    pub fn desktop(store: MacroStore, settings: SessionSettings, notifications: bool) -> Self {
        let notifier: Arc<dyn Notifier> = if notifications {
            Arc::new(DesktopNotifier)
        } else {
            Arc::new(SilentNotifier)
        };

        Self::new(
            store,
            Arc::new(GlobalInputHook::new()),
            EnigoInjector::factory(),
            notifier,
            settings,
        )
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Name of the macro being played, if any.
    pub fn active_macro(&self) -> Option<String> {
        self.lock().playback.as_ref().map(|p| p.name.clone())
    }

    /// The most recent playback failure, cleared when the next recording
    /// or playback starts.
    pub fn last_failure(&self) -> Option<PlaybackFailure> {
        self.lock().last_failure.clone()
    }

    /// The macro store backing this controller.
    pub fn store(&self) -> &MacroStore {
        &self.store
    }

    /// Current settings.
    pub fn settings(&self) -> SessionSettings {
        let session = self.lock();
        SessionSettings {
            recorder: session.recorder.settings(),
            default_speed: session.default_speed,
        }
    }

    /// Replace settings. Takes effect for the next recording or playback.
    ///
    /// # Errors
    ///
    /// `InvalidSpeed` if the default speed is unusable.
    #[track_caller]
    pub fn apply_settings(&self, settings: SessionSettings) -> CoreResult<()> {
        validate_speed(settings.default_speed)?;
        let mut session = self.lock();
        session.recorder.set_settings(settings.recorder);
        session.default_speed = settings.default_speed;
        Ok(())
    }

    /// Idle → Recording.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless idle; `PermissionDenied` if the hook is refused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn record_start(&self) -> CoreResult<()> {
        let mut session = self.lock();
        require(&session, &[SessionState::Idle], "start recording")?;

        session.recorder.start()?;
        session.state = SessionState::Recording;
        session.last_failure = None;

        info!("Session recording");

        Ok(())
    }

    /// Recording → Idle, returning the captured macro.
    ///
    /// The macro is named `macro-YYYYMMDD-HHMMSS` (local time), suffixed
    /// if the store already holds that name. It is not saved.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless recording.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn record_stop(&self) -> CoreResult<Macro> {
        let mut session = self.lock();
        require(&session, &[SessionState::Recording], "stop recording")?;

        let name = self.unused_name();
        let result = session.recorder.stop(name);
        session.state = SessionState::Idle;

        result
    }

    /// Idle → Playing the stored macro `name` at `speed`.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless idle, `InvalidSpeed`, `NotFound`,
    /// `CorruptMacro`. The state is unchanged on error.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn play(&self, name: &str, speed: f64) -> CoreResult<()> {
        let mut session = self.lock();
        require(&session, &[SessionState::Idle], "play")?;
        validate_speed(speed)?;

        let recorded = self.store.load(name)?;
        self.start_playback(&mut session, Arc::new(recorded), speed)
    }

    /// [`play`](Self::play) at the configured default speed.
    #[track_caller]
    pub fn play_default(&self, name: &str) -> CoreResult<()> {
        let speed = self.lock().default_speed;
        self.play(name, speed)
    }

    /// Idle → Playing an in-memory macro.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless idle, `InvalidSpeed`.
    #[track_caller]
    #[instrument(skip(self, recorded), fields(name = %recorded.name))]
    pub fn play_macro(&self, recorded: Macro, speed: f64) -> CoreResult<()> {
        let mut session = self.lock();
        require(&session, &[SessionState::Idle], "play")?;
        validate_speed(speed)?;

        self.start_playback(&mut session, Arc::new(recorded), speed)
    }

    /// Playing → Paused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn pause(&self) -> CoreResult<()> {
        let mut session = self.lock();
        require(&session, &[SessionState::Playing], "pause")?;

        if let Some(playback) = session.playback.as_ref() {
            playback.remote.pause();
        }
        session.state = SessionState::Paused;

        info!("Playback paused");

        Ok(())
    }

    /// Paused → Playing.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn resume(&self) -> CoreResult<()> {
        let mut session = self.lock();
        require(&session, &[SessionState::Paused], "resume")?;

        if let Some(playback) = session.playback.as_ref() {
            playback.remote.resume();
        }
        session.state = SessionState::Playing;

        info!("Playback resumed");

        Ok(())
    }

    /// Playing | Paused → Idle.
    ///
    /// Cancels playback and waits for the run to finish, so every key and
    /// button it held has been released when this returns. This holds even
    /// while another thread is in [`wait_for_playback`](Self::wait_for_playback).
    ///
    /// # Errors
    ///
    /// `InvalidState` unless playing or paused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&self) -> CoreResult<()> {
        let playback = {
            let mut session = self.lock();
            require(
                &session,
                &[SessionState::Playing, SessionState::Paused],
                "stop playback",
            )?;

            session.state = SessionState::Idle;
            session.playback.take()
        };

        // The playback thread locks the session when it finishes, so wait
        // only after the guard above is released.
        if let Some(playback) = playback {
            playback.remote.cancel();
            playback.completion.wait();
            debug!(name = %playback.name, "Playback run finished");
        }

        info!("Playback stopped");

        Ok(())
    }

    /// Block until the most recent playback has finished and return how it
    /// ended. Returns immediately if it already finished. `None` if nothing
    /// has played yet or another caller already collected the outcome.
    pub fn wait_for_playback(&self) -> Option<PlaybackOutcome> {
        let completion = self.lock().last_run.clone()?;
        completion.wait_outcome()
    }

    /// Names of stored macros, sorted.
    #[track_caller]
    pub fn list_macros(&self) -> CoreResult<Vec<String>> {
        let mut names: Vec<String> = self.store.list()?.collect();
        names.sort();
        Ok(names)
    }

    /// Persist a macro, replacing one with the same name.
    #[track_caller]
    pub fn save_macro(&self, recorded: &Macro) -> CoreResult<()> {
        self.store.save(recorded)
    }

    /// Delete a stored macro. A playback of it already in progress
    /// continues from its own copy.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete_macro(&self, name: &str) -> CoreResult<()> {
        self.store.delete(name)
    }

    fn start_playback(
        &self,
        session: &mut Session,
        recorded: Arc<Macro>,
        speed: f64,
    ) -> CoreResult<()> {
        let run_id = session.next_run_id;
        session.next_run_id += 1;

        let name = recorded.name.clone();
        let shared = Arc::clone(&self.session);
        let notifier = Arc::clone(&self.notifier);
        let finished_name = name.clone();

        let handle = self.player.play(recorded, speed, move |outcome| {
            {
                let mut session = lock_session(&shared);
                if session
                    .playback
                    .as_ref()
                    .is_some_and(|playback| playback.run_id == run_id)
                {
                    session.playback = None;
                    session.state = SessionState::Idle;
                }
                if let PlaybackOutcome::Failed(e) = outcome {
                    session.last_failure = Some(PlaybackFailure {
                        name: finished_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            report_outcome(notifier.as_ref(), &finished_name, outcome);
        })?;

        let completion = handle.completion();
        session.last_run = Some(Arc::clone(&completion));
        session.last_failure = None;
        session.playback = Some(ActivePlayback {
            run_id,
            name,
            remote: handle.remote(),
            completion,
        });
        session.state = SessionState::Playing;

        info!(run_id, speed, "Session playing");

        Ok(())
    }

    fn unused_name(&self) -> String {
        let base = Local::now().format("macro-%Y%m%d-%H%M%S").to_string();

        let taken = |name: &str| self.store.exists(name).unwrap_or(false);
        if !taken(&base) {
            return base;
        }

        (2u32..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or(base)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(playback) = self.lock().playback.take() {
            warn!(name = %playback.name, "Controller dropped during playback, cancelling");
            playback.remote.cancel();
        }
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    // A poisoned lock means a holder panicked mid-operation; the state
    // machine itself is still a valid value.
    session.lock().unwrap_or_else(|e| {
        error!("Session lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

#[track_caller]
fn require(session: &Session, allowed: &[SessionState], operation: &'static str) -> CoreResult<()> {
    if allowed.contains(&session.state) {
        Ok(())
    } else {
        Err(MacroError::InvalidState {
            operation,
            state: session.state,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

fn report_outcome(notifier: &dyn Notifier, name: &str, outcome: &PlaybackOutcome) {
    match outcome {
        PlaybackOutcome::Completed { events } => {
            notify_best_effort(
                notifier,
                "Playback complete",
                &format!("{name}: {events} events played"),
            );
        }
        PlaybackOutcome::Failed(e) => {
            error!(name, error = %e, "Playback failed");
            notify_best_effort(notifier, "Playback failed", &format!("{name}: {e}"));
        }
        PlaybackOutcome::Cancelled { at_index } => {
            debug!(name, at_index, "Playback cancelled");
        }
    }
}
