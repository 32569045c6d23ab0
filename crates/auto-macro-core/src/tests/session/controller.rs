use crate::{
    InputAction, InputEvent, KeyCode, Macro, MacroError, MacroStore, Notifier, PlaybackOutcome,
    SessionController, SessionSettings, SessionState,
    hook::{InputHook, RawInput},
    player::{Direction, InjectorFactory},
    tests::support::{
        CountingNotifier, DeniedHook, InjectionLog, Injected, ManualHook, scripted_factory,
    },
};

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use tempfile::TempDir;

struct Harness {
    _temp: TempDir,
    hook: Arc<ManualHook>,
    log: InjectionLog,
    notifier: Arc<CountingNotifier>,
    session: SessionController,
}

#[allow(clippy::unwrap_used)]
fn harness_with(reject: Option<Injected>, notifier: CountingNotifier) -> Harness {
    let temp = TempDir::new().unwrap();
    let store = MacroStore::open(temp.path()).unwrap();
    let hook = Arc::new(ManualHook::default());
    let log = InjectionLog::default();
    let notifier = Arc::new(notifier);
    let session = SessionController::new(
        store,
        Arc::clone(&hook) as Arc<dyn InputHook>,
        scripted_factory(&log, reject),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        SessionSettings::default(),
    );
    Harness {
        _temp: temp,
        hook,
        log,
        notifier,
        session,
    }
}

fn harness() -> Harness {
    harness_with(None, CountingNotifier::default())
}

fn held_macro(name: &str) -> Macro {
    Macro::new(
        name,
        vec![
            InputEvent::new(0, InputAction::KeyDown { key: KeyCode::Shift }),
            InputEvent::new(60_000, InputAction::KeyUp { key: KeyCode::Shift }),
        ],
    )
}

fn quick_macro(name: &str) -> Macro {
    Macro::new(
        name,
        vec![
            InputEvent::new(0, InputAction::KeyDown { key: KeyCode::Char('a') }),
            InputEvent::new(5, InputAction::KeyUp { key: KeyCode::Char('a') }),
        ],
    )
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

/// WHAT: Record, save, list and play back a macro end to end
/// WHY: This is the core user workflow
#[test]
#[allow(clippy::unwrap_used)]
fn given_recorded_keystroke_when_saved_and_played_then_keystroke_replayed() {
    // Given: A recording with one keystroke
    let h = harness();
    h.session.record_start().unwrap();
    assert_eq!(h.session.state(), SessionState::Recording);
    h.hook.emit(RawInput::Key { key: KeyCode::Char('a'), pressed: true });
    h.hook.emit(RawInput::Key { key: KeyCode::Char('a'), pressed: false });
    let recorded = h.session.record_stop().unwrap();
    assert_eq!(h.session.state(), SessionState::Idle);
    assert!(recorded.name.starts_with("macro-"));

    // When: Saved and played
    h.session.save_macro(&recorded).unwrap();
    assert_eq!(h.session.list_macros().unwrap(), vec![recorded.name.clone()]);
    h.session.play(&recorded.name, 1.0).unwrap();
    assert!(wait_for(|| h.session.state() == SessionState::Idle));

    // Then: The keystroke was injected and completion was announced
    assert_eq!(
        h.log.actions(),
        vec![
            Injected::Key(KeyCode::Char('a'), Direction::Press),
            Injected::Key(KeyCode::Char('a'), Direction::Release),
        ]
    );
    assert!(wait_for(|| h.notifier.count() == 1));
    assert!(h.session.active_macro().is_none());
}

/// WHAT: Starting a second playback is rejected
/// WHY: Only one macro may drive the input devices at a time
#[test]
#[allow(clippy::unwrap_used)]
fn given_playing_session_when_playing_again_then_invalid_state() {
    // Given
    let h = harness();
    h.session.save_macro(&quick_macro("other")).unwrap();
    h.session.play_macro(held_macro("first"), 1.0).unwrap();

    // When
    let result = h.session.play("other", 1.0);

    // Then: The first playback stays active
    assert!(matches!(
        result,
        Err(MacroError::InvalidState { state: SessionState::Playing, .. })
    ));
    assert_eq!(h.session.active_macro().as_deref(), Some("first"));
    h.session.stop().unwrap();
}

/// WHAT: Stop returns to Idle with held keys released and no notification
/// WHY: A cancelled macro must not leave modifiers stuck
#[test]
#[allow(clippy::unwrap_used)]
fn given_held_key_when_stopping_then_released_before_return() {
    // Given: Shift is down
    let h = harness();
    h.session.play_macro(held_macro("held"), 1.0).unwrap();
    assert!(wait_for(|| !h.log.actions().is_empty()));

    // When
    h.session.stop().unwrap();

    // Then
    assert_eq!(h.session.state(), SessionState::Idle);
    assert_eq!(
        h.log.actions(),
        vec![
            Injected::Key(KeyCode::Shift, Direction::Press),
            Injected::Key(KeyCode::Shift, Direction::Release),
        ]
    );
    assert_eq!(h.notifier.count(), 0);
}

/// WHAT: Stop releases held keys while another thread waits for the same run
/// WHY: A waiter must not keep stop from observing the release
#[test]
#[allow(clippy::unwrap_used)]
fn given_waiting_thread_when_stopping_then_released_before_return() {
    // Given: Shift is down and a second thread is blocked on the run
    let h = harness();
    h.session.play_macro(held_macro("held"), 1.0).unwrap();
    assert!(wait_for(|| !h.log.actions().is_empty()));

    thread::scope(|scope| {
        let waiter = scope.spawn(|| h.session.wait_for_playback());
        thread::sleep(Duration::from_millis(50));

        // When
        h.session.stop().unwrap();

        // Then: The release happened before stop returned
        assert_eq!(
            h.log.actions(),
            vec![
                Injected::Key(KeyCode::Shift, Direction::Press),
                Injected::Key(KeyCode::Shift, Direction::Release),
            ]
        );
        assert!(matches!(
            waiter.join().unwrap(),
            Some(PlaybackOutcome::Cancelled { at_index: 1 })
        ));
    });
    assert_eq!(h.session.state(), SessionState::Idle);
}

/// WHAT: Waiting after a run finished still yields its outcome once
/// WHY: A fast run must not make the caller miss how it ended
#[test]
#[allow(clippy::unwrap_used)]
fn given_finished_playback_when_waiting_then_outcome_collected_once() {
    // Given
    let h = harness();
    assert!(h.session.wait_for_playback().is_none());
    h.session.play_macro(quick_macro("m"), 1.0).unwrap();
    assert!(wait_for(|| h.session.state() == SessionState::Idle));

    // When
    let first = h.session.wait_for_playback();
    let second = h.session.wait_for_playback();

    // Then
    assert!(matches!(first, Some(PlaybackOutcome::Completed { events: 2 })));
    assert!(second.is_none());
}

/// WHAT: Pause and resume follow the state machine
/// WHY: Transitions from the wrong state must be rejected unchanged
#[test]
#[allow(clippy::unwrap_used)]
fn given_session_when_pausing_and_resuming_then_only_valid_transitions_apply() {
    // Given
    let h = harness();
    assert!(matches!(h.session.pause(), Err(MacroError::InvalidState { .. })));
    h.session.play_macro(held_macro("m"), 1.0).unwrap();

    // When/Then
    assert!(matches!(h.session.resume(), Err(MacroError::InvalidState { .. })));
    h.session.pause().unwrap();
    assert_eq!(h.session.state(), SessionState::Paused);
    assert!(matches!(h.session.record_start(), Err(MacroError::InvalidState { .. })));
    h.session.resume().unwrap();
    assert_eq!(h.session.state(), SessionState::Playing);
    h.session.pause().unwrap();
    h.session.stop().unwrap();
    assert_eq!(h.session.state(), SessionState::Idle);
    assert!(matches!(h.session.stop(), Err(MacroError::InvalidState { .. })));
}

/// WHAT: An injection failure returns the session to Idle and notifies
/// WHY: The user must learn that playback did not finish
#[test]
#[allow(clippy::unwrap_used)]
fn given_rejected_injection_when_playing_then_idle_and_failure_notified() {
    // Given: The release of 'a' is rejected
    let reject = Injected::Key(KeyCode::Char('a'), Direction::Release);
    let h = harness_with(Some(reject), CountingNotifier::default());

    // When
    h.session.play_macro(quick_macro("m"), 1.0).unwrap();

    // Then
    assert!(wait_for(|| h.session.state() == SessionState::Idle));
    assert!(wait_for(|| h.notifier.count() == 1));
}

/// WHAT: A rejected injection is returned as a typed error with its index
/// WHY: Callers without notifications must still learn where playback stopped
#[test]
#[allow(clippy::unwrap_used)]
fn given_rejected_injection_when_waiting_then_injection_error_with_index() {
    // Given: The release of 'a' is rejected and notifications are off
    let reject = Injected::Key(KeyCode::Char('a'), Direction::Release);
    let h = harness_with(Some(reject), CountingNotifier::failing());

    // When
    h.session.play_macro(quick_macro("broken"), 1.0).unwrap();
    let outcome = h.session.wait_for_playback();

    // Then: The failure names event 1, and the press was released again
    assert!(matches!(
        outcome,
        Some(PlaybackOutcome::Failed(MacroError::Injection { index: 1, .. }))
    ));
    assert_eq!(h.session.state(), SessionState::Idle);
    let failure = h.session.last_failure().unwrap();
    assert_eq!(failure.name, "broken");
    assert!(failure.reason.contains("permission denied"));
}

/// WHAT: The remembered failure clears when the next playback starts
/// WHY: The tray must not keep showing a failure that was already retried
#[test]
#[allow(clippy::unwrap_used)]
fn given_failed_playback_when_playing_again_then_failure_cleared() {
    // Given
    let reject = Injected::Key(KeyCode::Char('a'), Direction::Release);
    let h = harness_with(Some(reject), CountingNotifier::default());
    h.session.play_macro(quick_macro("m"), 1.0).unwrap();
    h.session.wait_for_playback();
    assert!(h.session.last_failure().is_some());

    // When
    h.session.play_macro(held_macro("next"), 1.0).unwrap();

    // Then
    assert!(h.session.last_failure().is_none());
    h.session.stop().unwrap();
}

/// WHAT: A failing notifier does not change the playback outcome
/// WHY: Notifications are best effort
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_notifier_when_playback_completes_then_session_idle() {
    // Given
    let h = harness_with(None, CountingNotifier::failing());

    // When
    h.session.play_macro(quick_macro("m"), 1.0).unwrap();

    // Then
    assert!(wait_for(|| h.session.state() == SessionState::Idle));
    assert!(wait_for(|| h.notifier.count() == 1));
    assert_eq!(h.log.actions().len(), 2);
}

/// WHAT: Refused input permission leaves the session idle
/// WHY: The user can grant permission and retry
#[test]
#[allow(clippy::unwrap_used)]
fn given_denied_hook_when_recording_then_permission_denied_and_idle() {
    // Given
    let temp = TempDir::new().unwrap();
    let log = InjectionLog::default();
    let factory: InjectorFactory = scripted_factory(&log, None);
    let session = SessionController::new(
        MacroStore::open(temp.path()).unwrap(),
        Arc::new(DeniedHook),
        factory,
        Arc::new(CountingNotifier::default()),
        SessionSettings::default(),
    );

    // When
    let result = session.record_start();

    // Then
    assert!(matches!(result, Err(MacroError::PermissionDenied { .. })));
    assert_eq!(session.state(), SessionState::Idle);
}

/// WHAT: Load errors leave the session idle
/// WHY: A failed play must not leave a phantom playback behind
#[test]
fn given_missing_macro_or_bad_speed_when_playing_then_error_and_idle() {
    // Given
    let h = harness();

    // When
    let missing = h.session.play("missing", 1.0);
    let bad_speed = h.session.play_macro(quick_macro("m"), -2.0);

    // Then
    assert!(matches!(missing, Err(MacroError::NotFound { .. })));
    assert!(matches!(bad_speed, Err(MacroError::InvalidSpeed { .. })));
    assert_eq!(h.session.state(), SessionState::Idle);
    assert!(h.session.active_macro().is_none());
}

/// WHAT: Generated names do not collide with stored macros
/// WHY: Saving a new recording must never overwrite an old one
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_recording_when_recording_again_then_new_name_chosen() {
    // Given
    let h = harness();
    h.session.record_start().unwrap();
    let first = h.session.record_stop().unwrap();
    h.session.save_macro(&first).unwrap();

    // When
    h.session.record_start().unwrap();
    let second = h.session.record_stop().unwrap();

    // Then
    assert_ne!(first.name, second.name);
    assert!(second.name.starts_with("macro-"));
}

/// WHAT: Deleting the playing macro does not interrupt playback
/// WHY: Playback runs from its own in-memory copy
#[test]
#[allow(clippy::unwrap_used)]
fn given_playing_macro_when_deleting_then_playback_continues() {
    // Given
    let h = harness();
    h.session.save_macro(&held_macro("long")).unwrap();
    h.session.play("long", 1.0).unwrap();

    // When
    h.session.delete_macro("long").unwrap();

    // Then
    assert_eq!(h.session.state(), SessionState::Playing);
    assert!(h.session.list_macros().unwrap().is_empty());
    h.session.stop().unwrap();
}

/// WHAT: Settings changes are validated and read back
/// WHY: Config reloads flow through this path
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_settings_when_applying_then_validated_and_stored() {
    // Given
    let h = harness();
    let mut settings = h.session.settings();
    settings.default_speed = 3.0;
    settings.recorder.min_move_delta = 0.0;

    // When
    h.session.apply_settings(settings).unwrap();
    settings.default_speed = 0.0;
    let rejected = h.session.apply_settings(settings);

    // Then
    assert!(matches!(rejected, Err(MacroError::InvalidSpeed { .. })));
    assert_eq!(h.session.settings().default_speed, 3.0);
    assert_eq!(h.session.settings().recorder.min_move_delta, 0.0);
}
