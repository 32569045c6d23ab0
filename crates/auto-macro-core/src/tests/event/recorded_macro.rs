use crate::{InputAction, InputEvent, KeyCode, Macro, MouseButton};

fn key_down(ms: u64, c: char) -> InputEvent {
    InputEvent::new(ms, InputAction::KeyDown { key: KeyCode::Char(c) })
}

fn key_up(ms: u64, c: char) -> InputEvent {
    InputEvent::new(ms, InputAction::KeyUp { key: KeyCode::Char(c) })
}

/// WHAT: Duration is the timestamp of the final event
/// WHY: Used for progress reporting and logging
#[test]
fn given_events_when_querying_duration_then_last_timestamp_returned() {
    // Given: A macro ending at 120ms and an empty macro
    let recorded = Macro::new("m", vec![key_down(50, 'a'), key_up(120, 'a')]);
    let empty = Macro::new("e", vec![]);

    // When/Then: Duration reflects the last event
    assert_eq!(recorded.duration_ms(), 120);
    assert_eq!(empty.duration_ms(), 0);
    assert!(empty.is_empty());
}

/// WHAT: Out-of-order timestamps are located
/// WHY: Loading must reject sequences that violate temporal order
#[test]
fn given_decreasing_timestamp_when_checking_order_then_index_reported() {
    // Given: Events where the third goes back in time
    let recorded = Macro::new(
        "m",
        vec![key_down(10, 'a'), key_up(20, 'a'), key_down(15, 'b')],
    );
    let ordered = Macro::new("m", vec![key_down(10, 'a'), key_up(10, 'a')]);

    // When/Then: The offending index is reported; equal stamps are fine
    assert_eq!(recorded.first_out_of_order(), Some(2));
    assert_eq!(ordered.first_out_of_order(), None);
}

/// WHAT: Trailing unreleased presses are trimmed
/// WHY: The hotkey chord that stops a recording must not be replayed
#[test]
fn given_trailing_chord_when_trimming_then_only_chord_presses_removed() {
    // Given: A typed 'a', a click, then Control+Shift+R held at the end
    let mut recorded = Macro::new(
        "m",
        vec![
            key_down(0, 'a'),
            key_up(30, 'a'),
            InputEvent::new(40, InputAction::MouseDown { button: MouseButton::Left }),
            InputEvent::new(60, InputAction::MouseUp { button: MouseButton::Left }),
            InputEvent::new(100, InputAction::KeyDown { key: KeyCode::Control }),
            InputEvent::new(110, InputAction::KeyDown { key: KeyCode::Shift }),
            key_down(120, 'r'),
        ],
    );

    // When: Trimming
    recorded.trim_trailing_presses();

    // Then: Everything up to the mouse release remains
    assert_eq!(recorded.len(), 4);
    assert_eq!(recorded.duration_ms(), 60);
}

/// WHAT: A macro ending in a released key is left alone
/// WHY: Trimming must never remove complete keystrokes
#[test]
fn given_complete_keystrokes_when_trimming_then_nothing_removed() {
    // Given: Press and release of 'a'
    let mut recorded = Macro::new("m", vec![key_down(0, 'a'), key_up(30, 'a')]);

    // When: Trimming
    recorded.trim_trailing_presses();

    // Then: Both events remain
    assert_eq!(recorded.len(), 2);
}

/// WHAT: Releases at the head of a recording are trimmed
/// WHY: The chord that started the recording is released after capture begins
#[test]
fn given_leading_chord_release_when_trimming_then_releases_removed() {
    // Given: Control and 'r' released, then a typed 'b'
    let mut recorded = Macro::new(
        "m",
        vec![
            key_up(5, 'r'),
            InputEvent::new(8, InputAction::KeyUp { key: KeyCode::Control }),
            key_down(200, 'b'),
            key_up(260, 'b'),
        ],
    );

    // When
    recorded.trim_leading_releases();

    // Then: The typed key remains with its original offsets
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded.events[0], key_down(200, 'b'));
}
