use crate::{InputAction, InputEvent, KeyCode};

/// WHAT: Named, printable, function and raw keys survive Display/FromStr
/// WHY: Macro files store keys as strings and must reload the same key
#[test]
#[allow(clippy::unwrap_used)]
fn given_each_key_form_when_formatting_and_parsing_then_same_key_returned() {
    // Given: One key of every representation
    let keys = [
        KeyCode::Shift,
        KeyCode::Return,
        KeyCode::F(1),
        KeyCode::F(12),
        KeyCode::F(0),
        KeyCode::F(13),
        KeyCode::Char('a'),
        KeyCode::Char('F'),
        KeyCode::Char('/'),
        KeyCode::Raw(0x5b),
    ];

    for key in keys {
        // When: Formatting then parsing
        let text = key.to_string();
        let parsed: KeyCode = text.parse().unwrap();

        // Then: The original key comes back
        assert_eq!(parsed, key, "round trip through {text:?}");
    }
}

/// WHAT: Keys use compact human-readable spellings
/// WHY: Persisted macros should be inspectable and hand-editable
#[test]
fn given_keys_when_formatting_then_readable_strings_produced() {
    // Given/When/Then: Each form has a predictable spelling
    assert_eq!(KeyCode::Control.to_string(), "Control");
    assert_eq!(KeyCode::F(5).to_string(), "F5");
    assert_eq!(KeyCode::Char('a').to_string(), "a");
    assert_eq!(KeyCode::Raw(42).to_string(), "raw:42");
}

/// WHAT: Unknown key names are rejected
/// WHY: Corrupt key strings must surface as errors, not as wrong keys
#[test]
fn given_unknown_key_names_when_parsing_then_error_returned() {
    // Given: Strings that name no key
    for text in ["", "Hyper", "F256", "Fx", "raw:", "raw:abc"] {
        // When: Parsing
        let result = text.parse::<KeyCode>();

        // Then: Parsing fails
        assert!(result.is_err(), "{text:?} should not parse");
    }
}

/// WHAT: Key events serialize with a `kind` tag and string key
/// WHY: The persisted format is `{kind, timestamp_ms, payload...}`
#[test]
#[allow(clippy::unwrap_used)]
fn given_key_event_when_serializing_then_kind_tag_and_key_string_written() {
    // Given: A KeyDown event for 'a' at 50ms
    let event = InputEvent::new(50, InputAction::KeyDown { key: KeyCode::Char('a') });

    // When: Serializing to JSON
    let value = serde_json::to_value(event).unwrap();

    // Then: Fields are flat with a kind tag
    assert_eq!(value["kind"], "KeyDown");
    assert_eq!(value["key"], "a");
    assert_eq!(value["timestamp_ms"], 50);
}
