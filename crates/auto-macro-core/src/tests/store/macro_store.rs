use crate::{InputAction, InputEvent, KeyCode, Macro, MacroError, MacroStore, MouseButton};

use std::fs;

use tempfile::TempDir;

fn typed_macro(name: &str) -> Macro {
    Macro::new(
        name,
        vec![
            InputEvent::new(0, InputAction::MouseMove { x: 100, y: 200 }),
            InputEvent::new(10, InputAction::MouseDown { button: MouseButton::Left }),
            InputEvent::new(30, InputAction::MouseUp { button: MouseButton::Left }),
            InputEvent::new(50, InputAction::KeyDown { key: KeyCode::Char('a') }),
            InputEvent::new(120, InputAction::KeyUp { key: KeyCode::Char('a') }),
            InputEvent::new(150, InputAction::MouseScroll { dx: 0, dy: 3 }),
        ],
    )
}

#[allow(clippy::unwrap_used)]
fn open_temp_store() -> (TempDir, MacroStore) {
    let temp = TempDir::new().unwrap();
    let store = MacroStore::open(temp.path().join("macros")).unwrap();
    (temp, store)
}

/// WHAT: A saved macro loads back equal
/// WHY: Persisted macros must replay exactly what was recorded
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_macro_when_loading_then_identical_macro_returned() {
    // Given: A store and a macro named "test1"
    let (_temp, store) = open_temp_store();
    let recorded = typed_macro("test1");

    // When: Saving then loading
    store.save(&recorded).unwrap();
    let loaded = store.load("test1").unwrap();

    // Then: Name, creation time and events match
    assert_eq!(loaded, recorded);
    assert!(store.exists("test1").unwrap());
}

/// WHAT: Loading an unknown name reports NotFound
/// WHY: Callers distinguish a missing macro from a broken one
#[test]
fn given_empty_store_when_loading_missing_then_not_found() {
    // Given
    let (_temp, store) = open_temp_store();

    // When
    let result = store.load("missing");

    // Then
    assert!(matches!(result, Err(MacroError::NotFound { name, .. }) if name == "missing"));
}

/// WHAT: Unparseable documents are reported as corrupt
/// WHY: A damaged file must not be replayed
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_document_when_loading_then_corrupt_macro() {
    // Given: A file with invalid JSON
    let (_temp, store) = open_temp_store();
    fs::write(store.path_for("broken").unwrap(), "{ not json").unwrap();

    // When
    let result = store.load("broken");

    // Then
    assert!(matches!(result, Err(MacroError::CorruptMacro { .. })));
}

/// WHAT: Documents with decreasing timestamps are rejected
/// WHY: Playback depends on temporal order
#[test]
#[allow(clippy::unwrap_used)]
fn given_out_of_order_events_when_loading_then_corrupt_macro() {
    // Given: A hand-edited document going back in time
    let (_temp, store) = open_temp_store();
    let json = r#"{
        "name": "edited",
        "created_at": "2026-01-01T00:00:00Z",
        "events": [
            {"kind": "KeyDown", "key": "a", "timestamp_ms": 50},
            {"kind": "KeyUp", "key": "a", "timestamp_ms": 20}
        ]
    }"#;
    fs::write(store.path_for("edited").unwrap(), json).unwrap();

    // When
    let result = store.load("edited");

    // Then
    assert!(matches!(result, Err(MacroError::CorruptMacro { .. })));
}

/// WHAT: A document whose name disagrees with its file is rejected
/// WHY: The file name is the store key
#[test]
#[allow(clippy::unwrap_used)]
fn given_renamed_document_when_loading_then_corrupt_macro() {
    // Given: "other" saved then copied to "copy.json"
    let (_temp, store) = open_temp_store();
    store.save(&typed_macro("other")).unwrap();
    fs::copy(store.path_for("other").unwrap(), store.path_for("copy").unwrap()).unwrap();

    // When
    let result = store.load("copy");

    // Then
    assert!(matches!(result, Err(MacroError::CorruptMacro { .. })));
}

/// WHAT: Saving under an existing name replaces the macro
/// WHY: Re-recording a macro overwrites the old take
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_macro_when_saving_same_name_then_replaced() {
    // Given
    let (_temp, store) = open_temp_store();
    store.save(&typed_macro("m")).unwrap();

    // When: Saving a shorter macro with the same name
    store.save(&Macro::new("m", vec![])).unwrap();

    // Then
    assert!(store.load("m").unwrap().is_empty());
}

/// WHAT: Listing reflects files added and removed outside the store
/// WHY: The store keeps no in-memory index
#[test]
#[allow(clippy::unwrap_used)]
fn given_external_changes_when_listing_then_current_contents_returned() {
    // Given: Two saved macros, a stray file and a subdirectory
    let (_temp, store) = open_temp_store();
    store.save(&typed_macro("alpha")).unwrap();
    store.save(&typed_macro("beta")).unwrap();
    fs::write(store.dir().join("notes.txt"), "ignored").unwrap();
    fs::create_dir(store.dir().join("nested.json")).unwrap();

    // When: Listing, deleting one file directly, listing again
    let mut first: Vec<String> = store.list().unwrap().collect();
    first.sort();
    fs::remove_file(store.path_for("alpha").unwrap()).unwrap();
    let second: Vec<String> = store.list().unwrap().collect();

    // Then
    assert_eq!(first, vec!["alpha".to_string(), "beta".to_string()]);
    assert_eq!(second, vec!["beta".to_string()]);
}

/// WHAT: Deleting removes the macro and a second delete reports NotFound
/// WHY: Delete must be observable and not silently succeed twice
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_macro_when_deleting_then_removed() {
    // Given
    let (_temp, store) = open_temp_store();
    store.save(&typed_macro("gone")).unwrap();

    // When
    store.delete("gone").unwrap();
    let again = store.delete("gone");

    // Then
    assert!(!store.exists("gone").unwrap());
    assert!(matches!(again, Err(MacroError::NotFound { .. })));
}

/// WHAT: Names that would escape the directory are rejected
/// WHY: Macro names become file names
#[test]
fn given_unsafe_names_when_saving_then_invalid_macro_name() {
    // Given
    let (_temp, store) = open_temp_store();

    for name in ["", "../evil", "a/b", "a\\b", ".hidden", "tab\there"] {
        // When
        let result = store.save(&Macro::new(name, vec![]));

        // Then
        assert!(
            matches!(result, Err(MacroError::InvalidMacroName { .. })),
            "{name:?} should be rejected"
        );
    }
}

/// WHAT: Atomic saves leave no temp files behind
/// WHY: Leftover temp files would clutter the macro folder
#[test]
#[allow(clippy::unwrap_used)]
fn given_several_saves_when_inspecting_directory_then_only_documents_present() {
    // Given/When
    let (_temp, store) = open_temp_store();
    for name in ["one", "two", "one"] {
        store.save(&typed_macro(name)).unwrap();
    }

    // Then
    let mut files: Vec<String> = fs::read_dir(store.dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["one.json".to_string(), "two.json".to_string()]);
}

/// WHAT: A failed save removes its temp file
/// WHY: Errors part way through the atomic write must not leave debris
#[test]
#[allow(clippy::unwrap_used)]
fn given_directory_in_the_way_when_saving_then_error_and_no_temp_file() {
    // Given: A non-empty directory occupies the document path
    let (_temp, store) = open_temp_store();
    let blocker = store.dir().join("blocked.json");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();

    // When
    let result = store.save(&typed_macro("blocked"));

    // Then
    assert!(matches!(result, Err(MacroError::Io { .. })));
    let leftovers: Vec<String> = fs::read_dir(store.dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

/// WHAT: Every function key number survives save and load
/// WHY: A macro that saves must load back, even with keys playback cannot press
#[test]
#[allow(clippy::unwrap_used)]
fn given_function_keys_when_saving_and_loading_then_same_keys_returned() {
    // Given: F1, F12 and numbers outside the common range
    let (_temp, store) = open_temp_store();
    let events = [1u8, 12, 0, 13, 24, 255]
        .into_iter()
        .enumerate()
        .map(|(i, n)| InputEvent::new(i as u64, InputAction::KeyDown { key: KeyCode::F(n) }))
        .collect();
    let recorded = Macro::new("function-keys", events);

    // When
    store.save(&recorded).unwrap();
    let loaded = store.load("function-keys").unwrap();

    // Then
    assert_eq!(loaded, recorded);
}
