use crate::event::{InputAction, InputEvent, KeyCode};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, ordered sequence of captured input events.
///
/// Event order is temporal order; `timestamp_ms` never decreases along
/// the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    /// Store key, unique within a store.
    pub name: String,
    /// When recording finished.
    pub created_at: DateTime<Utc>,
    /// Captured events in the order they happened.
    pub events: Vec<InputEvent>,
}

impl Macro {
    /// Create a macro stamped with the current time.
    pub fn new(name: impl Into<String>, events: Vec<InputEvent>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            events,
        }
    }

    /// Offset of the final event, or zero for an empty macro.
    pub fn duration_ms(&self) -> u64 {
        self.events.last().map_or(0, |e| e.timestamp_ms)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the macro has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the first event whose timestamp is earlier than its
    /// predecessor's, if any.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.events
            .windows(2)
            .position(|pair| pair[1].timestamp_ms < pair[0].timestamp_ms)
            .map(|i| i + 1)
    }

    /// Drop leading key releases whose press happened before recording.
    ///
    /// Starting a recording with a hotkey chord captures the chord's
    /// `KeyUp` events at the head of the sequence.
    pub fn trim_leading_releases(&mut self) {
        let leading = self
            .events
            .iter()
            .take_while(|event| matches!(event.action, InputAction::KeyUp { .. }))
            .count();
        self.events.drain(..leading);
    }

    /// Drop trailing key presses that were never released.
    ///
    /// A recording stopped with a hotkey chord ends with the chord's
    /// `KeyDown` events; replaying them would leave keys pressed.
    pub fn trim_trailing_presses(&mut self) {
        let mut released: HashSet<KeyCode> = HashSet::new();
        let mut keep = self.events.len();

        for (index, event) in self.events.iter().enumerate().rev() {
            match event.action {
                InputAction::KeyUp { key } => {
                    released.insert(key);
                }
                InputAction::KeyDown { key } if !released.contains(&key) && index + 1 == keep => {
                    keep = index;
                }
                _ => {}
            }
        }

        self.events.truncate(keep);
    }
}
