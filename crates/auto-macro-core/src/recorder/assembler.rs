use crate::{
    InputAction, InputEvent,
    hook::{HookMessage, RawInput},
};

use std::time::Instant;

/// Turns raw hook messages into timestamped events.
///
/// Applies mouse-move coalescing and keeps timestamps non-decreasing even
/// if messages from several producer threads interleave.
pub(crate) struct EventAssembler {
    started_at: Instant,
    min_move_delta: f64,
    last_timestamp_ms: u64,
    /// Last position written to the buffer.
    recorded_pos: Option<(i32, i32)>,
    /// Last position reported by the hook, recorded or not.
    seen_pos: Option<(i32, i32)>,
}

impl EventAssembler {
    pub(crate) fn new(started_at: Instant, min_move_delta: f64) -> Self {
        Self {
            started_at,
            min_move_delta,
            last_timestamp_ms: 0,
            recorded_pos: None,
            seen_pos: None,
        }
    }

    /// Convert one message, appending zero, one or two events to `out`.
    pub(crate) fn push(&mut self, message: HookMessage, out: &mut Vec<InputEvent>) {
        let elapsed = message.captured_at.saturating_duration_since(self.started_at);
        let timestamp_ms = u64::try_from(elapsed.as_millis())
            .unwrap_or(u64::MAX)
            .max(self.last_timestamp_ms);

        match message.input {
            RawInput::MouseMove { x, y } => {
                let pos = (x.round() as i32, y.round() as i32);
                self.seen_pos = Some(pos);
                if self.exceeds_threshold(pos) {
                    self.emit_move(pos, timestamp_ms, out);
                }
            }
            RawInput::Button { button, pressed } => {
                // Clicks must land where the pointer actually is, not at
                // the last position that survived coalescing.
                if let Some(pos) = self.seen_pos {
                    if self.recorded_pos != Some(pos) {
                        self.emit_move(pos, timestamp_ms, out);
                    }
                }
                let action = if pressed {
                    InputAction::MouseDown { button }
                } else {
                    InputAction::MouseUp { button }
                };
                self.emit(action, timestamp_ms, out);
            }
            RawInput::Wheel { dx, dy } => {
                self.emit(InputAction::MouseScroll { dx, dy }, timestamp_ms, out);
            }
            RawInput::Key { key, pressed } => {
                let action = if pressed {
                    InputAction::KeyDown { key }
                } else {
                    InputAction::KeyUp { key }
                };
                self.emit(action, timestamp_ms, out);
            }
        }
    }

    fn exceeds_threshold(&self, pos: (i32, i32)) -> bool {
        match self.recorded_pos {
            None => true,
            Some(last) if last == pos => false,
            Some((lx, ly)) => {
                let dx = f64::from(pos.0) - f64::from(lx);
                let dy = f64::from(pos.1) - f64::from(ly);
                dx.hypot(dy) >= self.min_move_delta
            }
        }
    }

    fn emit_move(&mut self, pos: (i32, i32), timestamp_ms: u64, out: &mut Vec<InputEvent>) {
        self.recorded_pos = Some(pos);
        self.emit(
            InputAction::MouseMove { x: pos.0, y: pos.1 },
            timestamp_ms,
            out,
        );
    }

    fn emit(&mut self, action: InputAction, timestamp_ms: u64, out: &mut Vec<InputEvent>) {
        self.last_timestamp_ms = timestamp_ms;
        out.push(InputEvent::new(timestamp_ms, action));
    }
}
