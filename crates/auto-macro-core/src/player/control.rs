use std::{
    sync::{Condvar, Mutex, MutexGuard},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Running,
    Paused { since: Instant },
    Cancelled,
}

#[derive(Debug)]
struct ClockState {
    mode: Mode,
    /// Reference instant all event deadlines are computed from.
    origin: Instant,
    /// Total time spent paused; added to every deadline.
    paused_total: Duration,
}

/// Result of waiting for an event deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    /// The deadline passed; inject the event.
    Proceed,
    /// Playback was cancelled while waiting.
    Cancelled,
}

/// Shared pause/resume/cancel state for one playback run.
///
/// Deadlines are absolute: `origin + paused_total + offset`. Every state
/// change notifies the condvar, so a waiting playback thread reacts without
/// waiting for its current deadline to pass.
#[derive(Debug)]
pub(crate) struct PlaybackControl {
    state: Mutex<ClockState>,
    wake: Condvar,
}

impl PlaybackControl {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                mode: Mode::Running,
                origin: Instant::now(),
                paused_total: Duration::ZERO,
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fix the origin at the current instant.
    pub(crate) fn begin(&self) {
        let mut state = self.lock();
        let now = Instant::now();
        state.origin = now;
        state.paused_total = Duration::ZERO;
        if let Mode::Paused { .. } = state.mode {
            state.mode = Mode::Paused { since: now };
        }
    }

    /// Returns `false` if playback was not running.
    pub(crate) fn pause(&self) -> bool {
        let mut state = self.lock();
        if state.mode != Mode::Running {
            return false;
        }
        state.mode = Mode::Paused {
            since: Instant::now(),
        };
        self.wake.notify_all();
        true
    }

    /// Returns `false` if playback was not paused.
    pub(crate) fn resume(&self) -> bool {
        let mut state = self.lock();
        let Mode::Paused { since } = state.mode else {
            return false;
        };
        state.paused_total = state.paused_total.saturating_add(since.elapsed());
        state.mode = Mode::Running;
        self.wake.notify_all();
        true
    }

    pub(crate) fn cancel(&self) {
        let mut state = self.lock();
        state.mode = Mode::Cancelled;
        self.wake.notify_all();
    }

    /// Block until `offset` past the (pause-adjusted) origin, or until
    /// cancelled. Paused time does not count toward the deadline.
    pub(crate) fn wait_until(&self, offset: Duration) -> Wait {
        let mut state = self.lock();

        loop {
            match state.mode {
                Mode::Cancelled => return Wait::Cancelled,
                Mode::Paused { .. } => {
                    state = self.wake.wait(state).unwrap_or_else(|e| e.into_inner());
                }
                Mode::Running => {
                    let target = state.paused_total.saturating_add(offset);
                    let Some(deadline) = state.origin.checked_add(target) else {
                        // Unreachable deadline: park until the state changes.
                        state = self.wake.wait(state).unwrap_or_else(|e| e.into_inner());
                        continue;
                    };

                    let now = Instant::now();
                    if now >= deadline {
                        return Wait::Proceed;
                    }

                    let (guard, _) = self
                        .wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    state = guard;
                }
            }
        }
    }
}
