//! Global input hook abstraction.
//!
//! The OS delivers hook callbacks on its own thread. Callbacks are turned
//! into [`HookMessage`]s and pushed onto the channel installed by
//! [`InputHook::acquire`]; the consumer drains it at its own pace.

mod global;
pub(crate) mod translate;

pub use global::GlobalInputHook;

use crate::{CoreResult, KeyCode, MouseButton};

use std::{sync::mpsc::Sender, time::Instant};

/// Raw input reported by a hook, before timing and coalescing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// Pointer position in screen pixels.
    MouseMove {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// Mouse button transition.
    Button {
        /// Button that changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// Wheel movement. Positive `dy` is up.
    Wheel {
        /// Horizontal delta.
        dx: i64,
        /// Vertical delta.
        dy: i64,
    },
    /// Key transition.
    Key {
        /// Key that changed.
        key: KeyCode,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
}

/// A raw input stamped with the instant the hook observed it.
#[derive(Debug, Clone, Copy)]
pub struct HookMessage {
    /// When the callback fired.
    pub captured_at: Instant,
    /// What was observed.
    pub input: RawInput,
}

impl HookMessage {
    /// Stamp `input` with the current instant.
    pub fn now(input: RawInput) -> Self {
        Self {
            captured_at: Instant::now(),
            input,
        }
    }
}

/// Process-wide source of input callbacks.
///
/// At most one subscriber may be installed at a time.
pub trait InputHook: Send + Sync {
    /// Install `sink` as the receiver of hook callbacks.
    ///
    /// # Errors
    ///
    /// `InvalidState` if a subscriber is already installed,
    /// `PermissionDenied` if the OS refuses the hook.
    fn acquire(&self, sink: Sender<HookMessage>) -> CoreResult<()>;

    /// Remove the installed subscriber. Dropping the sender lets the
    /// consumer observe the end of the stream.
    fn release(&self);
}
