//! Auto-macro Core Library
//!
//! Records global mouse and keyboard input into timestamped macros, stores
//! them as JSON, and replays them through synthetic input with absolute
//! deadline scheduling.
//!
//! # Example
//!
//! ```no_run
//! use auto_macro_core::{CoreResult, MacroStore, SessionController, SessionSettings};
//!
//! use std::{thread::sleep, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let store = MacroStore::open("macros")?;
//!     let session = SessionController::desktop(store, SessionSettings::default(), true);
//!
//!     session.record_start()?;
//!     sleep(Duration::from_secs(3));
//!     let recorded = session.record_stop()?;
//!     session.save_macro(&recorded)?;
//!
//!     session.play(&recorded.name, 2.0)?;
//!     session.wait_for_playback();
//!     Ok(())
//! }
//! ```

mod error;
mod event;
pub mod hook;
mod notification;
pub mod player;
pub mod recorder;
mod session;
mod store;

pub use {
    error::MacroError,
    error::Result as CoreResult,
    event::{EventKind, InputAction, InputEvent, KeyCode, Macro, MouseButton, UnknownKey},
    notification::{DesktopNotifier, Notifier, SilentNotifier, notify_best_effort},
    player::{PlaybackOutcome, Player},
    recorder::{Recorder, RecorderSettings},
    session::{PlaybackFailure, SessionController, SessionSettings, SessionState},
    store::MacroStore,
};
