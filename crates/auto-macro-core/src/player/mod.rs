//! Timed replay of recorded macros through an injection backend.

pub(crate) mod control;
pub(crate) mod enigo_injector;
mod held_inputs;
mod injector;
pub(crate) mod playback;

pub use {
    enigo_injector::EnigoInjector,
    injector::{Direction, InjectionRejected, InjectorFactory, InputInjector},
    playback::{PlaybackHandle, PlaybackOutcome, PlaybackRemote, Player, validate_speed},
};

/// Playback speed used when the caller does not choose one.
pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;
