mod controller;
mod session_state;

pub use {
    controller::{PlaybackFailure, SessionController, SessionSettings},
    session_state::SessionState,
};
