mod input_event;
mod key_code;
mod mouse_button;
mod recorded_macro;

pub use {
    input_event::{EventKind, InputAction, InputEvent},
    key_code::{KeyCode, UnknownKey},
    mouse_button::MouseButton,
    recorded_macro::Macro,
};
