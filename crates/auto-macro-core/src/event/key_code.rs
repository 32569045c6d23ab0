//! Platform-neutral key identifiers.
//!
//! Keys serialize to a single string so macro files stay readable:
//! named keys use their name (`"Shift"`), printable keys the character
//! itself (`"a"`), and unnamed platform codes `"raw:<code>"`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const RAW_PREFIX: &str = "raw:";

/// Key identifier recorded by the hook and replayed by the injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    /// Alt / Option.
    Alt,
    /// Right Alt on layouts that distinguish it.
    AltGr,
    /// Backspace.
    Backspace,
    /// Caps Lock.
    CapsLock,
    /// Control (left or right).
    Control,
    /// Forward delete.
    Delete,
    /// Down arrow.
    Down,
    /// End.
    End,
    /// Escape.
    Escape,
    /// Function key by number. Any `u8` round-trips through a macro file;
    /// playback supports F1 through F12.
    F(u8),
    /// Home.
    Home,
    /// Left arrow.
    Left,
    /// Windows / Command / Super (left or right).
    Meta,
    /// Page Down.
    PageDown,
    /// Page Up.
    PageUp,
    /// Return / Enter.
    Return,
    /// Right arrow.
    Right,
    /// Shift (left or right).
    Shift,
    /// Space bar.
    Space,
    /// Tab.
    Tab,
    /// Up arrow.
    Up,
    /// Printable key, stored unshifted.
    Char(char),
    /// Platform key code with no named equivalent.
    Raw(u32),
}

impl KeyCode {
    fn name(&self) -> Option<&'static str> {
        let name = match self {
            KeyCode::Alt => "Alt",
            KeyCode::AltGr => "AltGr",
            KeyCode::Backspace => "Backspace",
            KeyCode::CapsLock => "CapsLock",
            KeyCode::Control => "Control",
            KeyCode::Delete => "Delete",
            KeyCode::Down => "Down",
            KeyCode::End => "End",
            KeyCode::Escape => "Escape",
            KeyCode::Home => "Home",
            KeyCode::Left => "Left",
            KeyCode::Meta => "Meta",
            KeyCode::PageDown => "PageDown",
            KeyCode::PageUp => "PageUp",
            KeyCode::Return => "Return",
            KeyCode::Right => "Right",
            KeyCode::Shift => "Shift",
            KeyCode::Space => "Space",
            KeyCode::Tab => "Tab",
            KeyCode::Up => "Up",
            KeyCode::F(_) | KeyCode::Char(_) | KeyCode::Raw(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Raw(code) => write!(f, "{RAW_PREFIX}{code}"),
            named => f.write_str(named.name().unwrap_or_default()),
        }
    }
}

/// Error returned when a string does not name a key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::Char(c));
        }

        if let Some(code) = s.strip_prefix(RAW_PREFIX) {
            return code
                .parse()
                .map(KeyCode::Raw)
                .map_err(|_| UnknownKey(s.to_string()));
        }

        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
            return Ok(KeyCode::F(n));
        }

        let key = match s {
            "Alt" => KeyCode::Alt,
            "AltGr" => KeyCode::AltGr,
            "Backspace" => KeyCode::Backspace,
            "CapsLock" => KeyCode::CapsLock,
            "Control" => KeyCode::Control,
            "Delete" => KeyCode::Delete,
            "Down" => KeyCode::Down,
            "End" => KeyCode::End,
            "Escape" => KeyCode::Escape,
            "Home" => KeyCode::Home,
            "Left" => KeyCode::Left,
            "Meta" => KeyCode::Meta,
            "PageDown" => KeyCode::PageDown,
            "PageUp" => KeyCode::PageUp,
            "Return" => KeyCode::Return,
            "Right" => KeyCode::Right,
            "Shift" => KeyCode::Shift,
            "Space" => KeyCode::Space,
            "Tab" => KeyCode::Tab,
            "Up" => KeyCode::Up,
            _ => return Err(UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

impl TryFrom<String> for KeyCode {
    type Error = UnknownKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.to_string()
    }
}
