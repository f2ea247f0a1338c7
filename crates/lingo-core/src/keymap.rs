//! Key model and the hotkey map.
//!
//! Keys are parsed from `KeyboardEvent.key`, with `KeyboardEvent.code` kept
//! alongside because on some layouts (macOS in particular) Alt composes a
//! different character and `key` no longer names the physical key.

use smol_str::SmolStr;

/// A keyboard key, reduced to what the enhancer reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    /// Unknown/unidentified key.
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a `KeyboardEvent.key` value.
    pub fn parse(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "Tab" => Key::Tab,
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            s if s.chars().count() == 1 => Key::character(s),
            _ => Key::Unidentified,
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const ALT: Self = Self {
        ctrl: false,
        alt: true,
        shift: false,
        meta: false,
    };

    /// Alt with nothing else held.
    pub fn is_alt_only(&self) -> bool {
        self.alt && !self.ctrl && !self.meta
    }
}

/// A key press as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    /// Physical key code (`KeyF`, `Digit1`), if known.
    pub code: Option<SmolStr>,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            code: None,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            code: None,
            modifiers,
        }
    }

    pub fn alt(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::ALT)
    }

    pub fn with_code(mut self, code: impl Into<SmolStr>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Build from raw `KeyboardEvent` fields.
    pub fn from_event(key: &str, code: &str, modifiers: Modifiers) -> Self {
        let combo = Self::with_modifiers(Key::parse(key), modifiers);
        if code.is_empty() {
            combo
        } else {
            combo.with_code(code)
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default and stop propagation.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
}

/// Hotkey-triggered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Alt+F: run the formatting pipeline.
    Format,
    /// Alt+R: whole-word replacements only.
    Replace,
    /// Alt+A: replacements, numbers and formatting.
    FormatAll,
    /// Alt+N: number words to digits.
    Numbers,
    /// Alt+P: show or hide the word picker.
    TogglePicker,
    /// Alt+1..Alt+9, Alt+0: insert picker item 0..9.
    InsertPickerItem(usize),
}

/// Letter a hotkey is bound to, from `key` or else from `code`.
fn hotkey_letter(combo: &KeyCombo) -> Option<char> {
    if let Key::Character(s) = &combo.key {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Some(c.to_ascii_lowercase());
            }
        }
    }

    let code = combo.code.as_deref()?;
    let c = code
        .strip_prefix("Key")
        .or_else(|| code.strip_prefix("Digit"))
        .or_else(|| code.strip_prefix("Numpad"))?;
    let mut chars = c.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Map a key press to a hotkey command.
pub fn command_for(combo: &KeyCombo) -> Option<Command> {
    if !combo.modifiers.is_alt_only() {
        return None;
    }

    let command = match hotkey_letter(combo)? {
        'f' => Command::Format,
        'r' => Command::Replace,
        'a' => Command::FormatAll,
        'n' => Command::Numbers,
        'p' => Command::TogglePicker,
        '0' => Command::InsertPickerItem(9),
        d @ '1'..='9' => Command::InsertPickerItem(d as usize - '1' as usize),
        _ => return None,
    };
    Some(command)
}
