//! Key code definitions and US-layout character mapping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Represents a physical key code (Linux evdev scancode numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// Lowercase character typed by this key, if it is a printable key
    pub fn to_char(self) -> Option<char> {
        KEYMAP.get(&self).and_then(|info| info.printable)
    }

    /// Modifier class of this key, if it is one
    pub fn modifier(self) -> Option<Modifier> {
        match self.0 {
            29 | 97 => Some(Modifier::Ctrl),
            56 | 100 => Some(Modifier::Alt),
            42 | 54 => Some(Modifier::Shift),
            125 | 126 => Some(Modifier::Super),
            _ => None,
        }
    }

    /// Reverse lookup: the key that types `c` on a US layout
    pub fn for_char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        KEYMAP
            .iter()
            .find(|(_, info)| info.printable == Some(c))
            .map(|(code, _)| *code)
    }
}

impl From<u16> for KeyCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<device_query::Keycode> for KeyCode {
    fn from(keycode: device_query::Keycode) -> Self {
        use device_query::Keycode as DK;
        // Map device_query keycodes to Linux evdev scancodes
        let code = match keycode {
            DK::Escape => 1,
            DK::Key1 => 2,
            DK::Key2 => 3,
            DK::Key3 => 4,
            DK::Key4 => 5,
            DK::Key5 => 6,
            DK::Key6 => 7,
            DK::Key7 => 8,
            DK::Key8 => 9,
            DK::Key9 => 10,
            DK::Key0 => 11,
            DK::Minus => 12,
            DK::Equal => 13,
            DK::Backspace => 14,
            DK::Tab => 15,
            DK::Q => 16,
            DK::W => 17,
            DK::E => 18,
            DK::R => 19,
            DK::T => 20,
            DK::Y => 21,
            DK::U => 22,
            DK::I => 23,
            DK::O => 24,
            DK::P => 25,
            DK::LeftBracket => 26,
            DK::RightBracket => 27,
            DK::Enter => 28,
            DK::LControl => 29,
            DK::A => 30,
            DK::S => 31,
            DK::D => 32,
            DK::F => 33,
            DK::G => 34,
            DK::H => 35,
            DK::J => 36,
            DK::K => 37,
            DK::L => 38,
            DK::Semicolon => 39,
            DK::Apostrophe => 40,
            DK::Grave => 41,
            DK::LShift => 42,
            DK::BackSlash => 43,
            DK::Z => 44,
            DK::X => 45,
            DK::C => 46,
            DK::V => 47,
            DK::B => 48,
            DK::N => 49,
            DK::M => 50,
            DK::Comma => 51,
            DK::Dot => 52,
            DK::Slash => 53,
            DK::RShift => 54,
            DK::LAlt => 56,
            DK::Space => 57,
            DK::CapsLock => 58,
            DK::RControl => 97,
            DK::RAlt => 100,
            DK::Home => 102,
            DK::Up => 103,
            DK::PageUp => 104,
            DK::Left => 105,
            DK::Right => 106,
            DK::End => 107,
            DK::Down => 108,
            DK::PageDown => 109,
            DK::Insert => 110,
            DK::Delete => 111,
            DK::LMeta => 125,
            DK::RMeta => 126,
            // Everything else is reported as an unknown special key
            _ => 0,
        };
        Self(code)
    }
}

/// Modifier key classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Super => "Super",
        }
    }
}

/// Information about a key
#[derive(Debug, Clone)]
pub struct KeyInfo {
    /// Display name for the key
    pub name: &'static str,
    /// Character the key types without modifiers, if any
    pub printable: Option<char>,
}

impl KeyInfo {
    const fn printable(name: &'static str, c: char) -> Self {
        Self { name, printable: Some(c) }
    }

    const fn special(name: &'static str) -> Self {
        Self { name, printable: None }
    }
}

/// Static keymap for standard US keyboard layout
pub static KEYMAP: LazyLock<HashMap<KeyCode, KeyInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Number row
    map.insert(KeyCode(41), KeyInfo::printable("Grave", '`'));
    map.insert(KeyCode(2), KeyInfo::printable("1", '1'));
    map.insert(KeyCode(3), KeyInfo::printable("2", '2'));
    map.insert(KeyCode(4), KeyInfo::printable("3", '3'));
    map.insert(KeyCode(5), KeyInfo::printable("4", '4'));
    map.insert(KeyCode(6), KeyInfo::printable("5", '5'));
    map.insert(KeyCode(7), KeyInfo::printable("6", '6'));
    map.insert(KeyCode(8), KeyInfo::printable("7", '7'));
    map.insert(KeyCode(9), KeyInfo::printable("8", '8'));
    map.insert(KeyCode(10), KeyInfo::printable("9", '9'));
    map.insert(KeyCode(11), KeyInfo::printable("0", '0'));
    map.insert(KeyCode(12), KeyInfo::printable("Minus", '-'));
    map.insert(KeyCode(13), KeyInfo::printable("Equals", '='));

    // Top letter row
    map.insert(KeyCode(16), KeyInfo::printable("Q", 'q'));
    map.insert(KeyCode(17), KeyInfo::printable("W", 'w'));
    map.insert(KeyCode(18), KeyInfo::printable("E", 'e'));
    map.insert(KeyCode(19), KeyInfo::printable("R", 'r'));
    map.insert(KeyCode(20), KeyInfo::printable("T", 't'));
    map.insert(KeyCode(21), KeyInfo::printable("Y", 'y'));
    map.insert(KeyCode(22), KeyInfo::printable("U", 'u'));
    map.insert(KeyCode(23), KeyInfo::printable("I", 'i'));
    map.insert(KeyCode(24), KeyInfo::printable("O", 'o'));
    map.insert(KeyCode(25), KeyInfo::printable("P", 'p'));
    map.insert(KeyCode(26), KeyInfo::printable("LeftBracket", '['));
    map.insert(KeyCode(27), KeyInfo::printable("RightBracket", ']'));
    map.insert(KeyCode(43), KeyInfo::printable("Backslash", '\\'));

    // Home row
    map.insert(KeyCode(30), KeyInfo::printable("A", 'a'));
    map.insert(KeyCode(31), KeyInfo::printable("S", 's'));
    map.insert(KeyCode(32), KeyInfo::printable("D", 'd'));
    map.insert(KeyCode(33), KeyInfo::printable("F", 'f'));
    map.insert(KeyCode(34), KeyInfo::printable("G", 'g'));
    map.insert(KeyCode(35), KeyInfo::printable("H", 'h'));
    map.insert(KeyCode(36), KeyInfo::printable("J", 'j'));
    map.insert(KeyCode(37), KeyInfo::printable("K", 'k'));
    map.insert(KeyCode(38), KeyInfo::printable("L", 'l'));
    map.insert(KeyCode(39), KeyInfo::printable("Semicolon", ';'));
    map.insert(KeyCode(40), KeyInfo::printable("Apostrophe", '\''));

    // Bottom letter row
    map.insert(KeyCode(44), KeyInfo::printable("Z", 'z'));
    map.insert(KeyCode(45), KeyInfo::printable("X", 'x'));
    map.insert(KeyCode(46), KeyInfo::printable("C", 'c'));
    map.insert(KeyCode(47), KeyInfo::printable("V", 'v'));
    map.insert(KeyCode(48), KeyInfo::printable("B", 'b'));
    map.insert(KeyCode(49), KeyInfo::printable("N", 'n'));
    map.insert(KeyCode(50), KeyInfo::printable("M", 'm'));
    map.insert(KeyCode(51), KeyInfo::printable("Comma", ','));
    map.insert(KeyCode(52), KeyInfo::printable("Period", '.'));
    map.insert(KeyCode(53), KeyInfo::printable("Slash", '/'));
    map.insert(KeyCode(57), KeyInfo::printable("Space", ' '));

    // Special keys
    map.insert(KeyCode(1), KeyInfo::special("Escape"));
    map.insert(KeyCode(14), KeyInfo::special("Backspace"));
    map.insert(KeyCode(15), KeyInfo::special("Tab"));
    map.insert(KeyCode(28), KeyInfo::special("Enter"));
    map.insert(KeyCode(58), KeyInfo::special("CapsLock"));
    map.insert(KeyCode(29), KeyInfo::special("LeftCtrl"));
    map.insert(KeyCode(97), KeyInfo::special("RightCtrl"));
    map.insert(KeyCode(42), KeyInfo::special("LeftShift"));
    map.insert(KeyCode(54), KeyInfo::special("RightShift"));
    map.insert(KeyCode(56), KeyInfo::special("LeftAlt"));
    map.insert(KeyCode(100), KeyInfo::special("RightAlt"));
    map.insert(KeyCode(125), KeyInfo::special("LeftMeta"));
    map.insert(KeyCode(126), KeyInfo::special("RightMeta"));
    map.insert(KeyCode(102), KeyInfo::special("Home"));
    map.insert(KeyCode(103), KeyInfo::special("Up"));
    map.insert(KeyCode(104), KeyInfo::special("PageUp"));
    map.insert(KeyCode(105), KeyInfo::special("Left"));
    map.insert(KeyCode(106), KeyInfo::special("Right"));
    map.insert(KeyCode(107), KeyInfo::special("End"));
    map.insert(KeyCode(108), KeyInfo::special("Down"));
    map.insert(KeyCode(109), KeyInfo::special("PageDown"));
    map.insert(KeyCode(110), KeyInfo::special("Insert"));
    map.insert(KeyCode(111), KeyInfo::special("Delete"));

    map
});

/// Get key info by code, returns a default if not found
pub fn get_key_info(code: KeyCode) -> KeyInfo {
    KEYMAP
        .get(&code)
        .cloned()
        .unwrap_or_else(|| KeyInfo::special("Unknown"))
}
