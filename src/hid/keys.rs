//! Named keys reachable from button actions.
//!
//! Every lookup takes the raw id stored in a config file and returns `None`
//! when the id is outside its table, so out-of-range steps send nothing.

use super::consumer::ConsumerUsage;

/// Modifier keys in report bitfield order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Modifier {
    LeftCtrl = 0,
    LeftShift = 1,
    LeftAlt = 2,
    LeftGui = 3,
    RightCtrl = 4,
    RightShift = 5,
    RightAlt = 6,
    RightGui = 7,
}

impl Modifier {
    const ALL: [Modifier; 8] = [
        Modifier::LeftCtrl,
        Modifier::LeftShift,
        Modifier::LeftAlt,
        Modifier::LeftGui,
        Modifier::RightCtrl,
        Modifier::RightShift,
        Modifier::RightAlt,
        Modifier::RightGui,
    ];

    /// Bit in byte 0 of the keyboard report.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Keyboard-library code space: 0x80 = left ctrl ... 0x87 = right gui.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x80..=0x87 => Some(Self::ALL[usize::from(code - 0x80)]),
            _ => None,
        }
    }

    /// Modifier action ids 1..=8.
    pub fn from_id(id: i32) -> Option<Self> {
        lookup(&Self::ALL, id, 1).copied()
    }
}

/// A single thing the transport can press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Keyboard page (0x07) usage.
    Usage(u8),
    Modifier(Modifier),
    Media(ConsumerUsage),
}

// Keyboard page usages
pub const ENTER: u8 = 0x28;
pub const ESCAPE: u8 = 0x29;
pub const BACKSPACE: u8 = 0x2A;
pub const TAB: u8 = 0x2B;
pub const PRINT_SCREEN: u8 = 0x46;
pub const HOME: u8 = 0x4A;
pub const PAGE_UP: u8 = 0x4B;
pub const DELETE: u8 = 0x4C;
pub const END: u8 = 0x4D;
pub const PAGE_DOWN: u8 = 0x4E;
pub const RIGHT_ARROW: u8 = 0x4F;
pub const LEFT_ARROW: u8 = 0x50;
pub const DOWN_ARROW: u8 = 0x51;
pub const UP_ARROW: u8 = 0x52;

const NAVIGATION: [u8; 14] = [
    UP_ARROW,
    DOWN_ARROW,
    LEFT_ARROW,
    RIGHT_ARROW,
    BACKSPACE,
    TAB,
    ENTER,
    PAGE_UP,
    PAGE_DOWN,
    DELETE,
    PRINT_SCREEN,
    ESCAPE,
    HOME,
    END,
];

/// Keypad 0-9, then / * - + Enter and the decimal point.
const NUMPAD: [u8; 16] = [
    0x62, 0x59, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, 0x60, 0x61, 0x54, 0x55, 0x56, 0x57, 0x58,
    0x63,
];

use Modifier::*;

const COMBOS: [&[Modifier]; 14] = [
    &[LeftCtrl, LeftShift],
    &[LeftAlt, LeftShift],
    &[LeftGui, LeftShift],
    &[LeftCtrl, LeftGui],
    &[LeftAlt, LeftGui],
    &[LeftCtrl, LeftAlt],
    &[LeftCtrl, LeftAlt, LeftGui],
    &[RightCtrl, RightShift],
    &[RightAlt, RightShift],
    &[RightGui, RightShift],
    &[RightCtrl, RightGui],
    &[RightAlt, RightGui],
    &[RightCtrl, RightAlt],
    &[RightCtrl, RightAlt, RightGui],
];

/// Helper actions only reach F1..F11.
const HELPER_KEYS: i32 = 11;

fn lookup<T>(table: &[T], id: i32, first: i32) -> Option<&T> {
    let index = usize::try_from(id.checked_sub(first)?).ok()?;
    table.get(index)
}

/// Navigation key ids 1..=14.
pub fn navigation(id: i32) -> Option<Key> {
    lookup(&NAVIGATION, id, 1).map(|&usage| Key::Usage(usage))
}

/// Media key ids 1..=7.
pub fn media(id: i32) -> Option<Key> {
    ConsumerUsage::from_media_id(id).map(Key::Media)
}

pub fn modifier(id: i32) -> Option<Key> {
    Modifier::from_id(id).map(Key::Modifier)
}

/// F1..F24.
pub fn function(id: i32) -> Option<Key> {
    let id = u8::try_from(id).ok()?;
    match id {
        1..=12 => Some(Key::Usage(0x3A + id - 1)),
        13..=24 => Some(Key::Usage(0x68 + id - 13)),
        _ => None,
    }
}

/// Numpad ids 0..=15.
pub fn numpad(id: i32) -> Option<Key> {
    lookup(&NUMPAD, id, 0).map(|&usage| Key::Usage(usage))
}

/// Modifier combination for combo ids 1..=14.
pub fn combo(id: i32) -> Option<&'static [Modifier]> {
    lookup(&COMBOS, id, 1).copied()
}

/// Function key pressed by helper ids 1..=11.
pub fn helper_function(id: i32) -> Option<Key> {
    if (1..=HELPER_KEYS).contains(&id) {
        function(id)
    } else {
        None
    }
}

/// Key for a code in the keyboard-library space used by general settings:
/// ASCII below 0x80, modifiers at 0x80..=0x87, raw usages offset by 0x88.
pub fn from_keyboard_code(code: u8) -> Option<Key> {
    match code {
        0 => None,
        0x80..=0x87 => Modifier::from_code(code).map(Key::Modifier),
        0x88..=0xFF => Some(Key::Usage(code - 0x88)),
        _ => ascii(char::from(code)).map(|(usage, _)| Key::Usage(usage)),
    }
}

/// Usage and shift state for a printable US-ASCII character.
pub fn ascii(c: char) -> Option<(u8, bool)> {
    let mapped = match c {
        'a'..='z' => (0x04 + (c as u8 - b'a'), false),
        'A'..='Z' => (0x04 + (c as u8 - b'A'), true),
        '1'..='9' => (0x1E + (c as u8 - b'1'), false),
        '0' => (0x27, false),
        '\n' => (ENTER, false),
        '\t' => (TAB, false),
        ' ' => (0x2C, false),
        '!' => (0x1E, true),
        '@' => (0x1F, true),
        '#' => (0x20, true),
        '$' => (0x21, true),
        '%' => (0x22, true),
        '^' => (0x23, true),
        '&' => (0x24, true),
        '*' => (0x25, true),
        '(' => (0x26, true),
        ')' => (0x27, true),
        '-' => (0x2D, false),
        '_' => (0x2D, true),
        '=' => (0x2E, false),
        '+' => (0x2E, true),
        '[' => (0x2F, false),
        '{' => (0x2F, true),
        ']' => (0x30, false),
        '}' => (0x30, true),
        '\\' => (0x31, false),
        '|' => (0x31, true),
        ';' => (0x33, false),
        ':' => (0x33, true),
        '\'' => (0x34, false),
        '"' => (0x34, true),
        '`' => (0x35, false),
        '~' => (0x35, true),
        ',' => (0x36, false),
        '<' => (0x36, true),
        '.' => (0x37, false),
        '>' => (0x37, true),
        '/' => (0x38, false),
        '?' => (0x38, true),
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_table_bounds() {
        assert_eq!(navigation(1), Some(Key::Usage(UP_ARROW)));
        assert_eq!(navigation(14), Some(Key::Usage(END)));
        assert_eq!(navigation(0), None);
        assert_eq!(navigation(15), None);
        assert_eq!(navigation(-3), None);
    }

    #[test]
    fn function_keys_split_ranges() {
        assert_eq!(function(1), Some(Key::Usage(0x3A)));
        assert_eq!(function(12), Some(Key::Usage(0x45)));
        assert_eq!(function(13), Some(Key::Usage(0x68)));
        assert_eq!(function(24), Some(Key::Usage(0x73)));
        assert_eq!(function(25), None);
        assert_eq!(helper_function(11), function(11));
        assert_eq!(helper_function(12), None);
    }

    #[test]
    fn numpad_starts_at_zero() {
        assert_eq!(numpad(0), Some(Key::Usage(0x62)));
        assert_eq!(numpad(1), Some(Key::Usage(0x59)));
        assert_eq!(numpad(15), Some(Key::Usage(0x63)));
        assert_eq!(numpad(16), None);
    }

    #[test]
    fn combos_and_modifiers() {
        assert_eq!(combo(1), Some(&[LeftCtrl, LeftShift][..]));
        assert_eq!(combo(14).map(<[_]>::len), Some(3));
        assert_eq!(combo(15), None);
        assert_eq!(modifier(8), Some(Key::Modifier(RightGui)));
        assert_eq!(modifier(9), None);
        assert_eq!(RightGui.bit(), 0x80);
    }

    #[test]
    fn keyboard_codes() {
        assert_eq!(from_keyboard_code(0), None);
        assert_eq!(from_keyboard_code(0x82), Some(Key::Modifier(LeftAlt)));
        assert_eq!(from_keyboard_code(0x81), Some(Key::Modifier(LeftShift)));
        assert_eq!(from_keyboard_code(b'a'), Some(Key::Usage(0x04)));
        assert_eq!(from_keyboard_code(0x88 + 0x3A), Some(Key::Usage(0x3A)));
    }

    #[test]
    fn ascii_shift_state() {
        assert_eq!(ascii('h'), Some((0x0B, false)));
        assert_eq!(ascii('H'), Some((0x0B, true)));
        assert_eq!(ascii('4'), Some((0x21, false)));
        assert_eq!(ascii('$'), Some((0x21, true)));
        assert_eq!(ascii('é'), None);
    }
}
