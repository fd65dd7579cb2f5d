//! In-memory configuration: menus, buttons, actions and general settings.
//!
//! Populated from parsed config records by [`crate::loader`] and owned by the
//! state machine for the life of the process.

use heapless::String;

use crate::color::parse_hex_color;
use crate::config::{BACK_ICON, DEFAULT_LOGO, LOGO_DIR, MS_PER_MINUTE};
use crate::page::SLOT_COUNT;

/// Longest icon path kept in the model.
pub const PATH_CAPACITY: usize = 64;

/// Longest text payload of a typing action.
pub const TEXT_CAPACITY: usize = 64;

pub type IconPath = String<PATH_CAPACITY>;
pub type ActionText = String<TEXT_CAPACITY>;

/// Discriminator of a button step, as stored in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ActionKind {
    None = 0,
    Delay = 1,
    NavigationKey = 2,
    MediaKey = 3,
    Text = 4,
    Modifier = 5,
    FunctionKey = 6,
    Number = 7,
    SpecialChars = 8,
    Combo = 9,
    Helper = 10,
    Meta = 11,
    Numpad = 12,
    UserHook = 13,
    Mouse = 14,
}

impl ActionKind {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => ActionKind::None,
            1 => ActionKind::Delay,
            2 => ActionKind::NavigationKey,
            3 => ActionKind::MediaKey,
            4 => ActionKind::Text,
            5 => ActionKind::Modifier,
            6 => ActionKind::FunctionKey,
            7 => ActionKind::Number,
            8 => ActionKind::SpecialChars,
            9 => ActionKind::Combo,
            10 => ActionKind::Helper,
            11 => ActionKind::Meta,
            12 => ActionKind::Numpad,
            13 => ActionKind::UserHook,
            14 => ActionKind::Mouse,
            _ => return None,
        })
    }

    /// Kinds whose payload is a string to type.
    pub fn takes_text(self) -> bool {
        matches!(self, ActionKind::Text | ActionKind::SpecialChars)
    }
}

/// One step of a button macro with its payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    #[default]
    NoOp,
    /// Pause for the given milliseconds.
    Delay(i32),
    NavigationKey(i32),
    MediaKey(i32),
    Text(ActionText),
    /// Hold a modifier; id 9 releases everything.
    Modifier(i32),
    /// Hold a function key until the end-of-macro release.
    FunctionKey(i32),
    /// Type the decimal digits of the value.
    Number(i32),
    SpecialChars(ActionText),
    Combo(i32),
    Helper(i32),
    /// Device-local operation; runs even without a host connection.
    Meta(i32),
    Numpad(i32),
    UserHook(i32),
    Mouse(i32),
    /// Kind code outside the known set. Does nothing.
    Unknown(i32),
}

impl Action {
    /// Build a numeric-payload action. `None` if `kind` expects text.
    pub fn with_value(kind: i32, value: i32) -> Option<Self> {
        let Some(kind) = ActionKind::from_code(kind) else {
            return Some(Action::Unknown(kind));
        };
        Some(match kind {
            ActionKind::None => Action::NoOp,
            ActionKind::Delay => Action::Delay(value),
            ActionKind::NavigationKey => Action::NavigationKey(value),
            ActionKind::MediaKey => Action::MediaKey(value),
            ActionKind::Modifier => Action::Modifier(value),
            ActionKind::FunctionKey => Action::FunctionKey(value),
            ActionKind::Number => Action::Number(value),
            ActionKind::Combo => Action::Combo(value),
            ActionKind::Helper => Action::Helper(value),
            ActionKind::Meta => Action::Meta(value),
            ActionKind::Numpad => Action::Numpad(value),
            ActionKind::UserHook => Action::UserHook(value),
            ActionKind::Mouse => Action::Mouse(value),
            ActionKind::Text | ActionKind::SpecialChars => return None,
        })
    }

    /// Build a text-payload action. `None` if `kind` is not a typing kind
    /// or the text does not fit.
    pub fn with_text(kind: i32, text: &str) -> Option<Self> {
        let mut payload = ActionText::new();
        payload.push_str(text).ok()?;
        match ActionKind::from_code(kind)? {
            ActionKind::Text => Some(Action::Text(payload)),
            ActionKind::SpecialChars => Some(Action::SpecialChars(payload)),
            _ => None,
        }
    }

    /// Kind code this action was configured with.
    pub fn code(&self) -> i32 {
        let kind = match self {
            Action::NoOp => ActionKind::None,
            Action::Delay(_) => ActionKind::Delay,
            Action::NavigationKey(_) => ActionKind::NavigationKey,
            Action::MediaKey(_) => ActionKind::MediaKey,
            Action::Text(_) => ActionKind::Text,
            Action::Modifier(_) => ActionKind::Modifier,
            Action::FunctionKey(_) => ActionKind::FunctionKey,
            Action::Number(_) => ActionKind::Number,
            Action::SpecialChars(_) => ActionKind::SpecialChars,
            Action::Combo(_) => ActionKind::Combo,
            Action::Helper(_) => ActionKind::Helper,
            Action::Meta(_) => ActionKind::Meta,
            Action::Numpad(_) => ActionKind::Numpad,
            Action::UserHook(_) => ActionKind::UserHook,
            Action::Mouse(_) => ActionKind::Mouse,
            Action::Unknown(code) => return *code,
        };
        kind as i32
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Action::Meta(_))
    }
}

/// Three steps run in order for one press.
pub type ButtonActions = [Action; 3];

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Button {
    pub actions: ButtonActions,
    /// Flip the button's latch after running.
    pub latch: bool,
    /// Icon shown while latched; [`crate::config::EMPTY_ICON`] means none.
    pub latch_icon: IconPath,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            actions: Default::default(),
            latch: false,
            latch_icon: logo_path(DEFAULT_LOGO).unwrap_or_default(),
        }
    }
}

/// Icon paths for the six slots of a page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IconSet(pub [IconPath; SLOT_COUNT]);

impl IconSet {
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).map(|path| path.as_str())
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self(core::array::from_fn(|_| logo_path(DEFAULT_LOGO).unwrap_or_default()))
    }
}

/// A menu page: five configurable buttons and the fixed back button in slot 5.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Menu {
    pub icons: IconSet,
    pub buttons: [Button; SLOT_COUNT],
}

impl Default for Menu {
    fn default() -> Self {
        let mut icons = IconSet::default();
        icons.0[SLOT_COUNT - 1] = back_icon();
        Self {
            icons,
            buttons: Default::default(),
        }
    }
}

/// Settings from `general.json`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeneralConfig {
    pub menu_button_color: u16,
    pub function_button_color: u16,
    pub latch_color: u16,
    pub background_color: u16,
    pub sleep_enable: bool,
    /// Idle minutes before sleeping.
    pub sleep_timer: u16,
    pub beep: bool,
    /// Modifier codes (0x80..=0x87, 0 = unused) held by helper actions.
    pub modifiers: [u8; 3],
    /// Pause after a helper action (ms).
    pub helper_delay: u16,
}

impl GeneralConfig {
    pub fn sleep_timeout_ms(&self) -> u64 {
        u64::from(self.sleep_timer) * MS_PER_MINUTE
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            menu_button_color: parse_hex_color("#009bf4").unwrap_or_default(),
            function_button_color: parse_hex_color("#00efcb").unwrap_or_default(),
            latch_color: parse_hex_color("#fe0149").unwrap_or_default(),
            background_color: 0x0000,
            sleep_enable: false,
            sleep_timer: 60,
            beep: false,
            modifiers: [0; 3],
            helper_delay: 250,
        }
    }
}

/// Everything the keypad pages and the interpreter read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigModel {
    pub general: GeneralConfig,
    pub home: IconSet,
    /// Menus 1..=5 at indices 0..=4.
    pub menus: [Menu; 5],
}

impl ConfigModel {
    /// Menu by its 1-based page number.
    pub fn menu(&self, number: u8) -> Option<&Menu> {
        self.menus.get(usize::from(number).checked_sub(1)?)
    }

    pub fn menu_mut(&mut self, number: u8) -> Option<&mut Menu> {
        self.menus.get_mut(usize::from(number).checked_sub(1)?)
    }
}

/// Join a logo file name onto the logo directory.
pub fn logo_path(name: &str) -> Option<IconPath> {
    let mut path = IconPath::new();
    path.push_str(LOGO_DIR).ok()?;
    path.push_str(name).ok()?;
    Some(path)
}

pub(crate) fn back_icon() -> IconPath {
    let mut path = IconPath::new();
    let _ = path.push_str(BACK_ICON);
    path
}
