//! Page identifiers and per-(page, slot) lookups.
//!
//! Pure functions only: what a slot shows, which latch it owns, and what a
//! press on it means. Drawing and side effects live in `ui` and `machine`.

use crate::config::{EMPTY_ICON, SETTINGS_ICONS};
use crate::latch::LatchRegistry;
use crate::model::{Action, Button, ConfigModel, GeneralConfig};

/// Keys per page (3 x 2 grid).
pub const SLOT_COUNT: usize = 6;

/// Bottom-right key: back on menus and settings, settings on Home.
pub const BACK_SLOT: usize = 5;

/// Number of configurable menus.
pub const MENU_COUNT: u8 = 5;

/// Menu whose page runs the motion pointer.
pub const MOTION_MENU: u8 = 4;

/// Settings slot toggling auto-sleep.
pub const SLEEP_SLOT: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    Home,
    /// Menus 1..=5.
    Menu(u8),
    Settings,
    /// Configuration server running; only the restart button reacts.
    WifiStatus,
    Info,
    WifiFailure,
    /// A config file failed to load.
    ConfigError,
}

impl Page {
    /// Numeric page id: home 0, menus 1..=5, settings 6, utility pages 7..=10.
    pub fn id(self) -> u8 {
        match self {
            Page::Home => 0,
            Page::Menu(n) => n,
            Page::Settings => 6,
            Page::WifiStatus => 7,
            Page::Info => 8,
            Page::WifiFailure => 9,
            Page::ConfigError => 10,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Page::Home,
            1..=MENU_COUNT => Page::Menu(id),
            6 => Page::Settings,
            7 => Page::WifiStatus,
            8 => Page::Info,
            9 => Page::WifiFailure,
            10 => Page::ConfigError,
            _ => return None,
        })
    }

    /// Pages showing the 6-key grid.
    pub fn has_keypad(self) -> bool {
        matches!(self, Page::Home | Page::Menu(_) | Page::Settings)
    }
}

/// What a press on a keypad slot does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    /// Switch pages.
    Navigate(Page),
    /// Run `menus[menu - 1].buttons[slot]`.
    RunButton { menu: u8, slot: usize },
    /// Run the fixed meta button of a settings slot.
    RunSettings(usize),
    Ignore,
}

/// Meaning of a press on `slot` of `page`.
pub fn press(page: Page, slot: usize) -> Press {
    match (page, slot) {
        (_, s) if s >= SLOT_COUNT => Press::Ignore,
        (Page::Home, BACK_SLOT) => Press::Navigate(Page::Settings),
        (Page::Home, s) => Press::Navigate(Page::Menu(s as u8 + 1)),
        (Page::Menu(_), BACK_SLOT) => Press::Navigate(Page::Home),
        (Page::Menu(menu), s) => Press::RunButton { menu, slot: s },
        (Page::Settings, BACK_SLOT) => Press::Navigate(Page::Home),
        (Page::Settings, 4) => Press::Navigate(Page::Info),
        (Page::Settings, s) => Press::RunSettings(s),
        _ => Press::Ignore,
    }
}

/// Latch table index owned by a keypad slot. Home has none.
pub fn latch_index(page: Page, slot: usize) -> Option<usize> {
    match page {
        Page::Menu(n) => LatchRegistry::menu_index(n, slot),
        Page::Settings => LatchRegistry::settings_index(slot),
        _ => None,
    }
}

/// Regular icon of a slot.
pub fn icon(model: &ConfigModel, page: Page, slot: usize) -> Option<&str> {
    match page {
        Page::Home => model.home.get(slot),
        Page::Menu(n) => model.menu(n)?.icons.get(slot),
        Page::Settings => SETTINGS_ICONS.get(slot).copied(),
        _ => None,
    }
}

/// Icon shown while the slot is latched; [`EMPTY_ICON`] if it has none.
pub fn latch_icon(model: &ConfigModel, page: Page, slot: usize) -> &str {
    match page {
        Page::Menu(n) => model
            .menu(n)
            .and_then(|menu| menu.buttons.get(slot))
            .map_or(EMPTY_ICON, |button| button.latch_icon.as_str()),
        _ => EMPTY_ICON,
    }
}

/// Palette colour used when the icon gives no background colour.
pub fn palette_color(general: &GeneralConfig, page: Page, slot: usize) -> u16 {
    match (page, slot) {
        (Page::Home, _) | (Page::Settings, BACK_SLOT) => general.menu_button_color,
        _ => general.function_button_color,
    }
}

/// Fixed button behind settings slots 0..=3: config mode, dimmer,
/// brighter, and the sleep toggle (which latches).
pub fn settings_button(slot: usize) -> Option<Button> {
    if slot > SLEEP_SLOT {
        return None;
    }
    let mut button = Button::default();
    button.actions[0] = Action::Meta(slot as i32 + 1);
    button.latch = slot == SLEEP_SLOT;
    button.latch_icon.clear();
    button.latch_icon.push_str(EMPTY_ICON).ok()?;
    Some(button)
}
