//! Parsed configuration records and their conversion into [`ConfigModel`].
//!
//! JSON parsing happens outside the core: a [`ConfigSource`] hands over
//! records that already went through `serde`. Everything here validates
//! those records and maps them onto the fixed-capacity model.
//!
//! File shapes:
//! ```text
//! general.json     {"menubuttoncolor": "#009bf4", ..., "sleepenable": true,
//!                   "sleeptimer": 10, "beep": true, "modifier1": 130, ...}
//! homescreen.json  {"logo0": "music.bmp", ..., "logo5": "settings.bmp"}
//! menuN.json       {"logo0": "mute.bmp", ..., "button0": {"latch": false,
//!                   "latchlogo": "", "actionarray": [3, 0, 0],
//!                   "valuearray": [1, 0, 0]}, ...}
//! ```

use core::fmt;

use heapless::String;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::color::parse_hex_color;
use crate::error::Error;
use crate::model::{back_icon, logo_path, Action, ActionKind, Button, ConfigModel, GeneralConfig, IconSet, Menu};

pub type HexColor = String<16>;
pub type LogoName = String<48>;

/// The seven configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigName {
    General,
    Homescreen,
    /// Menu page 1..=5.
    Menu(u8),
}

impl ConfigName {
    /// Every file, in boot load order.
    pub const ALL: [ConfigName; 7] = [
        ConfigName::General,
        ConfigName::Homescreen,
        ConfigName::Menu(1),
        ConfigName::Menu(2),
        ConfigName::Menu(3),
        ConfigName::Menu(4),
        ConfigName::Menu(5),
    ];

    /// Accepts `general`, `homescreen` and `menu1`..`menu5`, with or without `.json`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.strip_suffix(".json").unwrap_or(name);
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigName::General => "general",
            ConfigName::Homescreen => "homescreen",
            ConfigName::Menu(1) => "menu1",
            ConfigName::Menu(2) => "menu2",
            ConfigName::Menu(3) => "menu3",
            ConfigName::Menu(4) => "menu4",
            ConfigName::Menu(5) => "menu5",
            ConfigName::Menu(_) => "menu",
        }
    }

    /// Location in the file system.
    pub fn path(&self) -> &'static str {
        match self {
            ConfigName::General => "/config/general.json",
            ConfigName::Homescreen => "/config/homescreen.json",
            ConfigName::Menu(1) => "/config/menu1.json",
            ConfigName::Menu(2) => "/config/menu2.json",
            ConfigName::Menu(3) => "/config/menu3.json",
            ConfigName::Menu(4) => "/config/menu4.json",
            ConfigName::Menu(5) => "/config/menu5.json",
            ConfigName::Menu(_) => "/config/menu.json",
        }
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where config records come from. Implementations own parsing and storage.
pub trait ConfigSource {
    fn exists(&mut self, name: ConfigName) -> bool;

    fn load_general(&mut self) -> Result<GeneralRecord, Error>;

    fn load_homescreen(&mut self) -> Result<HomeRecord, Error>;

    fn load_menu(&mut self, number: u8) -> Result<MenuRecord, Error>;

    /// Overwrite `name` with factory defaults.
    fn reset(&mut self, name: ConfigName) -> Result<(), Error>;
}

// Record values

/// An entry of `actionarray`/`valuearray`: configurators write either
/// numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordValue {
    Number(i64),
    Text(String<64>),
}

impl RecordValue {
    /// Numeric view; numeric strings count.
    pub fn as_number(&self) -> Option<i32> {
        match self {
            RecordValue::Number(n) => i32::try_from(*n).ok(),
            RecordValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(s) => Some(s.as_str()),
            RecordValue::Number(_) => None,
        }
    }
}

impl Default for RecordValue {
    fn default() -> Self {
        RecordValue::Number(0)
    }
}

impl From<i64> for RecordValue {
    fn from(n: i64) -> Self {
        RecordValue::Number(n)
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Number(n) => serializer.serialize_i64(*n),
            RecordValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = RecordValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a short string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RecordValue::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(RecordValue::Number)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let mut text = String::new();
                text.push_str(v)
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(RecordValue::Text(text))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

// Records

mod defaults {
    use super::{HexColor, LogoName};
    use crate::config::DEFAULT_LOGO;

    fn hex(s: &str) -> HexColor {
        let mut out = HexColor::new();
        let _ = out.push_str(s);
        out
    }

    pub fn menu_color() -> HexColor {
        hex("#009bf4")
    }

    pub fn function_color() -> HexColor {
        hex("#00efcb")
    }

    pub fn latch_color() -> HexColor {
        hex("#fe0149")
    }

    pub fn background() -> HexColor {
        hex("#000000")
    }

    pub fn sleep_timer() -> u16 {
        60
    }

    pub fn helper_delay() -> u16 {
        250
    }

    pub fn logo() -> LogoName {
        let mut out = LogoName::new();
        let _ = out.push_str(DEFAULT_LOGO);
        out
    }

    pub fn settings_logo() -> LogoName {
        let mut out = LogoName::new();
        let _ = out.push_str("settings.bmp");
        out
    }
}

/// Contents of `general.json`. Missing keys take the documented fallbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralRecord {
    #[serde(rename = "menubuttoncolor", default = "defaults::menu_color")]
    pub menu_button_color: HexColor,
    #[serde(rename = "functionbuttoncolor", default = "defaults::function_color")]
    pub function_button_color: HexColor,
    #[serde(rename = "latchcolor", default = "defaults::latch_color")]
    pub latch_color: HexColor,
    #[serde(rename = "background", default = "defaults::background")]
    pub background: HexColor,
    #[serde(rename = "sleepenable", default)]
    pub sleep_enable: bool,
    #[serde(rename = "sleeptimer", default = "defaults::sleep_timer")]
    pub sleep_timer: u16,
    #[serde(default)]
    pub beep: bool,
    #[serde(default)]
    pub modifier1: u8,
    #[serde(default)]
    pub modifier2: u8,
    #[serde(default)]
    pub modifier3: u8,
    #[serde(rename = "helperdelay", default = "defaults::helper_delay")]
    pub helper_delay: u16,
}

impl Default for GeneralRecord {
    fn default() -> Self {
        Self {
            menu_button_color: defaults::menu_color(),
            function_button_color: defaults::function_color(),
            latch_color: defaults::latch_color(),
            background: defaults::background(),
            sleep_enable: false,
            sleep_timer: defaults::sleep_timer(),
            beep: false,
            modifier1: 0,
            modifier2: 0,
            modifier3: 0,
            helper_delay: defaults::helper_delay(),
        }
    }
}

impl GeneralRecord {
    /// What `reset general` writes: sleep after 10 min, beeps on,
    /// helpers hold left alt + left shift.
    pub fn factory() -> Self {
        Self {
            sleep_enable: true,
            sleep_timer: 10,
            beep: true,
            modifier1: 130,
            modifier2: 129,
            modifier3: 0,
            helper_delay: 500,
            ..Self::default()
        }
    }

    pub fn to_config(&self) -> Option<GeneralConfig> {
        Some(GeneralConfig {
            menu_button_color: parse_hex_color(&self.menu_button_color)?,
            function_button_color: parse_hex_color(&self.function_button_color)?,
            latch_color: parse_hex_color(&self.latch_color)?,
            background_color: parse_hex_color(&self.background)?,
            sleep_enable: self.sleep_enable,
            sleep_timer: self.sleep_timer,
            beep: self.beep,
            modifiers: [self.modifier1, self.modifier2, self.modifier3],
            helper_delay: self.helper_delay,
        })
    }
}

/// Contents of `homescreen.json`: logo file names for the six home slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeRecord {
    #[serde(default = "defaults::logo")]
    pub logo0: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo1: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo2: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo3: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo4: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo5: LogoName,
}

impl Default for HomeRecord {
    fn default() -> Self {
        Self::factory()
    }
}

impl HomeRecord {
    pub fn factory() -> Self {
        Self {
            logo0: defaults::logo(),
            logo1: defaults::logo(),
            logo2: defaults::logo(),
            logo3: defaults::logo(),
            logo4: defaults::logo(),
            logo5: defaults::settings_logo(),
        }
    }

    pub fn to_icons(&self) -> Option<IconSet> {
        let names = [&self.logo0, &self.logo1, &self.logo2, &self.logo3, &self.logo4, &self.logo5];
        let mut icons = IconSet::default();
        for (icon, name) in icons.0.iter_mut().zip(names) {
            *icon = logo_path(name)?;
        }
        Some(icons)
    }
}

/// One button inside a menu file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonRecord {
    #[serde(default)]
    pub latch: bool,
    #[serde(rename = "latchlogo", default = "defaults::logo")]
    pub latch_logo: LogoName,
    #[serde(rename = "actionarray", default)]
    pub actions: [RecordValue; 3],
    #[serde(rename = "valuearray", default)]
    pub values: [RecordValue; 3],
}

impl Default for ButtonRecord {
    fn default() -> Self {
        Self {
            latch: false,
            latch_logo: defaults::logo(),
            actions: Default::default(),
            values: Default::default(),
        }
    }
}

impl ButtonRecord {
    pub fn to_button(&self) -> Option<Button> {
        let mut button = Button {
            latch: self.latch,
            latch_icon: logo_path(&self.latch_logo)?,
            ..Button::default()
        };
        for (action, (kind, value)) in button.actions.iter_mut().zip(self.actions.iter().zip(&self.values)) {
            *action = parse_action(kind, value)?;
        }
        Some(button)
    }
}

fn parse_action(kind: &RecordValue, value: &RecordValue) -> Option<Action> {
    let code = kind.as_number()?;
    match ActionKind::from_code(code) {
        None => Some(Action::Unknown(code)),
        Some(ActionKind::None) => Some(Action::NoOp),
        Some(k) if k.takes_text() => Action::with_text(code, value.as_text()?),
        Some(_) => Action::with_value(code, value.as_number()?),
    }
}

/// Contents of `menuN.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    #[serde(default = "defaults::logo")]
    pub logo0: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo1: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo2: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo3: LogoName,
    #[serde(default = "defaults::logo")]
    pub logo4: LogoName,
    #[serde(default)]
    pub button0: ButtonRecord,
    #[serde(default)]
    pub button1: ButtonRecord,
    #[serde(default)]
    pub button2: ButtonRecord,
    #[serde(default)]
    pub button3: ButtonRecord,
    #[serde(default)]
    pub button4: ButtonRecord,
}

impl Default for MenuRecord {
    fn default() -> Self {
        Self {
            logo0: defaults::logo(),
            logo1: defaults::logo(),
            logo2: defaults::logo(),
            logo3: defaults::logo(),
            logo4: defaults::logo(),
            button0: ButtonRecord::default(),
            button1: ButtonRecord::default(),
            button2: ButtonRecord::default(),
            button3: ButtonRecord::default(),
            button4: ButtonRecord::default(),
        }
    }
}

impl MenuRecord {
    pub fn to_menu(&self) -> Option<Menu> {
        let logos = [&self.logo0, &self.logo1, &self.logo2, &self.logo3, &self.logo4];
        let buttons = [&self.button0, &self.button1, &self.button2, &self.button3, &self.button4];

        let mut menu = Menu::default();
        for (icon, name) in menu.icons.0.iter_mut().zip(logos) {
            *icon = logo_path(name)?;
        }
        menu.icons.0[5] = back_icon();
        for (button, record) in menu.buttons.iter_mut().zip(buttons) {
            *button = record.to_button()?;
        }
        Some(menu)
    }
}

// Loading

/// Fail with [`Error::MissingConfig`] for the first absent file.
pub fn check_required<C: ConfigSource>(source: &mut C) -> Result<(), Error> {
    for name in ConfigName::ALL {
        if !source.exists(name) {
            error!("{} not found!", name.path());
            return Err(Error::MissingConfig(name));
        }
    }
    Ok(())
}

/// Load one file into `model`. The model is untouched on failure.
pub fn load_into<C: ConfigSource>(source: &mut C, model: &mut ConfigModel, name: ConfigName) -> Result<(), Error> {
    let malformed = Error::MalformedConfig(name);
    let loaded = match name {
        ConfigName::General => {
            let config = source.load_general()?.to_config().ok_or(malformed)?;
            model.general = config;
            Ok(())
        }
        ConfigName::Homescreen => {
            model.home = source.load_homescreen()?.to_icons().ok_or(malformed)?;
            Ok(())
        }
        ConfigName::Menu(number) => {
            let menu = source.load_menu(number)?.to_menu().ok_or(malformed)?;
            let slot = model.menu_mut(number).ok_or(malformed)?;
            *slot = menu;
            Ok(())
        }
    };
    if loaded.is_ok() {
        debug!("Loaded {}", name.as_str());
    }
    loaded
}

/// Load every file in boot order. Returns the last file that failed, if any;
/// files that did load are kept.
pub fn load_all<C: ConfigSource>(source: &mut C, model: &mut ConfigModel) -> Option<ConfigName> {
    let mut failed = None;
    for name in ConfigName::ALL {
        if load_into(source, model, name).is_err() {
            warn!("{}.json seems to be corrupted!", name.as_str());
            warn!("To reset to default type 'reset {}'.", name.as_str());
            failed = Some(name);
        }
    }
    if failed.is_none() {
        info!("All configs loaded");
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BACK_ICON, EMPTY_ICON};

    const MENU_JSON: &str = r#"{
        "logo0": "mute.bmp", "logo1": "copy.bmp", "logo2": "x.bmp",
        "logo3": "y.bmp", "logo4": "z.bmp",
        "button0": {"latch": true, "latchlogo": "", "actionarray": [3, 0, 0], "valuearray": [1, 0, 0]},
        "button1": {"latch": false, "latchlogo": "on.bmp", "actionarray": ["4", "7", "0"], "valuearray": ["Hi", "42", "0"]},
        "button2": {"actionarray": [9, 5, 0], "valuearray": [1, 9, 0]},
        "button3": {"actionarray": [1, 0, 0], "valuearray": [500, 0, 0]},
        "button4": {"actionarray": [20, 0, 0], "valuearray": [1, 0, 0]}
    }"#;

    #[test]
    fn config_names() {
        assert_eq!(ConfigName::parse("general"), Some(ConfigName::General));
        assert_eq!(ConfigName::parse("menu3.json"), Some(ConfigName::Menu(3)));
        assert_eq!(ConfigName::parse(" homescreen "), Some(ConfigName::Homescreen));
        assert_eq!(ConfigName::parse("menu6"), None);
        assert_eq!(ConfigName::parse("wifi"), None);
        assert_eq!(ConfigName::Menu(4).path(), "/config/menu4.json");
    }

    #[test]
    fn general_defaults_fill_gaps() {
        let record: GeneralRecord = serde_json::from_str(r#"{"beep": true}"#).unwrap();
        let config = record.to_config().unwrap();
        assert!(config.beep);
        assert!(!config.sleep_enable);
        assert_eq!(config.sleep_timer, 60);
        assert_eq!(config.helper_delay, 250);
        assert_eq!(config, GeneralConfig { beep: true, ..GeneralConfig::default() });
    }

    #[test]
    fn general_factory() {
        let config = GeneralRecord::factory().to_config().unwrap();
        assert!(config.sleep_enable);
        assert_eq!(config.sleep_timer, 10);
        assert_eq!(config.modifiers, [130, 129, 0]);
        assert_eq!(config.helper_delay, 500);
    }

    #[test]
    fn bad_color_is_rejected() {
        let record: GeneralRecord = serde_json::from_str(r##"{"latchcolor": "#nothex"}"##).unwrap();
        assert!(record.to_config().is_none());
    }

    #[test]
    fn menu_record_maps_actions() {
        let record: MenuRecord = serde_json::from_str(MENU_JSON).unwrap();
        let menu = record.to_menu().unwrap();

        assert_eq!(menu.icons.get(0), Some("/logos/mute.bmp"));
        assert_eq!(menu.icons.get(5), Some(BACK_ICON));

        let first = &menu.buttons[0];
        assert!(first.latch);
        assert_eq!(first.latch_icon.as_str(), EMPTY_ICON);
        assert_eq!(first.actions[0], Action::MediaKey(1));

        let second = &menu.buttons[1];
        assert_eq!(second.latch_icon.as_str(), "/logos/on.bmp");
        assert_eq!(second.actions[0], Action::with_text(4, "Hi").unwrap());
        assert_eq!(second.actions[1], Action::Number(42));

        assert_eq!(menu.buttons[2].actions[..2], [Action::Combo(1), Action::Modifier(9)]);
        assert_eq!(menu.buttons[3].actions[0], Action::Delay(500));
        assert_eq!(menu.buttons[4].actions[0], Action::Unknown(20));
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let json = r#"{"button2": {"actionarray": [9, 5, 0], "valuearray": [1, "a", 0]}}"#;
        let record: MenuRecord = serde_json::from_str(json).unwrap();
        assert!(record.button2.to_button().is_none());
        assert!(record.to_menu().is_none());
    }

    #[test]
    fn empty_menu_uses_defaults() {
        let record: MenuRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, MenuRecord::default());
        let menu = record.to_menu().unwrap();
        assert_eq!(menu.icons.get(2), Some("/logos/question.bmp"));
        assert!(menu.buttons.iter().all(|b| b.actions.iter().all(|a| *a == Action::NoOp)));
    }

    #[test]
    fn text_kind_needs_string() {
        let record: ButtonRecord =
            serde_json::from_str(r#"{"actionarray": [4, 0, 0], "valuearray": [12, 0, 0]}"#).unwrap();
        assert!(record.to_button().is_none());
    }

    #[test]
    fn arrays_must_have_three_entries() {
        let parsed: Result<ButtonRecord, _> =
            serde_json::from_str(r#"{"actionarray": [4, 0], "valuearray": ["a", 0]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn home_icons() {
        let record: HomeRecord = serde_json::from_str(r#"{"logo0": "music.bmp"}"#).unwrap();
        let icons = record.to_icons().unwrap();
        assert_eq!(icons.get(0), Some("/logos/music.bmp"));
        assert_eq!(icons.get(1), Some("/logos/question.bmp"));
        assert_eq!(icons.get(5), Some("/logos/question.bmp"));

        let factory = HomeRecord::factory().to_icons().unwrap();
        assert_eq!(factory.get(5), Some("/logos/settings.bmp"));
    }

    #[test]
    fn record_values_serialize_back() {
        let record = ButtonRecord {
            actions: [RecordValue::from(4), RecordValue::from(0), RecordValue::from(0)],
            values: [
                RecordValue::Text({
                    let mut text = String::new();
                    text.push_str("Hi").unwrap();
                    text
                }),
                RecordValue::from(0),
                RecordValue::from(0),
            ],
            ..ButtonRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""valuearray":["Hi",0,0]"#));
    }
}
