//! Device services outside the control core: config mode, backlight,
//! restart, sleep, buzzer and user hooks.

use crate::config::{BRIGHTNESS_DEFAULT, BRIGHTNESS_MAX, BRIGHTNESS_MIN, BRIGHTNESS_STEP};

/// One of the seven user-defined callbacks a button step can invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserHook(u8);

impl UserHook {
    pub const COUNT: u8 = 7;

    /// Hook ids run 1..=7.
    pub fn new(id: i32) -> Option<Self> {
        let id = u8::try_from(id).ok()?;
        (1..=Self::COUNT).contains(&id).then_some(Self(id))
    }

    pub fn id(self) -> u8 {
        self.0
    }
}

pub trait SystemControl {
    /// Start the configuration server. `false` if the network could not
    /// be brought up.
    fn enter_config_mode(&mut self) -> bool;

    /// Apply a backlight level and persist it.
    fn set_backlight(&mut self, level: u8);

    /// Level persisted by an earlier [`SystemControl::set_backlight`].
    fn saved_backlight(&mut self) -> Option<u8>;

    fn restart(&mut self);

    /// Enter deep sleep; wakes on touch.
    fn sleep(&mut self);

    fn beep(&mut self, frequency_hz: u16, duration_ms: u16);

    fn user_action(&mut self, hook: UserHook);
}

impl<T: SystemControl + ?Sized> SystemControl for &mut T {
    fn enter_config_mode(&mut self) -> bool {
        (**self).enter_config_mode()
    }
    fn set_backlight(&mut self, level: u8) {
        (**self).set_backlight(level)
    }
    fn saved_backlight(&mut self) -> Option<u8> {
        (**self).saved_backlight()
    }
    fn restart(&mut self) {
        (**self).restart()
    }
    fn sleep(&mut self) {
        (**self).sleep()
    }
    fn beep(&mut self, frequency_hz: u16, duration_ms: u16) {
        (**self).beep(frequency_hz, duration_ms)
    }
    fn user_action(&mut self, hook: UserHook) {
        (**self).user_action(hook)
    }
}

/// Backlight level stepped by the brightness meta actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Backlight {
    level: u8,
}

impl Backlight {
    pub const fn new(level: u8) -> Self {
        Self { level }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Step down unless already at the floor. Returns the new level if it changed.
    pub fn dim(&mut self) -> Option<u8> {
        if self.level <= BRIGHTNESS_MIN {
            return None;
        }
        self.level = self.level.saturating_sub(BRIGHTNESS_STEP);
        Some(self.level)
    }

    /// Step up unless already at the ceiling. Returns the new level if it changed.
    pub fn brighten(&mut self) -> Option<u8> {
        if self.level >= BRIGHTNESS_MAX {
            return None;
        }
        self.level = self.level.saturating_add(BRIGHTNESS_STEP);
        Some(self.level)
    }
}

impl Default for Backlight {
    fn default() -> Self {
        Self::new(BRIGHTNESS_DEFAULT)
    }
}
