//! Button macro interpreter.
//!
//! Runs the three steps bound to a button against the HID transport, then
//! releases every key and flips the button's latch if it has one.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::hid::keys;
use crate::hid::mouse::MouseButton;
use crate::hid::HidTransport;
use crate::latch::LatchRegistry;
use crate::model::{Action, Button, GeneralConfig};
use crate::system::{Backlight, SystemControl, UserHook};
use crate::Error;

/// Wheel/pan distance of one scroll step.
///
/// Mouse ids 4 and 5 send wheel +20 and -20; ids 6 and 7 pan +20 and -20.
pub const SCROLL_STEP: i8 = 20;

/// Modifier id that releases everything instead of holding a key.
const RELEASE_ALL_ID: i32 = 9;

/// Result of a config-mode request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigMode {
    Started,
    Failed,
}

/// Executes button steps. Borrows everything it touches for one press.
pub struct ActionInterpreter<'a, H, D, S> {
    hid: &'a mut H,
    delay: &'a mut D,
    system: &'a mut S,
    general: &'a mut GeneralConfig,
    backlight: &'a mut Backlight,
}

impl<'a, H, D, S> ActionInterpreter<'a, H, D, S>
where
    H: HidTransport,
    D: DelayNs,
    S: SystemControl,
{
    pub fn new(
        hid: &'a mut H,
        delay: &'a mut D,
        system: &'a mut S,
        general: &'a mut GeneralConfig,
        backlight: &'a mut Backlight,
    ) -> Self {
        Self {
            hid,
            delay,
            system,
            general,
            backlight,
        }
    }

    /// Run a button press: its three steps, a release-all, then the latch flip.
    ///
    /// Connectivity is checked once; while disconnected only meta steps run.
    pub fn run_button(
        &mut self,
        button: &Button,
        latch_index: Option<usize>,
        latches: &mut LatchRegistry,
    ) -> Option<ConfigMode> {
        let connected = self.hid.is_connected();
        if !connected {
            warn!("HID: not connected, skipping key steps");
        }

        let mut config_mode = None;
        for action in &button.actions {
            if !connected && !action.is_meta() {
                continue;
            }
            if let Some(mode) = self.step(action) {
                config_mode = Some(mode);
            }
        }
        self.hid.release_all();

        if button.latch {
            if let Some(state) = latch_index.and_then(|index| latches.toggle(index)) {
                debug!("Latch flipped to {}", state);
            }
        }
        config_mode
    }

    /// Run a single step. Non-meta steps fail with [`Error::NotConnected`]
    /// when no host is listening.
    pub fn dispatch(&mut self, action: &Action) -> Result<Option<ConfigMode>, Error> {
        if !action.is_meta() && !self.hid.is_connected() {
            warn!("HID: not connected");
            return Err(Error::NotConnected);
        }
        Ok(self.step(action))
    }

    fn step(&mut self, action: &Action) -> Option<ConfigMode> {
        match action {
            Action::NoOp | Action::Unknown(_) => {}
            Action::Delay(ms) => {
                if let Ok(ms) = u32::try_from(*ms) {
                    self.delay.delay_ms(ms);
                }
            }
            Action::NavigationKey(id) => self.write(keys::navigation(*id)),
            Action::MediaKey(id) => self.write(keys::media(*id)),
            Action::Numpad(id) => self.write(keys::numpad(*id)),
            Action::Text(text) | Action::SpecialChars(text) => self.hid.print(text),
            Action::Modifier(RELEASE_ALL_ID) => self.hid.release_all(),
            Action::Modifier(id) => self.press(keys::modifier(*id)),
            Action::FunctionKey(id) => self.press(keys::function(*id)),
            Action::Number(value) => {
                let mut digits: String<12> = String::new();
                if write!(digits, "{}", value).is_ok() {
                    self.hid.print(&digits);
                }
            }
            Action::Combo(id) => {
                for &modifier in keys::combo(*id).unwrap_or(&[]) {
                    self.hid.press(keys::Key::Modifier(modifier));
                }
            }
            Action::Helper(id) => self.helper(*id),
            Action::Meta(id) => return self.meta(*id),
            Action::UserHook(id) => {
                if let Some(hook) = UserHook::new(*id) {
                    self.system.user_action(hook);
                }
            }
            Action::Mouse(id) => self.mouse(*id),
        }
        None
    }

    fn write(&mut self, key: Option<keys::Key>) {
        if let Some(key) = key {
            self.hid.write(key);
        }
    }

    fn press(&mut self, key: Option<keys::Key>) {
        if let Some(key) = key {
            self.hid.press(key);
        }
    }

    /// Configured modifiers plus a function key, released, then a blocking pause.
    fn helper(&mut self, id: i32) {
        let Some(function) = keys::helper_function(id) else {
            return;
        };
        for code in self.general.modifiers {
            self.press(keys::from_keyboard_code(code));
        }
        self.hid.press(function);
        self.hid.release_all();
        self.delay.delay_ms(u32::from(self.general.helper_delay));
    }

    fn meta(&mut self, id: i32) -> Option<ConfigMode> {
        match id {
            1 => {
                let mode = if self.system.enter_config_mode() {
                    ConfigMode::Started
                } else {
                    ConfigMode::Failed
                };
                info!("Config mode: {:?}", mode);
                return Some(mode);
            }
            2 => {
                if let Some(level) = self.backlight.dim() {
                    self.system.set_backlight(level);
                    info!("Backlight: {}", level);
                }
            }
            3 => {
                if let Some(level) = self.backlight.brighten() {
                    self.system.set_backlight(level);
                    info!("Backlight: {}", level);
                }
            }
            4 => {
                self.general.sleep_enable = !self.general.sleep_enable;
                if self.general.sleep_enable {
                    info!("Sleep enabled, timer {} min", self.general.sleep_timer);
                } else {
                    info!("Sleep disabled");
                }
            }
            _ => {}
        }
        None
    }

    fn mouse(&mut self, id: i32) {
        match id {
            1 => self.hid.mouse_click(MouseButton::Left),
            2 => self.hid.mouse_click(MouseButton::Right),
            3 => self.hid.mouse_click(MouseButton::Middle),
            4 => self.hid.mouse_scroll(SCROLL_STEP, 0),
            5 => self.hid.mouse_scroll(-SCROLL_STEP, 0),
            6 => self.hid.mouse_scroll(0, SCROLL_STEP),
            7 => self.hid.mouse_scroll(0, -SCROLL_STEP),
            _ => {}
        }
    }
}
