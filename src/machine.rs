//! Page state machine and control loop.
//!
//! [`Deck`] owns the peripherals, the configuration model and the latch
//! table. The runtime calls [`Deck::poll`] once per loop iteration and
//! forwards console lines to [`Deck::handle_command`].
//!
//! ## Pages
//!
//! ```text
//! Home ──slot 0..4──▶ Menu(n) ──slot 5──▶ Home
//!   │                   └─slot 0..4: run button, stay
//!   └──slot 5──▶ Settings ──slot 4──▶ Info ──touch──▶ Settings
//!                  │  └─slot 5──▶ Home
//!                  └─slot 0 (config mode)──▶ WifiStatus ──restart button──▶ (restart)
//!                                        └─▶ WifiFailure ──touch──▶ Settings
//! ConfigError ──touch──▶ Home
//! ```

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;

use crate::action::{ActionInterpreter, ConfigMode};
use crate::bmp::{BmpDecoder, DrawMode, ImageStore};
use crate::command::Command;
use crate::config::{
    BOOT_BEEPS, MOTION_POLL_MS, PRESS_BEEP, PRESS_DEBOUNCE_MS, SLEEP_BEEPS, SLEEP_LATCH_INDEX,
    SPLASH_IMAGE,
};
use crate::error::Error;
use crate::hid::HidTransport;
use crate::latch::{LatchRegistry, LatchStore};
use crate::loader::{self, ConfigName, ConfigSource};
use crate::model::ConfigModel;
use crate::page::{self, Page, Press, MOTION_MENU, SLOT_COUNT};
use crate::pointer::{GyroSample, MotionPointer};
use crate::power::SleepTimer;
use crate::system::{Backlight, SystemControl};
use crate::ui::display::{self, InfoView};
use crate::ui::input_logic::Keypad;
use crate::ui::{keypad, layout};

/// Touch panel and motion sensor, already calibrated to screen coordinates.
pub trait InputSource {
    /// Current touch point, `None` while nothing touches the panel.
    fn touch(&mut self) -> Option<Point>;

    /// Latest gyro sample, if the board has a motion sensor.
    fn motion(&mut self) -> Option<GyroSample> {
        None
    }
}

/// What one loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    Idle,
    /// A key press ran actions without leaving the page.
    Pressed(usize),
    Navigated(Page),
    /// Restart requested; the runtime should not poll again.
    Restarting,
    /// Sleep requested after saving latches.
    Sleeping,
}

/// Hardware handed to [`Deck::boot`].
pub struct Peripherals<D, S, H, Y, C, L> {
    pub display: D,
    pub images: S,
    pub hid: H,
    pub delay: Y,
    pub system: C,
    pub latch_store: L,
}

pub struct Deck<D, S, H, Y, C, L> {
    display: D,
    decoder: BmpDecoder<S>,
    hid: H,
    delay: Y,
    system: C,
    latch_store: L,
    model: ConfigModel,
    latches: LatchRegistry,
    backlight: Backlight,
    sleep: SleepTimer,
    pointer: MotionPointer,
    keypad: Keypad,
    /// Touch state of the previous poll, for edge detection on utility pages.
    touching: bool,
    page: Page,
    failed_config: Option<ConfigName>,
}

impl<D, S, H, Y, C, L> Deck<D, S, H, Y, C, L>
where
    D: DrawTarget<Color = Rgb565>,
    S: ImageStore,
    H: HidTransport,
    Y: DelayNs,
    C: SystemControl,
    L: LatchStore,
{
    /// Bring the deck up: restore backlight and latches, show the splash,
    /// load configuration and draw the first page.
    ///
    /// Fails only with [`Error::MissingConfig`], after drawing the fatal
    /// screen; the caller is expected to halt.
    pub fn boot<Src: ConfigSource>(
        peripherals: Peripherals<D, S, H, Y, C, L>,
        source: &mut Src,
        woke: bool,
        now_ms: u64,
    ) -> Result<Self, Error> {
        let Peripherals {
            mut display,
            images,
            hid,
            delay,
            mut system,
            mut latch_store,
        } = peripherals;

        let backlight = Backlight::new(system.saved_backlight().unwrap_or(Backlight::default().level()));
        system.set_backlight(backlight.level());
        info!("Boot: backlight {}", backlight.level());

        let mut latches = LatchRegistry::new();
        // Released latches are a safe default.
        let _ = latches.load_from(&mut latch_store);

        let mut decoder = BmpDecoder::new(images);
        display::clear(&mut display, 0);
        if decoder.draw(&mut display, SPLASH_IMAGE, Point::zero(), DrawMode::Opaque).is_err() {
            warn!("Boot: no splash image");
        }
        display::draw_boot_status(&mut display, if woke { "Waking up..." } else { "Loading..." });

        if let Err(e) = loader::check_required(source) {
            if let Error::MissingConfig(name) = e {
                display::draw_fatal(&mut display, name);
            }
            return Err(e);
        }

        let mut model = ConfigModel::default();
        let failed_config = loader::load_all(source, &mut model);
        latches.set(SLEEP_LATCH_INDEX, model.general.sleep_enable);

        let mut deck = Self {
            display,
            decoder,
            hid,
            delay,
            system,
            latch_store,
            sleep: SleepTimer::new(now_ms, model.general.sleep_timeout_ms()),
            model,
            latches,
            backlight,
            pointer: MotionPointer::default(),
            keypad: Keypad::default(),
            touching: false,
            page: Page::Home,
            failed_config,
        };

        if deck.model.general.beep {
            for (frequency, duration) in BOOT_BEEPS {
                deck.system.beep(frequency, duration);
            }
        }

        let first = if failed_config.is_some() { Page::ConfigError } else { Page::Home };
        deck.show(first);
        info!("Boot: done");
        Ok(deck)
    }

    /// One iteration of the control loop.
    pub fn poll<I: InputSource>(&mut self, input: &mut I, now_ms: u64) -> Tick {
        let touch = input.touch();
        if touch.is_some() {
            self.sleep.activity(now_ms);
        }
        let new_touch = touch.filter(|_| !self.touching);
        self.touching = touch.is_some();

        if self.page.has_keypad() && self.sleep.expired(self.model.general.sleep_enable, now_ms) {
            return self.enter_sleep();
        }

        if self.pointer.is_armed() {
            if let Some(sample) = input.motion() {
                self.pointer.update(&mut self.hid, sample);
            }
            self.delay.delay_ms(MOTION_POLL_MS);
        }

        match self.page {
            Page::Home | Page::Menu(_) | Page::Settings => self.scan_keypad(touch),
            Page::WifiStatus => match new_touch {
                Some(point) if layout::restart_hit(point) => {
                    info!("Restarting");
                    self.system.restart();
                    Tick::Restarting
                }
                _ => Tick::Idle,
            },
            Page::Info | Page::WifiFailure => self.leave_utility(new_touch, Page::Settings),
            Page::ConfigError => self.leave_utility(new_touch, Page::Home),
        }
    }

    /// Apply a console command.
    pub fn handle_command<Src: ConfigSource>(&mut self, command: Command, source: &mut Src) -> Tick {
        match command {
            Command::ShowMenu(n) => {
                let target = Page::Menu(n);
                if self.page == target || self.page == Page::WifiStatus {
                    return Tick::Idle;
                }
                self.show(target);
                Tick::Navigated(target)
            }
            Command::Reset(name) => self.reset_config(name, source),
            Command::Restart => {
                info!("Restarting");
                self.system.restart();
                Tick::Restarting
            }
            Command::Unknown => {
                warn!("Unknown command");
                Tick::Idle
            }
        }
    }

    fn leave_utility(&mut self, touch: Option<Point>, target: Page) -> Tick {
        if touch.is_none() {
            return Tick::Idle;
        }
        // The finger is still down; the keypad must not see it as a new press.
        self.keypad.sync(touch);
        self.show(target);
        Tick::Navigated(target)
    }

    fn scan_keypad(&mut self, touch: Option<Point>) -> Tick {
        self.keypad.update(touch);
        // Releases first: a press may return early and the edge is gone next poll.
        for slot in 0..SLOT_COUNT {
            if self.keypad.key(slot).just_released() {
                self.redraw_slot(slot);
            }
        }
        for slot in 0..SLOT_COUNT {
            if self.keypad.key(slot).just_pressed() {
                if self.model.general.beep {
                    self.system.beep(PRESS_BEEP.0, PRESS_BEEP.1);
                }
                if keypad::draw_pressed(&mut self.display, slot).is_err() {
                    warn!("Display: pressed key draw failed");
                }
                let tick = self.press(slot);
                self.delay.delay_ms(PRESS_DEBOUNCE_MS);
                return tick;
            }
        }
        Tick::Idle
    }

    fn press(&mut self, slot: usize) -> Tick {
        match page::press(self.page, slot) {
            Press::Navigate(target) => {
                if self.page == Page::Home && target == Page::Menu(MOTION_MENU) {
                    self.pointer.arm();
                } else if self.page == Page::Menu(MOTION_MENU) && target == Page::Home {
                    self.pointer.disarm();
                }
                self.show(target);
                Tick::Navigated(target)
            }
            Press::RunButton { menu, slot } => {
                let latch_index = page::latch_index(self.page, slot);
                let Self {
                    model,
                    hid,
                    delay,
                    system,
                    backlight,
                    latches,
                    ..
                } = self;
                let button = usize::from(menu)
                    .checked_sub(1)
                    .and_then(|index| model.menus.get(index))
                    .and_then(|m| m.buttons.get(slot));
                let Some(button) = button else {
                    return Tick::Idle;
                };
                let mode = ActionInterpreter::new(hid, delay, system, &mut model.general, backlight)
                    .run_button(button, latch_index, latches);
                self.after_actions(slot, mode)
            }
            Press::RunSettings(slot) => {
                let Some(button) = page::settings_button(slot) else {
                    return Tick::Idle;
                };
                let latch_index = page::latch_index(Page::Settings, slot);
                let mode = ActionInterpreter::new(
                    &mut self.hid,
                    &mut self.delay,
                    &mut self.system,
                    &mut self.model.general,
                    &mut self.backlight,
                )
                .run_button(&button, latch_index, &mut self.latches);
                self.after_actions(slot, mode)
            }
            Press::Ignore => Tick::Idle,
        }
    }

    /// Follow up on meta effects of a press.
    fn after_actions(&mut self, slot: usize, mode: Option<ConfigMode>) -> Tick {
        if self.model.general.sleep_enable {
            self.sleep.set_interval(self.model.general.sleep_timeout_ms());
        }
        match mode {
            Some(ConfigMode::Started) => {
                self.show(Page::WifiStatus);
                Tick::Navigated(Page::WifiStatus)
            }
            Some(ConfigMode::Failed) => {
                self.show(Page::WifiFailure);
                Tick::Navigated(Page::WifiFailure)
            }
            None => Tick::Pressed(slot),
        }
    }

    fn reset_config<Src: ConfigSource>(&mut self, name: ConfigName, source: &mut Src) -> Tick {
        if source.reset(name).is_err() {
            warn!("Reset of {} failed", name.as_str());
            return Tick::Idle;
        }
        info!("{} reset to defaults", name.as_str());

        match loader::load_into(source, &mut self.model, name) {
            Ok(()) => {
                if name == ConfigName::General {
                    self.sleep.set_interval(self.model.general.sleep_timeout_ms());
                    self.latches.set(SLEEP_LATCH_INDEX, self.model.general.sleep_enable);
                }
                if self.failed_config == Some(name) {
                    self.failed_config = None;
                    if self.page == Page::ConfigError {
                        self.show(Page::Home);
                        return Tick::Navigated(Page::Home);
                    }
                }
                if self.page.has_keypad() {
                    self.show(self.page);
                }
                Tick::Idle
            }
            Err(_) => {
                warn!("{}.json still fails to load", name.as_str());
                self.failed_config = Some(name);
                self.show(Page::ConfigError);
                Tick::Navigated(Page::ConfigError)
            }
        }
    }

    fn enter_sleep(&mut self) -> Tick {
        info!("Going to sleep");
        display::clear(&mut self.display, 0);
        if self.model.general.beep {
            for (frequency, duration) in SLEEP_BEEPS {
                self.system.beep(frequency, duration);
            }
        }
        // The device sleeps either way; a lost latch table is not worth staying awake for.
        let _ = self.latches.save_to(&mut self.latch_store);
        self.system.sleep();
        Tick::Sleeping
    }

    /// Switch to `page` and repaint it.
    fn show(&mut self, page: Page) {
        debug!("Page: {:?} -> {:?}", self.page, page);
        self.page = page;
        match page {
            Page::Home | Page::Menu(_) | Page::Settings => {
                display::clear(&mut self.display, self.model.general.background_color);
                if keypad::draw_keypad(&mut self.display, &mut self.decoder, &self.model, &self.latches, page).is_err() {
                    warn!("Display: keypad draw failed");
                }
            }
            Page::WifiStatus => display::draw_wifi_status(&mut self.display),
            Page::WifiFailure => display::draw_wifi_failure(&mut self.display),
            Page::Info => {
                let info = InfoView {
                    sleep_enabled: self.model.general.sleep_enable,
                    sleep_timer: self.model.general.sleep_timer,
                    beep: self.model.general.beep,
                    backlight: self.backlight.level(),
                    hid_connected: self.hid.is_connected(),
                };
                display::draw_info(&mut self.display, &info);
            }
            Page::ConfigError => display::draw_config_error(&mut self.display, self.failed_config),
        }
    }

    fn redraw_slot(&mut self, slot: usize) {
        if keypad::draw_slot(&mut self.display, &mut self.decoder, &self.model, &self.latches, self.page, slot).is_err() {
            warn!("Display: key redraw failed");
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn model(&self) -> &ConfigModel {
        &self.model
    }

    pub fn latches(&self) -> &LatchRegistry {
        &self.latches
    }

    pub fn failed_config(&self) -> Option<ConfigName> {
        self.failed_config
    }

    pub fn pointer(&self) -> &MotionPointer {
        &self.pointer
    }

    pub fn backlight(&self) -> Backlight {
        self.backlight
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }

    pub fn hid_mut(&mut self) -> &mut H {
        &mut self.hid
    }

    pub fn system(&self) -> &C {
        &self.system
    }

    pub fn latch_store(&self) -> &L {
        &self.latch_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::tests::{Call, MockDelay, MockHid, MockSystem};
    use crate::bmp::ImageTable;
    use crate::config::{LATCH_SLOTS, PRESS_BEEP};
    use crate::color::WHITE;
    use crate::loader::{ButtonRecord, GeneralRecord, HomeRecord, MenuRecord, RecordValue};
    use crate::testing::TestDisplay;
    use crate::ui::layout::key_center;

    #[derive(Default)]
    struct MemSource {
        general: GeneralRecord,
        menus: [MenuRecord; 5],
        missing: Option<ConfigName>,
        resets: Vec<ConfigName>,
    }

    impl ConfigSource for MemSource {
        fn exists(&mut self, name: ConfigName) -> bool {
            self.missing != Some(name)
        }
        fn load_general(&mut self) -> Result<GeneralRecord, Error> {
            Ok(self.general.clone())
        }
        fn load_homescreen(&mut self) -> Result<HomeRecord, Error> {
            Ok(HomeRecord::factory())
        }
        fn load_menu(&mut self, number: u8) -> Result<MenuRecord, Error> {
            self.menus
                .get(usize::from(number) - 1)
                .cloned()
                .ok_or(Error::FileNotFound)
        }
        fn reset(&mut self, name: ConfigName) -> Result<(), Error> {
            self.resets.push(name);
            match name {
                ConfigName::General => self.general = GeneralRecord::factory(),
                ConfigName::Homescreen => {}
                ConfigName::Menu(n) => self.menus[usize::from(n) - 1] = MenuRecord::default(),
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemLatches {
        saved: Option<[u8; LATCH_SLOTS]>,
    }

    impl LatchStore for MemLatches {
        fn load(&mut self, buf: &mut [u8; LATCH_SLOTS]) -> Result<bool, Error> {
            match self.saved {
                Some(data) => {
                    *buf = data;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        fn save(&mut self, data: &[u8; LATCH_SLOTS]) -> Result<(), Error> {
            self.saved = Some(*data);
            Ok(())
        }
    }

    struct Finger(Option<Point>);

    impl InputSource for Finger {
        fn touch(&mut self) -> Option<Point> {
            self.0
        }
        fn motion(&mut self) -> Option<GyroSample> {
            Some(GyroSample { x: 0, y: 400, z: 0 })
        }
    }

    type TestDeck = Deck<TestDisplay, ImageTable<'static>, MockHid, MockDelay, MockSystem, MemLatches>;

    fn peripherals() -> Peripherals<TestDisplay, ImageTable<'static>, MockHid, MockDelay, MockSystem, MemLatches> {
        Peripherals {
            display: TestDisplay::new(),
            images: ImageTable::new(&[]),
            hid: MockHid::connected(),
            delay: MockDelay::default(),
            system: MockSystem::default(),
            latch_store: MemLatches::default(),
        }
    }

    fn text(value: &str) -> RecordValue {
        let mut text = heapless::String::new();
        text.push_str(value).unwrap();
        RecordValue::Text(text)
    }

    /// Menu 1 slot 0 types "Hi" and latches.
    fn source() -> MemSource {
        let mut source = MemSource::default();
        source.menus[0].button0 = ButtonRecord {
            latch: true,
            actions: [4.into(), 0.into(), 0.into()],
            values: [text("Hi"), 0.into(), 0.into()],
            ..ButtonRecord::default()
        };
        source
    }

    fn boot(source: &mut MemSource) -> TestDeck {
        Deck::boot(peripherals(), source, false, 0).unwrap()
    }

    fn tap_at(deck: &mut TestDeck, point: Point, now_ms: u64) -> Tick {
        let tick = deck.poll(&mut Finger(Some(point)), now_ms);
        deck.poll(&mut Finger(None), now_ms);
        tick
    }

    fn tap(deck: &mut TestDeck, slot: usize) -> Tick {
        tap_at(deck, key_center(slot), 0)
    }

    #[test]
    fn boots_to_home() {
        let deck = boot(&mut source());
        assert_eq!(deck.page(), Page::Home);
        assert_eq!(deck.failed_config(), None);
        assert_eq!(deck.system().backlight, Some(255));
        assert!(deck.system().beeps.is_empty());
    }

    #[test]
    fn missing_file_is_fatal() {
        let mut source = source();
        source.missing = Some(ConfigName::Menu(3));
        let result = Deck::boot(peripherals(), &mut source, false, 0);
        assert!(matches!(result, Err(Error::MissingConfig(ConfigName::Menu(3)))));
    }

    #[test]
    fn corrupt_file_opens_config_error_until_touched() {
        let mut source = source();
        source.general.latch_color = heapless::String::try_from("red").unwrap();
        let mut deck = boot(&mut source);
        assert_eq!(deck.page(), Page::ConfigError);
        assert_eq!(deck.failed_config(), Some(ConfigName::General));

        assert_eq!(tap_at(&mut deck, Point::new(10, 10), 0), Tick::Navigated(Page::Home));
    }

    #[test]
    fn reset_clears_config_error() {
        let mut source = source();
        source.general.background = heapless::String::try_from("#zz0000").unwrap();
        let mut deck = boot(&mut source);

        let tick = deck.handle_command(Command::Reset(ConfigName::General), &mut source);

        assert_eq!(tick, Tick::Navigated(Page::Home));
        assert_eq!(deck.failed_config(), None);
        assert!(deck.model().general.sleep_enable);
        assert!(deck.latches().get(SLEEP_LATCH_INDEX));
        assert_eq!(source.resets, vec![ConfigName::General]);
    }

    #[test]
    fn boot_beeps_when_enabled() {
        let mut source = source();
        source.general.beep = true;
        let mut deck = boot(&mut source);
        assert_eq!(deck.system().beeps, BOOT_BEEPS.to_vec());
        tap(&mut deck, 0);
        assert_eq!(deck.system().beeps.last(), Some(&PRESS_BEEP));
    }

    #[test]
    fn home_and_back_navigation() {
        let mut deck = boot(&mut source());
        assert_eq!(tap(&mut deck, 5), Tick::Navigated(Page::Settings));
        assert_eq!(tap(&mut deck, 5), Tick::Navigated(Page::Home));
        assert_eq!(tap(&mut deck, 2), Tick::Navigated(Page::Menu(3)));
        assert_eq!(tap(&mut deck, 5), Tick::Navigated(Page::Home));
    }

    #[test]
    fn menu_press_runs_button_and_latches() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 0);
        assert_eq!(tap(&mut deck, 0), Tick::Pressed(0));
        assert_eq!(
            deck.hid().calls,
            vec![Call::Print("Hi".into()), Call::ReleaseAll]
        );
        assert!(deck.latches().get(0));
        assert_eq!(deck.page(), Page::Menu(1));
    }

    #[test]
    fn press_inverts_key_until_release() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 0);
        let centre = key_center(1);
        let corner = centre + Point::new(40, 0);

        deck.poll(&mut Finger(Some(centre)), 0);
        assert_eq!(deck.display().pixel(corner.x, corner.y), WHITE);

        deck.poll(&mut Finger(None), 0);
        assert_ne!(deck.display().pixel(corner.x, corner.y), WHITE);
    }

    #[test]
    fn sliding_between_keys_restores_the_first() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 0);
        let corner = key_center(1) + Point::new(40, 0);

        deck.poll(&mut Finger(Some(key_center(1))), 0);
        assert_eq!(deck.display().pixel(corner.x, corner.y), WHITE);

        assert_eq!(deck.poll(&mut Finger(Some(key_center(0))), 0), Tick::Pressed(0));
        assert_ne!(deck.display().pixel(corner.x, corner.y), WHITE);

        deck.poll(&mut Finger(None), 0);
        assert_ne!(deck.display().pixel(corner.x, corner.y), WHITE);
    }

    #[test]
    fn holding_a_key_fires_once() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 0);
        let mut finger = Finger(Some(key_center(0)));
        assert_eq!(deck.poll(&mut finger, 0), Tick::Pressed(0));
        assert_eq!(deck.poll(&mut finger, 0), Tick::Idle);
        assert_eq!(deck.hid().calls.len(), 2);
    }

    #[test]
    fn motion_pointer_follows_menu_four() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 3);
        assert_eq!(deck.page(), Page::Menu(MOTION_MENU));
        assert!(deck.pointer().is_armed());
        deck.poll(&mut Finger(None), 0);
        assert!(deck.hid().calls.contains(&Call::Move(0, 2)));

        tap(&mut deck, 5);
        assert_eq!(deck.page(), Page::Home);
        assert!(!deck.pointer().is_armed());
    }

    #[test]
    fn other_menus_leave_pointer_alone() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 1);
        assert!(!deck.pointer().is_armed());
    }

    #[test]
    fn settings_sleep_toggle_flips_indicator() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 5);
        assert!(!deck.latches().get(SLEEP_LATCH_INDEX));

        assert_eq!(tap(&mut deck, 3), Tick::Pressed(3));
        assert!(deck.model().general.sleep_enable);
        assert!(deck.latches().get(SLEEP_LATCH_INDEX));

        tap(&mut deck, 3);
        assert!(!deck.model().general.sleep_enable);
        assert!(!deck.latches().get(SLEEP_LATCH_INDEX));
    }

    #[test]
    fn settings_brightness() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 5);
        tap(&mut deck, 1);
        assert_eq!(deck.backlight().level(), 230);
        assert_eq!(deck.system().backlight, Some(230));
        tap(&mut deck, 2);
        tap(&mut deck, 2);
        assert_eq!(deck.backlight().level(), 230);
    }

    #[test]
    fn info_page_round_trip() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 5);
        // finger stays down after the press: no bounce back
        let mut finger = Finger(Some(key_center(4)));
        assert_eq!(deck.poll(&mut finger, 0), Tick::Navigated(Page::Info));
        assert_eq!(deck.poll(&mut finger, 0), Tick::Idle);
        deck.poll(&mut Finger(None), 0);

        assert_eq!(
            tap_at(&mut deck, Point::new(5, 5), 0),
            Tick::Navigated(Page::Settings)
        );
    }

    #[test]
    fn config_mode_and_restart() {
        let mut deck = boot(&mut source());
        deck.system.wifi_ok = true;
        tap(&mut deck, 5);
        assert_eq!(tap(&mut deck, 0), Tick::Navigated(Page::WifiStatus));

        assert_eq!(tap_at(&mut deck, Point::new(50, 50), 0), Tick::Idle);
        assert_eq!(deck.handle_command(Command::ShowMenu(1), &mut source()), Tick::Idle);
        assert_eq!(tap_at(&mut deck, Point::new(200, 220), 0), Tick::Restarting);
        assert_eq!(deck.system().restarts, 1);
    }

    #[test]
    fn config_mode_failure_returns_to_settings() {
        let mut deck = boot(&mut source());
        tap(&mut deck, 5);
        assert_eq!(tap(&mut deck, 0), Tick::Navigated(Page::WifiFailure));
        assert_eq!(
            tap_at(&mut deck, Point::new(5, 5), 0),
            Tick::Navigated(Page::Settings)
        );
    }

    #[test]
    fn sleeps_after_timeout_and_saves_latches() {
        let mut source = source();
        source.general.sleep_enable = true;
        source.general.sleep_timer = 1;
        source.general.beep = true;
        let mut deck = boot(&mut source);
        tap(&mut deck, 0);
        tap(&mut deck, 0);

        assert_eq!(deck.poll(&mut Finger(None), 60_000), Tick::Idle);
        assert_eq!(deck.poll(&mut Finger(None), 60_001), Tick::Sleeping);
        assert_eq!(deck.system().sleeps, 1);
        assert_eq!(&deck.system().beeps[deck.system().beeps.len() - 3..], &SLEEP_BEEPS);
        let saved = deck.latch_store().saved.unwrap();
        assert_eq!(saved[0], 1);
        assert_eq!(saved[SLEEP_LATCH_INDEX], 1);
    }

    #[test]
    fn no_sleep_when_disabled_or_off_keypad() {
        let mut deck = boot(&mut source());
        assert_eq!(deck.poll(&mut Finger(None), u64::MAX / 2), Tick::Idle);

        let mut source = source();
        source.general.sleep_enable = true;
        source.general.sleep_timer = 1;
        let mut deck = boot(&mut source);
        tap(&mut deck, 5);
        tap(&mut deck, 4);
        assert_eq!(deck.page(), Page::Info);
        assert_eq!(deck.poll(&mut Finger(None), 120_000), Tick::Idle);
    }

    #[test]
    fn menu_commands() {
        let mut source = source();
        let mut deck = boot(&mut source);
        assert_eq!(
            deck.handle_command(Command::ShowMenu(2), &mut source),
            Tick::Navigated(Page::Menu(2))
        );
        assert_eq!(deck.handle_command(Command::ShowMenu(2), &mut source), Tick::Idle);
        assert_eq!(deck.handle_command(Command::Unknown, &mut source), Tick::Idle);
        assert_eq!(deck.handle_command(Command::Restart, &mut source), Tick::Restarting);
    }

    #[test]
    fn disconnected_press_still_latches() {
        let mut deck = boot(&mut source());
        deck.hid_mut().connected = false;
        tap(&mut deck, 0);
        tap(&mut deck, 0);
        assert_eq!(deck.hid().calls, vec![Call::ReleaseAll]);
        assert!(deck.latches().get(0));
    }

    #[test]
    fn latches_survive_reboot() {
        let mut source = source();
        let mut deck = boot(&mut source);
        tap(&mut deck, 0);
        tap(&mut deck, 0);
        deck.enter_sleep();
        let saved = deck.latch_store().saved;

        let mut peripherals = peripherals();
        peripherals.latch_store.saved = saved;
        let deck = Deck::boot(peripherals, &mut source, true, 0).unwrap();
        assert!(deck.latches().get(0));
    }
}
