//! Application-wide constants and compile-time configuration.
//!
//! Screen geometry, file-system paths, timing parameters and latch table
//! layout live here so they can be tuned in one place.

// Display

/// Panel size in landscape orientation (pixels).
pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 240;

/// Centre of the top-left key.
pub const KEY_X: i32 = 53;
pub const KEY_Y: i32 = 60;

/// Gap between neighbouring keys.
pub const KEY_SPACING_X: i32 = 13;
pub const KEY_SPACING_Y: i32 = 15;

/// Key outline size.
pub const KEY_W: u32 = 93;
pub const KEY_H: u32 = 91;

/// Icons are square bitmaps of this edge length.
pub const ICON_SIZE: u32 = 75;

/// Edge length of the latch marker drawn in a key's corner.
pub const LATCH_MARKER_SIZE: u32 = 18;

/// Widest bitmap row the decoder will materialise. Wider images are cropped.
pub const MAX_BMP_WIDTH: usize = SCREEN_WIDTH as usize;

// File system

/// Directory holding user icons; logo names from config files are joined onto it.
pub const LOGO_DIR: &str = "/logos/";

/// Latch icon path meaning "no dedicated latch icon".
pub const EMPTY_ICON: &str = "/logos/";

/// Drawn in place of any icon that is missing from storage.
pub const FALLBACK_ICON: &str = "/sys/ico/question.bmp";

/// Full-screen splash shown while booting.
pub const SPLASH_IMAGE: &str = "/sys/ico/home.bmp";

/// Back button on every page except Home.
pub const BACK_ICON: &str = "/logos/home.bmp";

/// Fixed icon set of the settings page.
pub const SETTINGS_ICONS: [&str; 6] = [
    "/sys/ico/wifi.bmp",
    "/sys/ico/brightnessdown.bmp",
    "/sys/ico/brightnessup.bmp",
    "/sys/ico/sleep.bmp",
    "/sys/ico/info.bmp",
    BACK_ICON,
];

/// Logo file used when a config record leaves a logo out.
pub const DEFAULT_LOGO: &str = "question.bmp";

/// Directory of the JSON configuration files.
pub const CONFIG_DIR: &str = "/config/";

// Latches

/// Size of the persisted latch table: 5 menus x 5 slots plus settings.
pub const LATCH_SLOTS: usize = 30;

/// First index used by settings-page toggles.
pub const SETTINGS_LATCH_BASE: usize = 25;

/// Latch showing whether auto-sleep is enabled (settings slot 3).
pub const SLEEP_LATCH_INDEX: usize = 28;

// Backlight

pub const BRIGHTNESS_DEFAULT: u8 = 255;
pub const BRIGHTNESS_STEP: u8 = 25;
pub const BRIGHTNESS_MIN: u8 = 25;
pub const BRIGHTNESS_MAX: u8 = 230;

// Timing

/// Pause after handling a key press before polling again (ms).
pub const PRESS_DEBOUNCE_MS: u32 = 10;

/// Pacing of the motion pointer loop (ms).
pub const MOTION_POLL_MS: u32 = 6;

/// Gyro counts per pointer step.
pub const MOTION_SENSITIVITY: i16 = 200;

/// Sleep timer unit (ms per minute).
pub const MS_PER_MINUTE: u64 = 60_000;

// Buzzer

/// Key press click (Hz, ms).
pub const PRESS_BEEP: (u16, u16) = (600, 50);

/// Rising tones played once boot finishes.
pub const BOOT_BEEPS: [(u16, u16); 3] = [(600, 150), (800, 150), (1200, 150)];

/// Falling tones played before going to sleep.
pub const SLEEP_BEEPS: [(u16, u16); 3] = [(1200, 150), (800, 150), (600, 150)];

// Utility pages

/// Restart button on the config-mode page, as (x, y, width, height).
pub const RESTART_BUTTON: (i32, i32, u32, u32) = (140, 180, 200, 80);

/// Version string shown on the splash and info pages.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
