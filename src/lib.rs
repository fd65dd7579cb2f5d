//! Control core for a touchscreen macro-pad.
//!
//! Six on-screen keys per page, a home page leading to five macro menus and
//! a settings page, latching keys that persist across sleep, and an action
//! interpreter that turns button macros into HID keyboard, media and mouse
//! reports.
//!
//! The crate is `no_std` and allocation free. Hardware is reached through
//! small traits so the same control loop runs on the device and in the
//! host simulator (`touchdeck-sim`, `--features sim`):
//!
//! | Seam                         | Provided by the runtime             |
//! |------------------------------|-------------------------------------|
//! | `DrawTarget<Color = Rgb565>` | TFT panel driver                    |
//! | [`bmp::ImageStore`]          | flash file system (icons)           |
//! | [`loader::ConfigSource`]     | JSON config files                   |
//! | [`latch::LatchStore`]        | persisted latch table               |
//! | [`hid::HidTransport`]        | BLE keyboard, or [`hid::ReportTransport`] over a [`hid::ReportSink`] |
//! | [`system::SystemControl`]    | backlight, buzzer, sleep, config server |
//! | [`machine::InputSource`]     | touch panel and gyro                |
//!
//! Usage: `cargo test` for the host tests.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════

pub mod action;
pub mod bmp;
pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod hid;
pub mod latch;
pub mod loader;
pub mod machine;
pub mod model;
pub mod page;
pub mod pointer;
pub mod power;
pub mod system;
pub mod ui;

#[cfg(test)]
mod testing;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use command::Command;
pub use error::Error;
pub use latch::{LatchRegistry, LatchStore};
pub use loader::{ConfigName, ConfigSource};
pub use machine::{Deck, InputSource, Peripherals, Tick};
pub use model::ConfigModel;
pub use page::Page;
