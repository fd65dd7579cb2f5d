//! Unified error type for touchdeck.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use core::fmt;

use crate::loader::ConfigName;

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Bitmaps
    /// Requested file does not exist in storage.
    FileNotFound,

    /// File is too short or its signature is not `BM`.
    InvalidFormat,

    /// Bits per pixel outside {1, 4, 16, 24}.
    UnsupportedDepth(u16),

    // Configuration
    /// A config record could not be turned into the in-memory model.
    MalformedConfig(ConfigName),

    /// A required config file is absent at boot. Fatal.
    MissingConfig(ConfigName),

    // HID
    /// Host link is down; dispatch was skipped.
    NotConnected,

    // Peripherals
    /// Latch persistence failed.
    Storage,

    /// Drawing to the display failed.
    Display,

    /// Reading from storage failed.
    Io,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileNotFound => f.write_str("file not found"),
            Error::InvalidFormat => f.write_str("not a BMP file"),
            Error::UnsupportedDepth(bpp) => write!(f, "unsupported bit depth {bpp}"),
            Error::MalformedConfig(name) => write!(f, "malformed config {}", name.as_str()),
            Error::MissingConfig(name) => write!(f, "missing config {}", name.path()),
            Error::NotConnected => f.write_str("HID transport not connected"),
            Error::Storage => f.write_str("latch storage failure"),
            Error::Display => f.write_str("display write failed"),
            Error::Io => f.write_str("storage read failed"),
        }
    }
}

impl core::error::Error for Error {}
