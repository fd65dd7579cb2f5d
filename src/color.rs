//! RGB565 colour helpers.
//!
//! Colours travel through the crate as packed `u16` values so the sentinel
//! comparison and latch/background arithmetic stay trivial; conversion to
//! `embedded_graphics` colours happens at the drawing edge.

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// "No colour found" and the transparency key for masked drawing.
pub const SENTINEL_BLACK: u16 = 0x0000;

pub const WHITE: u16 = 0xFFFF;

/// Pack an 8-bit-per-channel colour by truncating to 5-6-5 bits.
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3)
}

/// Parse `#RRGGBB` (the leading `#` is optional) into RGB565.
pub fn parse_hex_color(s: &str) -> Option<u16> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(rgb888_to_rgb565(r, g, b))
}

/// Packed value to drawing colour.
pub fn to_rgb565(raw: u16) -> Rgb565 {
    Rgb565::from(RawU16::new(raw))
}

/// Drawing colour back to its packed value.
pub fn to_raw(color: Rgb565) -> u16 {
    color.into_storage()
}
