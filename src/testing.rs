//! Shared fixtures for unit tests: in-memory bitmaps and a recording display.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::color::to_raw;
use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Assemble a BMP file. `rows` are unpadded pixel rows in storage order
/// (bottom row first); padding to 4 bytes is added here.
pub fn bmp(bpp: u16, width: u32, height: u32, palette: &[[u8; 4]], rows: &[&[u8]]) -> Vec<u8> {
    let data_offset = 54 + 4 * palette.len() as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&0u32.to_le_bytes()); // file size, unused
    out.extend_from_slice(&0u32.to_le_bytes()); // reserved
    out.extend_from_slice(&data_offset.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&[0u8; 24]); // compression .. important colours
    for entry in palette {
        out.extend_from_slice(entry);
    }
    for row in rows {
        out.extend_from_slice(row);
        let pad = (4 - (row.len() & 3)) & 3;
        out.extend(core::iter::repeat(0u8).take(pad));
    }
    out
}

/// Solid 24-bit image of the given BGR colour.
pub fn solid_bmp24(width: u32, height: u32, bgr: [u8; 3]) -> Vec<u8> {
    let row: Vec<u8> = (0..width).flat_map(|_| bgr).collect();
    let rows: Vec<&[u8]> = (0..height).map(|_| row.as_slice()).collect();
    bmp(24, width, height, &[], &rows)
}

/// Framebuffer display that records every pixel write.
pub struct TestDisplay {
    pub pixels: Vec<u16>,
    pub writes: usize,
}

impl TestDisplay {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
            writes: 0,
        }
    }

    pub fn filled(color: u16) -> Self {
        let mut display = Self::new();
        display.pixels.fill(color);
        display
    }

    pub fn pixel(&self, x: i32, y: i32) -> u16 {
        self.pixels[(y as u32 * SCREEN_WIDTH + x as u32) as usize]
    }
}

impl OriginDimensions for TestDisplay {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for TestDisplay {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0
                || point.y < 0
                || point.x >= SCREEN_WIDTH as i32
                || point.y >= SCREEN_HEIGHT as i32
            {
                continue;
            }
            let index = (point.y as u32 * SCREEN_WIDTH + point.x as u32) as usize;
            self.pixels[index] = to_raw(color);
            self.writes += 1;
        }
        Ok(())
    }
}
