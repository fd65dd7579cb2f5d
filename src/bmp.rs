//! Streaming decoder for the BMP subset used by icons and splash images.
//!
//! Only the legacy 14-byte file header and the 40-byte info header are
//! understood. Pixel data must be uncompressed and stored bottom-up.
//!
//! Layout of the fields consumed:
//! ```text
//! Offset  Size  Field
//!   0      2    Signature "BM" (0x4D42 little-endian)
//!  10      4    Pixel data offset
//!  18      4    Width
//!  22      4    Height
//!  28      2    Bits per pixel (1, 4, 16 or 24)
//!  30      4    Compression (ignored)
//!  54    4*n    Palette for 1/4-bit images (B, G, R, reserved)
//! ```
//!
//! Nothing is buffered beyond one row, so decoding works directly from
//! flash or an SD card.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::color::{rgb888_to_rgb565, to_rgb565, SENTINEL_BLACK};
use crate::config::{FALLBACK_ICON, MAX_BMP_WIDTH};
use crate::error::Error;

/// "BM" read as a little-endian u16.
pub const BMP_SIGNATURE: u16 = 0x4D42;

/// File header plus info header.
pub const HEADER_LEN: usize = 54;

/// Palette location; fixed because only the 40-byte info header is supported.
const PALETTE_OFFSET: u32 = 0x36;

/// Scratch space for the widest decodable row at 24 bpp.
const MAX_ROW_BYTES: usize = MAX_BMP_WIDTH * 3;

// Storage seam

/// A readable file with random access.
pub trait ImageFile {
    /// Total size in bytes. Zero is treated as "missing".
    fn size(&self) -> u32;

    /// Read up to `buf.len()` bytes starting at `offset`. Returns the count read.
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Path-addressed image storage (SPIFFS, FAT, a flash table...).
pub trait ImageStore {
    type File: ImageFile;

    /// Open `path`, or fail with [`Error::FileNotFound`].
    fn open(&mut self, path: &str) -> Result<Self::File, Error>;
}

impl<S: ImageStore + ?Sized> ImageStore for &mut S {
    type File = S::File;

    fn open(&mut self, path: &str) -> Result<Self::File, Error> {
        (**self).open(path)
    }
}

impl ImageFile for &[u8] {
    fn size(&self) -> u32 {
        <[u8]>::len(self) as u32
    }

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Error> {
        let data: &[u8] = self;
        let start = (offset as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }
}

/// Images compiled into the firmware image, looked up by path.
#[derive(Clone, Copy)]
pub struct ImageTable<'a> {
    entries: &'a [(&'a str, &'a [u8])],
}

impl<'a> ImageTable<'a> {
    pub const fn new(entries: &'a [(&'a str, &'a [u8])]) -> Self {
        Self { entries }
    }
}

impl<'a> ImageStore for ImageTable<'a> {
    type File = &'a [u8];

    fn open(&mut self, path: &str) -> Result<Self::File, Error> {
        self.entries
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, data)| *data)
            .ok_or(Error::FileNotFound)
    }
}

fn read_exact<F: ImageFile>(file: &mut F, offset: u32, buf: &mut [u8]) -> Result<(), Error> {
    if file.read_at(offset, buf)? < buf.len() {
        return Err(Error::InvalidFormat);
    }
    Ok(())
}

// Header

/// Supported pixel depths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDepth {
    Mono,
    Nibble,
    HighColor,
    TrueColor,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            1 => Some(BitDepth::Mono),
            4 => Some(BitDepth::Nibble),
            16 => Some(BitDepth::HighColor),
            24 => Some(BitDepth::TrueColor),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Mono => 1,
            BitDepth::Nibble => 4,
            BitDepth::HighColor => 16,
            BitDepth::TrueColor => 24,
        }
    }

    /// Number of palette entries following the header.
    pub fn palette_len(self) -> usize {
        match self {
            BitDepth::Mono => 2,
            BitDepth::Nibble => 16,
            BitDepth::HighColor | BitDepth::TrueColor => 0,
        }
    }

    /// Bytes holding `width` pixels, without row padding.
    ///
    /// `None` when the header width overflows a 32-bit offset.
    pub fn row_bytes(self, width: u32) -> Option<u32> {
        match self {
            BitDepth::Mono => Some(width.div_ceil(8)),
            BitDepth::Nibble => Some(width.div_ceil(2)),
            BitDepth::HighColor => width.checked_mul(2),
            BitDepth::TrueColor => width.checked_mul(3),
        }
    }

    /// Bytes between the starts of two stored rows.
    pub fn row_stride(self, width: u32) -> Option<u32> {
        let bytes = self.row_bytes(width)?;
        bytes.checked_add((4 - (bytes & 3)) & 3)
    }
}

/// Fields of the file and info headers the decoder relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BmpHeader {
    pub data_offset: u32,
    pub width: u32,
    pub height: u32,
    pub depth: BitDepth,
    pub compression: u32,
}

impl BmpHeader {
    /// Parse the first [`HEADER_LEN`] bytes of a file.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidFormat);
        }
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        if u16_at(0) != BMP_SIGNATURE {
            return Err(Error::InvalidFormat);
        }
        let bits = u16_at(28);
        let depth = BitDepth::from_bits(bits).ok_or(Error::UnsupportedDepth(bits))?;

        Ok(Self {
            data_offset: u32_at(10),
            width: u32_at(18),
            height: u32_at(22),
            depth,
            compression: u32_at(30),
        })
    }

    pub fn read<F: ImageFile>(file: &mut F) -> Result<Self, Error> {
        let mut raw = [0u8; HEADER_LEN];
        read_exact(file, 0, &mut raw)?;
        Self::parse(&raw)
    }
}

// Decoding

/// An opened bitmap: header and palette parsed, pixel rows read on demand.
pub struct Bitmap<F> {
    file: F,
    header: BmpHeader,
    palette: [u16; 16],
}

impl<F: ImageFile> Bitmap<F> {
    pub fn open(mut file: F) -> Result<Self, Error> {
        if file.size() == 0 {
            return Err(Error::FileNotFound);
        }
        let header = BmpHeader::read(&mut file)?;

        let mut palette = [SENTINEL_BLACK; 16];
        let entries = header.depth.palette_len();
        if entries > 0 {
            let mut raw = [0u8; 16 * 4];
            read_exact(&mut file, PALETTE_OFFSET, &mut raw[..entries * 4])?;
            for (slot, bgra) in palette.iter_mut().zip(raw[..entries * 4].chunks_exact(4)) {
                *slot = rgb888_to_rgb565(bgra[2], bgra[1], bgra[0]);
            }
        }

        Ok(Self {
            file,
            header,
            palette,
        })
    }

    pub fn header(&self) -> &BmpHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Decode stored row `row` (0 is the visually bottom row) into `out`.
    ///
    /// Returns the number of pixels written, which is the image width
    /// cropped to `out.len()` and the decoder's row limit.
    pub fn read_row(&mut self, row: u32, out: &mut [u16]) -> Result<usize, Error> {
        let depth = self.header.depth;
        let columns = (self.header.width as usize).min(out.len()).min(MAX_BMP_WIDTH);
        let offset = depth
            .row_stride(self.header.width)
            .and_then(|stride| stride.checked_mul(row))
            .and_then(|skip| skip.checked_add(self.header.data_offset))
            .ok_or(Error::InvalidFormat)?;

        let mut raw = [0u8; MAX_ROW_BYTES];
        let len = depth.row_bytes(columns as u32).ok_or(Error::InvalidFormat)?;
        let raw = &mut raw[..len as usize];
        read_exact(&mut self.file, offset, raw)?;
        decode_pixels(depth, &self.palette, raw, &mut out[..columns]);
        Ok(columns)
    }

    /// Colour of the first stored pixel (bottom-left corner).
    pub fn first_pixel(&mut self) -> Result<u16, Error> {
        let depth = self.header.depth;
        let mut raw = [0u8; 3];
        let len = depth.row_bytes(1).ok_or(Error::InvalidFormat)?;
        let raw = &mut raw[..len as usize];
        read_exact(&mut self.file, self.header.data_offset, raw)?;
        let mut pixel = [SENTINEL_BLACK; 1];
        decode_pixels(depth, &self.palette, raw, &mut pixel);
        Ok(pixel[0])
    }
}

fn decode_pixels(depth: BitDepth, palette: &[u16; 16], raw: &[u8], out: &mut [u16]) {
    for (col, px) in out.iter_mut().enumerate() {
        *px = match depth {
            BitDepth::Mono => palette[usize::from((raw[col / 8] >> (7 - col % 8)) & 1)],
            BitDepth::Nibble => {
                let byte = raw[col / 2];
                let index = if col % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                palette[usize::from(index)]
            }
            // Assumed to be stored as RGB565 already.
            BitDepth::HighColor => u16::from_le_bytes([raw[col * 2], raw[col * 2 + 1]]),
            BitDepth::TrueColor => {
                rgb888_to_rgb565(raw[col * 3 + 2], raw[col * 3 + 1], raw[col * 3])
            }
        };
    }
}

// Rendering

/// Whether sentinel-black pixels are written or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawMode {
    Opaque,
    Transparent,
}

/// Source of icon background colours for key rendering.
pub trait ColorSampler {
    /// Colour of the first pixel of `path`, or [`SENTINEL_BLACK`] if it
    /// cannot be read.
    fn sample(&mut self, path: &str) -> u16;
}

impl<F: FnMut(&str) -> u16> ColorSampler for F {
    fn sample(&mut self, path: &str) -> u16 {
        self(path)
    }
}

/// Draws and samples bitmaps out of an [`ImageStore`].
pub struct BmpDecoder<S> {
    store: S,
}

impl<S: ImageStore> BmpDecoder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn open(&mut self, path: &str) -> Result<Bitmap<S::File>, Error> {
        Bitmap::open(self.store.open(path)?)
    }

    /// Draw `path` with its top-left corner at `origin`.
    ///
    /// Missing files are replaced with the fallback icon. Rows are read
    /// bottom-up and pushed one at a time; anything outside the target is
    /// clipped.
    pub fn draw<D>(&mut self, target: &mut D, path: &str, origin: Point, mode: DrawMode) -> Result<(), Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let screen = target.bounding_box().size;
        if origin.x >= screen.width as i32 || origin.y >= screen.height as i32 {
            return Ok(());
        }

        let mut bitmap = match self.open(path) {
            Ok(bitmap) => bitmap,
            Err(Error::FileNotFound) => {
                warn!("Bitmap not found: {}", path);
                self.open(FALLBACK_ICON).inspect_err(|_| {
                    warn!("Fallback icon {} unavailable", FALLBACK_ICON);
                })?
            }
            Err(e) => {
                log_decode_error(path, e);
                return Err(e);
            }
        };

        let height = bitmap.height();
        let bottom = i64::from(origin.y) + i64::from(height) - 1;
        let first_row = (bottom - (i64::from(screen.height) - 1)).clamp(0, i64::from(height)) as u32;

        let mut pixels = [SENTINEL_BLACK; MAX_BMP_WIDTH];
        for row in first_row..height {
            let y = bottom - i64::from(row);
            if y < 0 {
                break;
            }
            let count = bitmap
                .read_row(row, &mut pixels)
                .inspect_err(|&e| log_decode_error(path, e))?;
            push_row(target, Point::new(origin.x, y as i32), &pixels[..count], mode)?;
        }
        Ok(())
    }

    /// Colour of the first stored pixel, or [`SENTINEL_BLACK`] on any failure.
    pub fn sample_first_pixel(&mut self, path: &str) -> u16 {
        match self.open(path).and_then(|mut bitmap| bitmap.first_pixel()) {
            Ok(color) => color,
            Err(Error::FileNotFound) => {
                debug!("Colour sample: {} not found", path);
                SENTINEL_BLACK
            }
            Err(e) => {
                log_decode_error(path, e);
                SENTINEL_BLACK
            }
        }
    }
}

impl<S: ImageStore> ColorSampler for BmpDecoder<S> {
    fn sample(&mut self, path: &str) -> u16 {
        self.sample_first_pixel(path)
    }
}

fn log_decode_error(path: &str, e: Error) {
    match e {
        Error::UnsupportedDepth(bits) => warn!("BMP format not supported: {} bpp ({})", bits, path),
        Error::InvalidFormat => warn!("Not a valid BMP: {}", path),
        _ => warn!("Failed to read bitmap {}", path),
    }
}

fn push_row<D>(target: &mut D, start: Point, pixels: &[u16], mode: DrawMode) -> Result<(), Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let result = match mode {
        DrawMode::Opaque => target.fill_contiguous(
            &Rectangle::new(start, Size::new(pixels.len() as u32, 1)),
            pixels.iter().map(|&px| to_rgb565(px)),
        ),
        DrawMode::Transparent => target.draw_iter(
            pixels
                .iter()
                .enumerate()
                .filter(|&(_, &px)| px != SENTINEL_BLACK)
                .map(|(col, &px)| Pixel(start + Point::new(col as i32, 0), to_rgb565(px))),
        ),
    };
    result.map_err(|_| Error::Display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::WHITE;
    use crate::testing::{bmp, solid_bmp24, TestDisplay};

    const BLACK_WHITE: [[u8; 4]; 2] = [[0, 0, 0, 0], [0xFF, 0xFF, 0xFF, 0]];

    fn sample(data: &[u8]) -> u16 {
        let entries = [("/img.bmp", data)];
        BmpDecoder::new(ImageTable::new(&entries)).sample_first_pixel("/img.bmp")
    }

    #[test]
    fn header_fields() {
        let data = solid_bmp24(5, 3, [1, 2, 3]);
        let header = BmpHeader::parse(&data).unwrap();
        assert_eq!(header.data_offset, 54);
        assert_eq!(header.width, 5);
        assert_eq!(header.height, 3);
        assert_eq!(header.depth, BitDepth::TrueColor);
    }

    #[test]
    fn bad_signature_is_invalid() {
        let mut data = solid_bmp24(2, 2, [0, 0, 0]);
        data[0] = b'P';
        assert_eq!(BmpHeader::parse(&data), Err(Error::InvalidFormat));
        assert_eq!(BmpHeader::parse(&data[..20]), Err(Error::InvalidFormat));
    }

    #[test]
    fn oversized_width_is_rejected_without_panicking() {
        let data = bmp(24, 0x6000_0000, 1, &[], &[&[1, 2, 3]]);
        let entries = [("/wide.bmp", data.as_slice())];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));
        let mut display = TestDisplay::new();
        assert_eq!(
            decoder.draw(&mut display, "/wide.bmp", Point::zero(), DrawMode::Opaque),
            Err(Error::InvalidFormat)
        );
        assert_eq!(display.writes, 0);
    }

    #[test]
    fn unsupported_depth() {
        let data = bmp(8, 1, 1, &[], &[&[0]]);
        assert_eq!(BmpHeader::parse(&data), Err(Error::UnsupportedDepth(8)));
        assert_eq!(sample(&data), SENTINEL_BLACK);
    }

    #[test]
    fn row_stride_padding() {
        assert_eq!(BitDepth::TrueColor.row_stride(1), Some(4));
        assert_eq!(BitDepth::TrueColor.row_stride(4), Some(12));
        assert_eq!(BitDepth::TrueColor.row_stride(5), Some(16));
        assert_eq!(BitDepth::HighColor.row_stride(3), Some(8));
        assert_eq!(BitDepth::Nibble.row_stride(9), Some(8));
        assert_eq!(BitDepth::Mono.row_stride(33), Some(8));
        assert_eq!(BitDepth::Mono.row_stride(8), Some(4));
        assert_eq!(BitDepth::TrueColor.row_stride(u32::MAX / 2), None);
        assert_eq!(BitDepth::HighColor.row_stride(u32::MAX - 1), None);
    }

    #[test]
    fn sample_mono_uses_msb() {
        let data = bmp(1, 8, 1, &BLACK_WHITE, &[&[0b1000_0000]]);
        assert_eq!(sample(&data), WHITE);
        let data = bmp(1, 8, 1, &BLACK_WHITE, &[&[0b0111_1111]]);
        assert_eq!(sample(&data), SENTINEL_BLACK);
    }

    #[test]
    fn sample_nibble_uses_upper_half() {
        let mut palette = [[0u8; 4]; 16];
        palette[3] = [0, 0, 0xFF, 0]; // red
        let data = bmp(4, 2, 1, &palette, &[&[0x30]]);
        assert_eq!(sample(&data), 0xF800);
    }

    #[test]
    fn sample_high_color_is_raw() {
        let data = bmp(16, 1, 1, &[], &[&[0x34, 0x12]]);
        assert_eq!(sample(&data), 0x1234);
    }

    #[test]
    fn sample_true_color_truncates() {
        let data = solid_bmp24(75, 75, [0xF4, 0x9B, 0x00]);
        assert_eq!(sample(&data), rgb888_to_rgb565(0x00, 0x9B, 0xF4));
    }

    #[test]
    fn sample_ignores_dimensions() {
        let a = bmp(16, 1, 1, &[], &[&[0xCD, 0xAB]]);
        let b = bmp(16, 3, 2, &[], &[&[0xCD, 0xAB, 0, 0, 0, 0], &[1, 2, 3, 4, 5, 6]]);
        assert_eq!(sample(&a), sample(&b));
    }

    #[test]
    fn sample_missing_is_sentinel() {
        let mut decoder = BmpDecoder::new(ImageTable::new(&[]));
        assert_eq!(decoder.sample_first_pixel("/logos/nope.bmp"), SENTINEL_BLACK);
    }

    #[test]
    fn rows_decode_bottom_up() {
        // Bottom row red, top row blue.
        let data = bmp(24, 1, 2, &[], &[&[0, 0, 0xFF], &[0xFF, 0, 0]]);
        let entries = [("/a.bmp", data.as_slice())];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));
        let mut display = TestDisplay::new();
        decoder.draw(&mut display, "/a.bmp", Point::new(10, 20), DrawMode::Opaque).unwrap();
        assert_eq!(display.pixel(10, 20), 0x001F);
        assert_eq!(display.pixel(10, 21), 0xF800);
    }

    #[test]
    fn transparent_draw_skips_black() {
        let data = bmp(1, 2, 1, &BLACK_WHITE, &[&[0b0100_0000]]);
        let entries = [("/a.bmp", data.as_slice())];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));

        let mut display = TestDisplay::filled(0x1111);
        decoder.draw(&mut display, "/a.bmp", Point::zero(), DrawMode::Transparent).unwrap();
        assert_eq!(display.pixel(0, 0), 0x1111);
        assert_eq!(display.pixel(1, 0), WHITE);
        assert_eq!(display.writes, 1);

        let mut display = TestDisplay::filled(0x1111);
        decoder.draw(&mut display, "/a.bmp", Point::zero(), DrawMode::Opaque).unwrap();
        assert_eq!(display.pixel(0, 0), SENTINEL_BLACK);
    }

    #[test]
    fn missing_file_draws_fallback() {
        let fallback = solid_bmp24(2, 2, [0xFF, 0xFF, 0xFF]);
        let entries = [(FALLBACK_ICON, fallback.as_slice())];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));
        let mut display = TestDisplay::new();
        decoder.draw(&mut display, "/logos/gone.bmp", Point::new(4, 4), DrawMode::Opaque).unwrap();
        assert_eq!(display.pixel(5, 5), WHITE);
    }

    #[test]
    fn missing_fallback_reports_not_found() {
        let mut decoder = BmpDecoder::new(ImageTable::new(&[]));
        let mut display = TestDisplay::new();
        let result = decoder.draw(&mut display, "/logos/gone.bmp", Point::zero(), DrawMode::Transparent);
        assert_eq!(result, Err(Error::FileNotFound));
        assert_eq!(display.writes, 0);
    }

    #[test]
    fn invalid_file_is_skipped() {
        let data = *b"not a bitmap at all, just some text bytes padding padding padding";
        let entries = [("/a.bmp", &data[..])];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));
        let mut display = TestDisplay::new();
        let result = decoder.draw(&mut display, "/a.bmp", Point::zero(), DrawMode::Opaque);
        assert_eq!(result, Err(Error::InvalidFormat));
        assert_eq!(display.writes, 0);
    }

    #[test]
    fn draw_clips_to_target() {
        let data = solid_bmp24(4, 4, [0xFF, 0xFF, 0xFF]);
        let entries = [("/a.bmp", data.as_slice())];
        let mut decoder = BmpDecoder::new(ImageTable::new(&entries));
        let mut display = TestDisplay::new();
        decoder.draw(&mut display, "/a.bmp", Point::new(318, 238), DrawMode::Opaque).unwrap();
        assert_eq!(display.writes, 4);
        assert_eq!(display.pixel(319, 239), WHITE);

        let mut display = TestDisplay::new();
        decoder.draw(&mut display, "/a.bmp", Point::new(320, 0), DrawMode::Opaque).unwrap();
        assert_eq!(display.writes, 0);
    }

    #[test]
    fn nibble_rows_alternate_halves() {
        let mut palette = [[0u8; 4]; 16];
        palette[1] = [0xFF, 0, 0, 0]; // blue
        palette[2] = [0, 0xFF, 0, 0]; // green
        let data = bmp(4, 3, 1, &palette, &[&[0x12, 0x10]]);
        let mut bitmap = Bitmap::open(data.as_slice()).unwrap();
        let mut row = [0u16; 3];
        assert_eq!(bitmap.read_row(0, &mut row).unwrap(), 3);
        assert_eq!(row, [0x001F, 0x07E0, 0x001F]);
    }
}
