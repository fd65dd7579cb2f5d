//! Key rendering: background colour resolution and slot drawing.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, RoundedRectangle};

use super::layout::{icon_origin, key_rect, latch_marker};
use crate::bmp::{BmpDecoder, ColorSampler, DrawMode, ImageStore};
use crate::color::{to_rgb565, SENTINEL_BLACK, WHITE};
use crate::config::{BACK_ICON, EMPTY_ICON};
use crate::error::Error;
use crate::latch::LatchRegistry;
use crate::model::ConfigModel;
use crate::page::{self, Page, BACK_SLOT, SLOT_COUNT};

/// Everything needed to paint one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLook<'a> {
    pub background: u16,
    pub icon: &'a str,
    /// Opaque when the background came from the icon itself.
    pub mode: DrawMode,
    /// Latched without a dedicated latch icon.
    pub marker: bool,
}

/// Whether `slot` on `page` is shown latched.
pub fn is_latched(latches: &LatchRegistry, page: Page, slot: usize) -> bool {
    slot < BACK_SLOT && page::latch_index(page, slot).is_some_and(|index| latches.get(index))
}

/// Background colour taken from the icons. [`SENTINEL_BLACK`] if none applies.
pub fn sampled_background<C: ColorSampler>(
    sampler: &mut C,
    model: &ConfigModel,
    latches: &LatchRegistry,
    page: Page,
    slot: usize,
) -> u16 {
    if is_latched(latches, page, slot) {
        return match page {
            Page::Menu(_) => {
                let latch_icon = page::latch_icon(model, page, slot);
                if latch_icon == EMPTY_ICON {
                    page::icon(model, page, slot).map_or(SENTINEL_BLACK, |icon| sampler.sample(icon))
                } else {
                    sampler.sample(latch_icon)
                }
            }
            _ => SENTINEL_BLACK,
        };
    }
    match (page, slot) {
        (Page::Home, _) => page::icon(model, page, slot).map_or(SENTINEL_BLACK, |icon| sampler.sample(icon)),
        (_, BACK_SLOT) => sampler.sample(BACK_ICON),
        (Page::Menu(_), _) => page::icon(model, page, slot).map_or(SENTINEL_BLACK, |icon| sampler.sample(icon)),
        _ => SENTINEL_BLACK,
    }
}

/// Decide how a key looks. `None` for slots the page does not have.
pub fn resolve<'a, C: ColorSampler>(
    sampler: &mut C,
    model: &'a ConfigModel,
    latches: &LatchRegistry,
    page: Page,
    slot: usize,
) -> Option<SlotLook<'a>> {
    let regular = page::icon(model, page, slot)?;
    let latched = is_latched(latches, page, slot);
    let latch_icon = page::latch_icon(model, page, slot);
    let custom = latched && latch_icon != EMPTY_ICON;

    let sampled = sampled_background(sampler, model, latches, page, slot);
    let (background, mode) = if sampled != SENTINEL_BLACK {
        (sampled, DrawMode::Opaque)
    } else {
        (page::palette_color(&model.general, page, slot), DrawMode::Transparent)
    };

    Some(SlotLook {
        background,
        icon: if custom { latch_icon } else { regular },
        mode,
        marker: latched && !custom,
    })
}

fn key_shape(slot: usize) -> RoundedRectangle {
    let rect = key_rect(slot);
    let radius = rect.size.width.min(rect.size.height) / 4;
    RoundedRectangle::with_equal_corners(rect, Size::new(radius, radius))
}

fn key_style(fill: u16) -> PrimitiveStyle<Rgb565> {
    PrimitiveStyleBuilder::new()
        .fill_color(to_rgb565(fill))
        .stroke_color(Rgb565::WHITE)
        .stroke_width(1)
        .build()
}

/// Paint one key: outline and fill, the icon, then the latch marker.
pub fn draw_slot<D, S>(
    display: &mut D,
    decoder: &mut BmpDecoder<S>,
    model: &ConfigModel,
    latches: &LatchRegistry,
    page: Page,
    slot: usize,
) -> Result<(), Error>
where
    D: DrawTarget<Color = Rgb565>,
    S: ImageStore,
{
    let Some(look) = resolve(decoder, model, latches, page, slot) else {
        return Ok(());
    };
    key_shape(slot)
        .into_styled(key_style(look.background))
        .draw(display)
        .map_err(|_| Error::Display)?;

    decoder.draw(display, look.icon, icon_origin(slot), look.mode)?;

    if look.marker {
        latch_marker(slot)
            .into_styled(PrimitiveStyle::with_fill(to_rgb565(model.general.latch_color)))
            .draw(display)
            .map_err(|_| Error::Display)?;
    }
    Ok(())
}

/// Inverted (all-white) key shown while a press is being handled.
pub fn draw_pressed<D>(display: &mut D, slot: usize) -> Result<(), Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    key_shape(slot)
        .into_styled(key_style(WHITE))
        .draw(display)
        .map_err(|_| Error::Display)
}

/// Paint all six keys of a keypad page. A failing key does not stop the
/// others; the first error is returned.
pub fn draw_keypad<D, S>(
    display: &mut D,
    decoder: &mut BmpDecoder<S>,
    model: &ConfigModel,
    latches: &LatchRegistry,
    page: Page,
) -> Result<(), Error>
where
    D: DrawTarget<Color = Rgb565>,
    S: ImageStore,
{
    let mut result = Ok(());
    for slot in 0..SLOT_COUNT {
        result = result.and(draw_slot(display, decoder, model, latches, page, slot));
    }
    result
}
