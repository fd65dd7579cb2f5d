//! Text screens: boot status, info, config mode and error pages.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, RoundedRectangle};
use embedded_graphics::text::{Alignment, Text};
use heapless::String;

use super::layout::restart_rect;
use crate::color::to_rgb565;
use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH, VERSION};
use crate::loader::ConfigName;

const MARGIN_X: i32 = 8;
const LINE_HEIGHT: i32 = 14;

type Line = String<64>;

fn text_style() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(Rgb565::WHITE)
        .build()
}

fn title_style() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(Rgb565::WHITE)
        .build()
}

/// Y of the baseline of body line `n`.
fn line_y(n: i32) -> i32 {
    52 + n * LINE_HEIGHT
}

fn body<D: DrawTarget<Color = Rgb565>>(display: &mut D, n: i32, text: &str) {
    let _ = Text::new(text, Point::new(MARGIN_X, line_y(n)), text_style()).draw(display);
}

fn title<D: DrawTarget<Color = Rgb565>>(display: &mut D, text: &str) {
    let _ = Text::new(text, Point::new(MARGIN_X, 24), title_style()).draw(display);
}

/// Fill the whole screen with a raw colour.
pub fn clear<D: DrawTarget<Color = Rgb565>>(display: &mut D, color: u16) {
    let _ = display.clear(to_rgb565(color));
}

/// One centred status line near the bottom of the splash screen.
pub fn draw_boot_status<D: DrawTarget<Color = Rgb565>>(display: &mut D, message: &str) {
    let at = Point::new(SCREEN_WIDTH as i32 / 2, SCREEN_HEIGHT as i32 - 12);
    let _ = Text::with_alignment(message, at, text_style(), Alignment::Center).draw(display);
}

/// Values shown on the info page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoView {
    pub sleep_enabled: bool,
    pub sleep_timer: u16,
    pub beep: bool,
    pub backlight: u8,
    pub hid_connected: bool,
}

pub fn draw_info<D: DrawTarget<Color = Rgb565>>(display: &mut D, info: &InfoView) {
    clear(display, 0);
    title(display, "touchdeck");

    let mut line = Line::new();
    let _ = write!(line, "Version: {}", VERSION);
    body(display, 0, &line);

    line.clear();
    if info.sleep_enabled {
        let _ = write!(line, "Sleep: after {} min", info.sleep_timer);
    } else {
        let _ = line.push_str("Sleep: disabled");
    }
    body(display, 1, &line);

    body(display, 2, if info.beep { "Beep: on" } else { "Beep: off" });

    line.clear();
    let _ = write!(line, "Backlight: {}", info.backlight);
    body(display, 3, &line);

    body(
        display,
        4,
        if info.hid_connected {
            "Host: connected"
        } else {
            "Host: not connected"
        },
    );

    body(display, 6, "Touch anywhere to return");
}

/// Config server running; the only way out is the restart button.
pub fn draw_wifi_status<D: DrawTarget<Color = Rgb565>>(display: &mut D) {
    clear(display, 0);
    title(display, "Config mode");
    body(display, 0, "The configurator is running.");
    body(display, 1, "Upload new settings, then restart");
    body(display, 2, "to apply them.");

    let rect = restart_rect();
    let style = PrimitiveStyleBuilder::new()
        .fill_color(Rgb565::RED)
        .stroke_color(Rgb565::WHITE)
        .stroke_width(1)
        .build();
    let _ = RoundedRectangle::with_equal_corners(rect, Size::new(8, 8))
        .into_styled(style)
        .draw(display);
    // The button runs off the right edge; centre the label on its visible part.
    let visible_center = Point::new(
        (rect.top_left.x + SCREEN_WIDTH as i32) / 2,
        rect.top_left.y + rect.size.height as i32 / 2 + 5,
    );
    let _ = Text::with_alignment("Restart", visible_center, title_style(), Alignment::Center).draw(display);
}

pub fn draw_wifi_failure<D: DrawTarget<Color = Rgb565>>(display: &mut D) {
    clear(display, 0);
    title(display, "Config mode failed");
    body(display, 0, "Could not start the configurator.");
    body(display, 1, "Check the network settings.");
    body(display, 3, "Touch anywhere to return");
}

/// Interactive error page after a config file failed to load.
pub fn draw_config_error<D: DrawTarget<Color = Rgb565>>(display: &mut D, name: Option<ConfigName>) {
    clear(display, 0);
    title(display, "Config error");

    let mut line = Line::new();
    match name {
        Some(name) => {
            let _ = write!(line, "{}.json seems to be corrupted.", name);
            body(display, 0, &line);
            line.clear();
            let _ = write!(line, "To reset to default type 'reset {}'.", name);
            body(display, 1, &line);
        }
        None => body(display, 0, "A config file seems to be corrupted."),
    }
    body(display, 3, "Touch anywhere to continue");
}

/// Boot halted: a required config file is absent.
pub fn draw_fatal<D: DrawTarget<Color = Rgb565>>(display: &mut D, name: ConfigName) {
    clear(display, 0);
    title(display, "Fatal error");
    let mut line = Line::new();
    let _ = write!(line, "{} not found!", name.path());
    body(display, 0, &line);
    body(display, 1, "Upload the config files and restart.");
}
