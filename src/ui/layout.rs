//! Screen geometry of the key grid and utility buttons.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::{
    ICON_SIZE, KEY_H, KEY_SPACING_X, KEY_SPACING_Y, KEY_W, KEY_X, KEY_Y, LATCH_MARKER_SIZE,
    RESTART_BUTTON,
};
use crate::page::SLOT_COUNT;

const COLUMNS: usize = 3;

/// Inset of the latch marker from the key's top-right corner.
const MARKER_INSET: i32 = 6;

/// (column, row) of a slot in the 3x2 grid.
pub fn grid_position(slot: usize) -> (i32, i32) {
    ((slot % COLUMNS) as i32, (slot / COLUMNS) as i32)
}

pub fn key_center(slot: usize) -> Point {
    let (col, row) = grid_position(slot);
    Point::new(
        KEY_X + col * (KEY_W as i32 + KEY_SPACING_X),
        KEY_Y + row * (KEY_H as i32 + KEY_SPACING_Y),
    )
}

pub fn key_rect(slot: usize) -> Rectangle {
    Rectangle::with_center(key_center(slot), Size::new(KEY_W, KEY_H))
}

/// Top-left corner of a slot's icon, centred on the key.
pub fn icon_origin(slot: usize) -> Point {
    let half = ICON_SIZE as i32 / 2;
    key_center(slot) - Point::new(half, half)
}

/// Small square in the top-right corner of a latched key.
pub fn latch_marker(slot: usize) -> Rectangle {
    let key = key_rect(slot);
    let x = key.top_left.x + key.size.width as i32 - MARKER_INSET - LATCH_MARKER_SIZE as i32;
    let y = key.top_left.y + MARKER_INSET;
    Rectangle::new(Point::new(x, y), Size::new(LATCH_MARKER_SIZE, LATCH_MARKER_SIZE))
}

/// Slot whose key contains `point`.
pub fn slot_at(point: Point) -> Option<usize> {
    (0..SLOT_COUNT).find(|&slot| key_rect(slot).contains(point))
}

pub fn restart_rect() -> Rectangle {
    let (x, y, w, h) = RESTART_BUTTON;
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

/// Touch inside the restart button, borders excluded.
pub fn restart_hit(point: Point) -> bool {
    let (x, y, w, h) = RESTART_BUTTON;
    point.x > x && point.x < x + w as i32 && point.y > y && point.y < y + h as i32
}
