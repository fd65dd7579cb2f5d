//! Edge detection for the on-screen keys.

use embedded_graphics::prelude::Point;

use super::layout::key_rect;
use crate::page::SLOT_COUNT;

/// Current and previous pressed state of one key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pressed: bool,
    was_pressed: bool,
}

impl KeyState {
    pub fn press(&mut self, pressed: bool) {
        self.was_pressed = self.pressed;
        self.pressed = pressed;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn just_pressed(&self) -> bool {
        self.pressed && !self.was_pressed
    }

    pub fn just_released(&self) -> bool {
        !self.pressed && self.was_pressed
    }
}

/// Key states of one page's grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [KeyState; SLOT_COUNT],
}

impl Keypad {
    /// Feed the current touch (if any) to every key.
    pub fn update(&mut self, touch: Option<Point>) {
        for (slot, key) in self.keys.iter_mut().enumerate() {
            key.press(touch.is_some_and(|point| key_rect(slot).contains(point)));
        }
    }

    /// Adopt the current touch without producing edges.
    pub fn sync(&mut self, touch: Option<Point>) {
        self.update(touch);
        self.update(touch);
    }

    pub fn key(&self, slot: usize) -> KeyState {
        self.keys.get(slot).copied().unwrap_or_default()
    }
}
