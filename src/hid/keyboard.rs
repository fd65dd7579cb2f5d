//! USB HID keyboard report (boot protocol compatible).
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```

use super::keys::Modifier;

pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Held keyboard state as sent to the host.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// [`Modifier::bit`] flags.
    pub modifier: u8,
    /// Always 0 in the boot protocol.
    pub reserved: u8,
    /// Held usages; free slots are 0.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Everything released.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Returns bytes written, 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Add a usage to the first free slot. Returns `false` when all six
    /// slots are taken; a usage already held is left as is.
    pub fn press_usage(&mut self, usage: u8) -> bool {
        if usage == 0 || self.keycodes.contains(&usage) {
            return true;
        }
        match self.keycodes.iter_mut().find(|k| **k == 0) {
            Some(slot) => {
                *slot = usage;
                true
            }
            None => false,
        }
    }

    pub fn release_usage(&mut self, usage: u8) {
        for slot in self.keycodes.iter_mut().filter(|k| **k == usage) {
            *slot = 0;
        }
    }

    pub fn press_modifier(&mut self, modifier: Modifier) {
        self.modifier |= modifier.bit();
    }

    pub fn release_modifier(&mut self, modifier: Modifier) {
        self.modifier &= !modifier.bit();
    }
}
