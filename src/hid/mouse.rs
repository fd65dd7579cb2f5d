//! USB HID mouse report with horizontal pan.
//!
//! Layout (5 bytes):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, positive = away from the user)
//! Byte 4: AC Pan        (signed, positive = right)
//! ```

pub const MOUSE_REPORT_SIZE: usize = 5;

/// Buttons a mouse action can click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// [`MouseButton`] flags.
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
    pub pan: i8,
}

impl MouseReport {
    /// No buttons, no movement.
    pub const fn empty() -> Self {
        Self {
            buttons: 0,
            x: 0,
            y: 0,
            wheel: 0,
            pan: 0,
        }
    }

    pub const fn motion(x: i8, y: i8) -> Self {
        Self { x, y, ..Self::empty() }
    }

    pub const fn scroll(wheel: i8, pan: i8) -> Self {
        Self { wheel, pan, ..Self::empty() }
    }

    pub const fn pressed(button: MouseButton) -> Self {
        Self {
            buttons: button as u8,
            ..Self::empty()
        }
    }

    /// Returns bytes written, 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MOUSE_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.buttons;
        buf[1] = self.x as u8;
        buf[2] = self.y as u8;
        buf[3] = self.wheel as u8;
        buf[4] = self.pan as u8;
        MOUSE_REPORT_SIZE
    }
}
