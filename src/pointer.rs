//! Gyro-driven mouse pointer, active while its menu page is open.

use crate::config::MOTION_SENSITIVITY;
use crate::hid::HidTransport;

/// Raw angular rate sample from the motion sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GyroSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Pointer step for a sample: yaw moves horizontally (inverted), pitch vertically.
pub fn motion_delta(sample: GyroSample) -> (i8, i8) {
    let dx = -(i32::from(sample.z) / i32::from(MOTION_SENSITIVITY));
    let dy = i32::from(sample.y) / i32::from(MOTION_SENSITIVITY);
    (clamp_i8(dx), clamp_i8(dy))
}

fn clamp_i8(v: i32) -> i8 {
    v.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionPointer {
    armed: bool,
}

impl MotionPointer {
    pub fn arm(&mut self) {
        if !self.armed {
            info!("Motion pointer armed");
        }
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        if self.armed {
            info!("Motion pointer disarmed");
        }
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Move the host pointer for one sample. Returns `true` if a move was sent.
    pub fn update<H: HidTransport>(&self, hid: &mut H, sample: GyroSample) -> bool {
        if !self.armed || !hid.is_connected() {
            return false;
        }
        let (dx, dy) = motion_delta(sample);
        if dx == 0 && dy == 0 {
            return false;
        }
        hid.mouse_move(dx, dy);
        true
    }
}
