//! Media keys on the Consumer page (0x0C).
//!
//! The report carries a single little-endian usage; holding two media keys
//! at once is not possible.

/// Report body length.
pub const CONSUMER_REPORT_SIZE: usize = 2;

/// Media actions in configurator order: id 1 is `Mute`, id 7 `PrevTrack`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ConsumerUsage {
    Mute = 0x00E2,
    VolumeDown = 0x00EA,
    VolumeUp = 0x00E9,
    PlayPause = 0x00CD,
    Stop = 0x00B7,
    NextTrack = 0x00B5,
    PrevTrack = 0x00B6,
}

impl ConsumerUsage {
    const BY_MEDIA_ID: [ConsumerUsage; 7] = [
        ConsumerUsage::Mute,
        ConsumerUsage::VolumeDown,
        ConsumerUsage::VolumeUp,
        ConsumerUsage::PlayPause,
        ConsumerUsage::Stop,
        ConsumerUsage::NextTrack,
        ConsumerUsage::PrevTrack,
    ];

    /// Usage for a media action value (1..=7).
    pub fn from_media_id(id: i32) -> Option<Self> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        Self::BY_MEDIA_ID.get(index).copied()
    }

    pub const fn code(self) -> u16 {
        self as u16
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumerReport {
    /// Held usage, 0 when released.
    pub usage: u16,
}

impl ConsumerReport {
    pub const fn empty() -> Self {
        Self { usage: 0 }
    }

    pub const fn new(usage: ConsumerUsage) -> Self {
        Self { usage: usage.code() }
    }

    /// Returns bytes written, 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < CONSUMER_REPORT_SIZE {
            return 0;
        }
        buf[..CONSUMER_REPORT_SIZE].copy_from_slice(&self.usage.to_le_bytes());
        CONSUMER_REPORT_SIZE
    }
}
