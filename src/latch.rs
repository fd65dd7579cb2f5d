//! Persistent latch (toggle) state for menu and settings buttons.
//!
//! Layout of the flat table:
//!   - indices 0..25: menu N slot S at `(N - 1) * 5 + S`
//!   - indices 25..30: settings slot S at `25 + S` (28 = sleep enabled)
//!
//! The table is written out through a [`LatchStore`] before the device
//! sleeps and read back on boot, one byte per slot.

use crate::config::{LATCH_SLOTS, SETTINGS_LATCH_BASE};
use crate::error::Error;

/// Buttons per menu page that can latch (slot 5 is the back button).
const LATCHABLE_PER_PAGE: usize = 5;

/// Backing storage for the serialised table (NVS, flash, a file...).
pub trait LatchStore {
    /// Fill `buf` with the stored table. `Ok(false)` if nothing was stored yet.
    fn load(&mut self, buf: &mut [u8; LATCH_SLOTS]) -> Result<bool, Error>;

    fn save(&mut self, data: &[u8; LATCH_SLOTS]) -> Result<(), Error>;
}

/// Latch table with a dirty flag tracking divergence from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LatchRegistry {
    slots: [bool; LATCH_SLOTS],
    dirty: bool,
}

impl LatchRegistry {
    /// Create an all-released table.
    pub const fn new() -> Self {
        Self {
            slots: [false; LATCH_SLOTS],
            dirty: false,
        }
    }

    /// Index of a menu button (`menu` in 1..=5, `slot` in 0..5).
    pub fn menu_index(menu: u8, slot: usize) -> Option<usize> {
        if !(1..=5).contains(&menu) || slot >= LATCHABLE_PER_PAGE {
            return None;
        }
        Some((usize::from(menu) - 1) * LATCHABLE_PER_PAGE + slot)
    }

    /// Index of a settings-page toggle.
    pub fn settings_index(slot: usize) -> Option<usize> {
        (slot < LATCHABLE_PER_PAGE).then_some(SETTINGS_LATCH_BASE + slot)
    }

    /// Out-of-range indices read as released.
    pub fn get(&self, index: usize) -> bool {
        self.slots.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, latched: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            if *slot != latched {
                *slot = latched;
                self.dirty = true;
            }
        }
    }

    /// Flip a latch and return its new state.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let slot = self.slots.get_mut(index)?;
        *slot ^= true;
        self.dirty = true;
        Some(*slot)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// One byte per slot, 0 or 1.
    pub fn to_bytes(&self) -> [u8; LATCH_SLOTS] {
        self.slots.map(u8::from)
    }

    /// Any non-zero byte counts as latched; missing trailing bytes are released.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut registry = Self::new();
        for (slot, byte) in registry.slots.iter_mut().zip(data) {
            *slot = *byte != 0;
        }
        registry
    }

    /// Replace the table with what `store` holds; keep it if nothing is stored.
    pub fn load_from<S: LatchStore>(&mut self, store: &mut S) -> Result<(), Error> {
        let mut buf = [0u8; LATCH_SLOTS];
        match store.load(&mut buf) {
            Ok(true) => {
                *self = Self::from_bytes(&buf);
                info!("Latches: restored {} active", self.slots.iter().filter(|&&l| l).count());
                Ok(())
            }
            Ok(false) => {
                info!("Latches: nothing stored yet");
                Ok(())
            }
            Err(e) => {
                warn!("Latches: load failed");
                Err(e)
            }
        }
    }

    pub fn save_to<S: LatchStore>(&mut self, store: &mut S) -> Result<(), Error> {
        store.save(&self.to_bytes()).inspect_err(|_| warn!("Latches: save failed"))?;
        self.dirty = false;
        info!("Latches: saved");
        Ok(())
    }
}

impl Default for LatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
