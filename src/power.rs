//! Inactivity tracking and the auto-sleep decision.
//!
//! The timer only measures; the state machine decides whether the current
//! page allows sleeping and performs the shutdown sequence.

/// Whether the device should go to sleep now.
///
/// Sleeps only when enabled and strictly past the timeout.
pub fn sleep_due(enabled: bool, idle_ms: u64, timeout_ms: u64) -> bool {
    enabled && idle_ms > timeout_ms
}

/// Tracks the last user activity against a millisecond clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepTimer {
    last_activity_ms: u64,
    interval_ms: u64,
}

impl SleepTimer {
    pub const fn new(now_ms: u64, interval_ms: u64) -> Self {
        Self {
            last_activity_ms: now_ms,
            interval_ms,
        }
    }

    /// Record activity (touch).
    pub fn activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
    }

    /// Change the timeout, e.g. after sleep is re-enabled.
    pub fn set_interval(&mut self, interval_ms: u64) {
        if interval_ms != self.interval_ms {
            info!("Power: sleep interval {} ms", interval_ms);
        }
        self.interval_ms = interval_ms;
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    /// Periodic check, call once per loop iteration.
    pub fn expired(&self, enabled: bool, now_ms: u64) -> bool {
        sleep_due(enabled, self.idle_ms(now_ms), self.interval_ms)
    }
}
