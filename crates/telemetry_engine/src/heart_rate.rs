//! External heart-rate override.

use contracts::TimestampMs;

/// Heart rate supplied by an operator or external strap
///
/// Only consulted when the rower reports no heart rate of its own.
#[derive(Debug, Clone)]
pub struct HeartRateOverride {
    ttl_ms: u64,
    value: u32,
    observed_at_ms: TimestampMs,
}

impl HeartRateOverride {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            value: 0,
            observed_at_ms: 0,
        }
    }

    /// Store `bpm` observed at `now_ms`
    ///
    /// A value equal to the current one is ignored and does not refresh the
    /// observation time. Returns whether the override changed.
    pub fn set(&mut self, bpm: u32, now_ms: TimestampMs) -> bool {
        if bpm == self.value {
            return false;
        }
        self.value = bpm;
        self.observed_at_ms = now_ms;
        true
    }

    /// Value still usable at `now_ms`
    pub fn current(&self, now_ms: TimestampMs) -> Option<u32> {
        if self.value == 0 {
            return None;
        }
        let age = now_ms.saturating_sub(self.observed_at_ms);
        (age < self.ttl_ms).then_some(self.value)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn observed_at_ms(&self) -> TimestampMs {
        self.observed_at_ms
    }
}
