//! Flywheel pulse tracking and standstill detection.

use contracts::TimestampMs;

/// Edge reported by [`PulseDetector::observe_tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseTransition {
    /// Pulses resumed within the timeout
    Started,
    /// Pulse gap exceeded the timeout
    Stopped,
}

/// Decides whether the paddle is turning from the age of the last pulse
#[derive(Debug, Clone)]
pub struct PulseDetector {
    timeout_ms: u64,
    last_pulse_at_ms: TimestampMs,
    turning: bool,
}

impl PulseDetector {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_pulse_at_ms: 0,
            turning: false,
        }
    }

    /// Remember the time of a flywheel pulse
    pub fn observe_pulse(&mut self, at_ms: TimestampMs) {
        self.last_pulse_at_ms = at_ms;
    }

    /// Re-evaluate the turning flag at `now_ms`
    ///
    /// Returns the edge if the flag changed. On `Stopped` the last pulse time
    /// is cleared to 0.
    pub fn observe_tick(&mut self, now_ms: TimestampMs) -> Option<PulseTransition> {
        let delta = now_ms.saturating_sub(self.last_pulse_at_ms);
        let turning = delta <= self.timeout_ms;

        match (self.turning, turning) {
            (false, true) => {
                self.turning = true;
                Some(PulseTransition::Started)
            }
            (true, false) => {
                self.turning = false;
                self.last_pulse_at_ms = 0;
                Some(PulseTransition::Stopped)
            }
            _ => None,
        }
    }

    pub fn is_turning(&self) -> bool {
        self.turning
    }

    pub fn last_pulse_at_ms(&self) -> TimestampMs {
        self.last_pulse_at_ms
    }

    pub fn reset(&mut self) {
        self.last_pulse_at_ms = 0;
        self.turning = false;
    }
}
