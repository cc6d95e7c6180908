//! Telemetry engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Telemetry engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Bridge loop period (ms)
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,

    /// Maximum gap between flywheel pulses that still counts as rowing (ms)
    #[serde(default = "default_pulse_timeout_ms")]
    #[validate(range(min = 1))]
    pub pulse_timeout_ms: u64,

    /// Number of completed strokes averaged into the smoothed power
    #[serde(default = "default_power_window_strokes")]
    #[validate(range(min = 1))]
    pub power_window_strokes: usize,

    /// Age after which an external heart-rate value is ignored (ms)
    #[serde(default = "default_heart_rate_override_ttl_ms")]
    #[validate(range(min = 1))]
    pub heart_rate_override_ttl_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            pulse_timeout_ms: default_pulse_timeout_ms(),
            power_window_strokes: default_power_window_strokes(),
            heart_rate_override_ttl_ms: default_heart_rate_override_ttl_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_pulse_timeout_ms() -> u64 {
    300
}

fn default_power_window_strokes() -> usize {
    4
}

fn default_heart_rate_override_ttl_ms() -> u64 {
    30_000
}
