//! RowerEvent - Event Source output
//!
//! Typed hardware events as decoded by the rower's serial adapter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::TimestampMs;

/// Event kind
///
/// Open enumeration: kinds the firmware adds later arrive as [`EventKind::Other`]
/// and are ignored by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    StrokeStart,
    StrokeEnd,
    /// Strokes per minute, reported in half-cycles
    StrokeRate,
    TotalStrokes,
    TotalDistanceM,
    /// Average speed in cm/s
    AvgDistanceCmps,
    Watts,
    /// Cumulative energy in calories
    TotalKcal,
    TotalKcalH,
    TotalKcalMin,
    HeartRate,
    DisplaySec,
    DisplayMin,
    DisplayHr,
    /// Flywheel pulse
    Pulse,
    Reset,
    Graph,
    TankVolume,
    DisplaySecDec,
    Other(String),
}

impl EventKind {
    /// Parse a wire name (`"stroke_start"`, `"total_kcal_h"`, ...)
    pub fn from_name(name: &str) -> Self {
        match name {
            "stroke_start" => Self::StrokeStart,
            "stroke_end" => Self::StrokeEnd,
            "stroke_rate" => Self::StrokeRate,
            "total_strokes" => Self::TotalStrokes,
            "total_distance_m" => Self::TotalDistanceM,
            "avg_distance_cmps" => Self::AvgDistanceCmps,
            "watts" => Self::Watts,
            "total_kcal" => Self::TotalKcal,
            "total_kcal_h" => Self::TotalKcalH,
            "total_kcal_min" => Self::TotalKcalMin,
            "heart_rate" => Self::HeartRate,
            "display_sec" => Self::DisplaySec,
            "display_min" => Self::DisplayMin,
            "display_hr" => Self::DisplayHr,
            "pulse" => Self::Pulse,
            "reset" => Self::Reset,
            "graph" => Self::Graph,
            "tank_volume" => Self::TankVolume,
            "display_sec_dec" => Self::DisplaySecDec,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of this kind
    pub fn name(&self) -> &str {
        match self {
            Self::StrokeStart => "stroke_start",
            Self::StrokeEnd => "stroke_end",
            Self::StrokeRate => "stroke_rate",
            Self::TotalStrokes => "total_strokes",
            Self::TotalDistanceM => "total_distance_m",
            Self::AvgDistanceCmps => "avg_distance_cmps",
            Self::Watts => "watts",
            Self::TotalKcal => "total_kcal",
            Self::TotalKcalH => "total_kcal_h",
            Self::TotalKcalMin => "total_kcal_min",
            Self::HeartRate => "heart_rate",
            Self::DisplaySec => "display_sec",
            Self::DisplayMin => "display_min",
            Self::DisplayHr => "display_hr",
            Self::Pulse => "pulse",
            Self::Reset => "reset",
            Self::Graph => "graph",
            Self::TankVolume => "tank_volume",
            Self::DisplaySecDec => "display_sec_dec",
            Self::Other(name) => name,
        }
    }

    /// Kinds the classifier skips without any side effect
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Graph | Self::TankVolume | Self::DisplaySecDec)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Hardware event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowerEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Numeric payload, absent for pure markers
    #[serde(default)]
    pub value: Option<f64>,

    /// Source timestamp (ms)
    #[serde(default)]
    pub at: Option<TimestampMs>,
}

impl RowerEvent {
    /// Create an event without payload or timestamp
    pub fn marker(kind: EventKind) -> Self {
        Self {
            kind,
            value: None,
            at: None,
        }
    }

    /// Create an event carrying a value
    pub fn with_value(kind: EventKind, value: f64) -> Self {
        Self {
            kind,
            value: Some(value),
            at: None,
        }
    }

    /// Create a pulse event stamped at `at`
    pub fn pulse(at: TimestampMs) -> Self {
        Self {
            kind: EventKind::Pulse,
            value: None,
            at: Some(at),
        }
    }

    /// Stamp the event with a source timestamp
    pub fn at(mut self, at: TimestampMs) -> Self {
        self.at = Some(at);
        self
    }

    /// Numeric payload, zero when absent
    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }
}
