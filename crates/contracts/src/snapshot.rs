//! MetricsSnapshot - Snapshot Resolver output
//!
//! The single record delivered to every sink in one tick.

use serde::{Deserialize, Serialize};

/// Resolved rowing metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Strokes per minute
    pub stroke_rate: f64,

    pub total_strokes: u32,

    pub total_distance_m: u32,

    /// Seconds per 500 m
    pub instantaneous_pace: f64,

    /// cm/s
    pub speed: f64,

    /// Smoothed power (W)
    pub watts: u32,

    pub total_kcal: f64,

    pub total_kcal_hour: f64,

    pub total_kcal_min: f64,

    /// Beats per minute
    pub heart_rate: u32,

    pub elapsed_time_seconds: u32,
}

impl MetricsSnapshot {
    /// All-zero snapshot presented after a reset
    pub const ZERO: Self = Self {
        stroke_rate: 0.0,
        total_strokes: 0,
        total_distance_m: 0,
        instantaneous_pace: 0.0,
        speed: 0.0,
        watts: 0,
        total_kcal: 0.0,
        total_kcal_hour: 0.0,
        total_kcal_min: 0.0,
        heart_rate: 0,
        elapsed_time_seconds: 0,
    };

    /// Copy with every instantaneous field forced to zero
    ///
    /// Cumulative fields (strokes, distance, energy, elapsed time) are kept.
    pub fn standstill(&self) -> Self {
        Self {
            stroke_rate: 0.0,
            instantaneous_pace: 0.0,
            heart_rate: 0,
            speed: 0.0,
            watts: 0,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standstill_sanitizes_instantaneous_fields() {
        let live = MetricsSnapshot {
            stroke_rate: 26.0,
            total_strokes: 120,
            total_distance_m: 1450,
            instantaneous_pace: 125.0,
            speed: 400.0,
            watts: 180,
            total_kcal: 42.5,
            heart_rate: 141,
            elapsed_time_seconds: 390,
            ..MetricsSnapshot::default()
        };

        let still = live.standstill();
        assert_eq!(still.stroke_rate, 0.0);
        assert_eq!(still.instantaneous_pace, 0.0);
        assert_eq!(still.speed, 0.0);
        assert_eq!(still.watts, 0);
        assert_eq!(still.heart_rate, 0);
        assert_eq!(still.total_strokes, 120);
        assert_eq!(still.total_distance_m, 1450);
        assert_eq!(still.total_kcal, 42.5);
        assert_eq!(still.elapsed_time_seconds, 390);
    }

    #[test]
    fn test_zero_matches_default() {
        assert_eq!(MetricsSnapshot::ZERO, MetricsSnapshot::default());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(MetricsSnapshot::ZERO).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 11);
        assert!(obj.contains_key("instantaneous_pace"));
        assert!(obj.contains_key("elapsed_time_seconds"));
        assert!(obj.contains_key("total_kcal_hour"));
    }
}
