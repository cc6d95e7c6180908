//! Bridge metrics
//!
//! Prometheus recorders for the engine/publisher plus an in-memory session
//! aggregator that feeds the end-of-run summary.

use std::collections::HashMap;

use contracts::MetricsSnapshot;
use metrics::{counter, gauge, histogram};

/// What the classifier did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Classified,
    Ignored,
    Unknown,
}

impl EventOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::Ignored => "ignored",
            Self::Unknown => "unknown",
        }
    }
}

/// Record one incoming event
pub fn record_event(kind: &str, outcome: EventOutcome) {
    counter!(
        "rower_bridge_events_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a presentation state change (`reset` / `active` / `standstill`)
pub fn record_state_transition(to: &'static str) {
    counter!("rower_bridge_state_transitions_total", "to" => to).increment(1);
}

/// Record a newly computed smoothed power value
pub fn record_smoothed_power(watts: u32) {
    gauge!("rower_bridge_smoothed_power_watts").set(f64::from(watts));
    histogram!("rower_bridge_smoothed_power_watts_hist").record(f64::from(watts));
}

/// Record the snapshot resolved for this tick
pub fn record_snapshot(state: &'static str, snapshot: &MetricsSnapshot) {
    counter!("rower_bridge_ticks_total", "state" => state).increment(1);
    gauge!("rower_bridge_stroke_rate").set(snapshot.stroke_rate);
    gauge!("rower_bridge_watts").set(f64::from(snapshot.watts));
    gauge!("rower_bridge_heart_rate").set(f64::from(snapshot.heart_rate));
    gauge!("rower_bridge_total_distance_m").set(f64::from(snapshot.total_distance_m));
}

/// Record a snapshot handed to a sink
pub fn record_snapshot_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "rower_bridge_snapshots_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record a broker publish skipped by the throttle
pub fn record_broker_throttled() {
    counter!("rower_bridge_broker_throttled_total").increment(1);
}

/// Record a broker reconnect attempt and the delay that preceded it
pub fn record_broker_reconnect(delay_ms: u64) {
    counter!("rower_bridge_broker_reconnects_total").increment(1);
    histogram!("rower_bridge_broker_reconnect_delay_ms").record(delay_ms as f64);
}

/// Session aggregator
///
/// Aggregated in memory, one update per tick, for the run summary.
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// Ticks observed
    pub total_ticks: u64,

    /// Ticks per presentation state
    pub state_ticks: HashMap<&'static str, u64>,

    /// Power over active ticks
    pub watts_stats: RunningStats,

    /// Stroke rate over active ticks
    pub stroke_rate_stats: RunningStats,

    /// Heart rate over ticks where one was known
    pub heart_rate_stats: RunningStats,

    /// Last snapshot seen
    pub last_snapshot: MetricsSnapshot,
}

impl SessionMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one resolved snapshot into the session
    pub fn update(&mut self, state: &'static str, snapshot: &MetricsSnapshot) {
        self.total_ticks += 1;
        *self.state_ticks.entry(state).or_insert(0) += 1;

        if state == "active" {
            self.watts_stats.push(f64::from(snapshot.watts));
            self.stroke_rate_stats.push(snapshot.stroke_rate);
        }
        if snapshot.heart_rate > 0 {
            self.heart_rate_stats.push(f64::from(snapshot.heart_rate));
        }
        self.last_snapshot = *snapshot;
    }

    pub fn summary(&self) -> SessionSummary {
        let active = self.state_ticks.get("active").copied().unwrap_or(0);
        SessionSummary {
            total_ticks: self.total_ticks,
            state_ticks: self.state_ticks.clone(),
            active_ratio: if self.total_ticks > 0 {
                active as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            watts: StatsSummary::from(&self.watts_stats),
            stroke_rate: StatsSummary::from(&self.stroke_rate_stats),
            heart_rate: StatsSummary::from(&self.heart_rate_stats),
            total_distance_m: self.last_snapshot.total_distance_m,
            total_strokes: self.last_snapshot.total_strokes,
            elapsed_time_seconds: self.last_snapshot.elapsed_time_seconds,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Session summary
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_ticks: u64,
    pub state_ticks: HashMap<&'static str, u64>,
    pub active_ratio: f64,
    pub watts: StatsSummary,
    pub stroke_rate: StatsSummary,
    pub heart_rate: StatsSummary,
    pub total_distance_m: u32,
    pub total_strokes: u32,
    pub elapsed_time_seconds: u32,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Ticks: {} ({:.2}% active)", self.total_ticks, self.active_ratio)?;
        writeln!(f, "Distance: {} m", self.total_distance_m)?;
        writeln!(f, "Strokes: {}", self.total_strokes)?;
        writeln!(f, "Elapsed: {} s", self.elapsed_time_seconds)?;
        writeln!(f, "Power (W): {}", self.watts)?;
        writeln!(f, "Stroke rate: {}", self.stroke_rate)?;
        writeln!(f, "Heart rate: {}", self.heart_rate)?;
        Ok(())
    }
}

/// Stats summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
