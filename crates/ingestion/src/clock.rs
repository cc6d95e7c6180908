//! Shared wall clock.

use contracts::TimestampMs;

/// Milliseconds since the Unix epoch
///
/// Event sources stamp events with this clock and the bridge loop passes it
/// as `now_ms`, so pulse ages are comparable.
pub fn wall_clock_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis().max(0) as TimestampMs
}
