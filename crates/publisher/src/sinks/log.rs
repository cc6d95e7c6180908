//! LogSink - logs each snapshot via tracing

use contracts::{ContractError, MetricsSnapshot, SnapshotSink};
use tracing::{info, instrument};

/// Sink that logs snapshots, for bench setups without the real peripheral
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SnapshotSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, snapshot), fields(sink = %self.name))]
    async fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            stroke_rate = snapshot.stroke_rate,
            watts = snapshot.watts,
            pace = snapshot.instantaneous_pace,
            distance_m = snapshot.total_distance_m,
            heart_rate = snapshot.heart_rate,
            elapsed_s = snapshot.elapsed_time_seconds,
            "Snapshot"
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
