//! SnapshotSink trait - Output Publisher interface
//!
//! Defines the abstract interface for snapshot consumers.

use crate::{ContractError, MetricsSnapshot};

/// Snapshot output trait
///
/// All sink implementations (peripheral, sensor network, broker) must implement this trait.
/// Sinks own encoding into their wire format; they receive the snapshot already resolved.
#[trait_variant::make(SnapshotSink: Send)]
pub trait LocalSnapshotSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one snapshot
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
