//! ChannelSink - hands snapshots to an in-process consumer

use contracts::{ContractError, MetricsSnapshot, SnapshotSink};
use tokio::sync::mpsc;

/// Sink backed by a tokio channel
///
/// For embedding the bridge in another process, and for tests.
pub struct ChannelSink {
    name: String,
    tx: mpsc::Sender<MetricsSnapshot>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<MetricsSnapshot>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }

    /// Sink plus the receiving end
    pub fn pair(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<MetricsSnapshot>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(name, tx), rx)
    }
}

impl SnapshotSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), ContractError> {
        self.tx
            .send(*snapshot)
            .await
            .map_err(|_| ContractError::sink_write(&self.name, "receiver dropped"))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
