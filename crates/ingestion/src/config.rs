//! Backpressure configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Backpressure configuration
///
/// When the channel is full the newest event is dropped; the source thread
/// never blocks.
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity
    pub channel_capacity: usize,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Events delivered by the source
    pub events_received: AtomicU64,

    /// Events dropped on a full channel
    pub events_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rower_bridge_ingestion_received_total").increment(1);
    }

    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rower_bridge_ingestion_dropped_total").increment(1);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestionMetricsSnapshot {
        IngestionMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionMetricsSnapshot {
    pub events_received: u64,
    pub events_dropped: u64,
    pub queue_len: usize,
}
