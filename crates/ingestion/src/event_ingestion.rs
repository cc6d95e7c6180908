//! Event source to async channel bridge
//!
//! The source calls back from its own thread; the callback only `try_send`s
//! into a bounded `async_channel`, so a stalled bridge loop costs dropped
//! events, never a blocked serial reader.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{EventCallback, EventSource, RowerEvent};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};

/// Owns the event source and the channel its events land in
pub struct EventIngestion {
    source: Arc<dyn EventSource>,
    metrics: Arc<IngestionMetrics>,
    tx: Sender<RowerEvent>,
    rx: Option<Receiver<RowerEvent>>,
    listening: Arc<AtomicBool>,
}

impl EventIngestion {
    pub fn new(source: Arc<dyn EventSource>, config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));
        Self {
            source,
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take the receiving end (only once)
    pub fn take_receiver(&mut self) -> Result<Receiver<RowerEvent>> {
        self.rx.take().ok_or(IngestionError::ReceiverTaken)
    }

    /// Register the callback with the source
    #[instrument(name = "ingestion_start", skip(self), fields(source = %self.source.name()))]
    pub fn start(&self) -> Result<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyListening {
                source_name: self.source.name().to_string(),
            });
        }

        let tx = self.tx.clone();
        let metrics = Arc::clone(&self.metrics);
        let listening = Arc::clone(&self.listening);
        let source_name = self.source.name().to_string();

        let callback: EventCallback = Arc::new(move |event| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            metrics.record_received();
            forward_event(&tx, event, &metrics, &source_name);
        });

        self.source.listen(callback);
        info!(source = %self.source.name(), "Event ingestion started");
        Ok(())
    }

    /// Ask the device to reset
    pub fn request_reset(&self) -> Result<()> {
        if !self.is_listening() {
            return Err(IngestionError::NotListening {
                source_name: self.source.name().to_string(),
            });
        }
        self.source.request_reset()?;
        debug!(source = %self.source.name(), "Device reset requested");
        Ok(())
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.source.stop();
            info!(source = %self.source.name(), "Event ingestion stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }
}

fn forward_event(
    tx: &Sender<RowerEvent>,
    event: RowerEvent,
    metrics: &IngestionMetrics,
    source_name: &str,
) {
    match tx.try_send(event) {
        Ok(()) => {
            metrics.update_queue_len(tx.len());
            trace!(source = %source_name, "event queued");
        }
        Err(TrySendError::Full(event)) => {
            metrics.record_dropped();
            trace!(source = %source_name, kind = %event.kind, "event dropped (channel full)");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(source = %source_name, "event channel closed");
        }
    }
}
