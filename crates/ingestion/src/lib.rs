//! # Ingestion
//!
//! Rower event ingestion.
//!
//! Responsibilities:
//! - Register the rower's `EventSource` (hardware adapter or mock)
//! - Move events from the source thread into the async world via a bounded channel
//! - Backpressure accounting (drop newest when full)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{BackpressureConfig, EventIngestion, MockRower};
//!
//! let source = Arc::new(MockRower::new(MockRowerConfig::default()));
//! let mut ingestion = EventIngestion::new(source, BackpressureConfig::default());
//! let rx = ingestion.take_receiver().unwrap();
//! ingestion.start()?;
//! while let Ok(event) = rx.recv().await {
//!     engine.push(&event, ingestion::wall_clock_ms());
//! }
//! ```

mod clock;
mod config;
mod error;
mod event_ingestion;
mod mock;

pub use clock::wall_clock_ms;
pub use config::{BackpressureConfig, IngestionMetrics, IngestionMetricsSnapshot};
pub use contracts::{EventSource, RowerEvent};
pub use error::{IngestionError, Result};
pub use event_ingestion::EventIngestion;
pub use mock::{MockRower, MockRowerConfig};
