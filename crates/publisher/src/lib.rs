//! # Publisher
//!
//! Snapshot distribution.
//!
//! Responsible for:
//! - Delivering each tick's `MetricsSnapshot` to the peripheral and sensor-network sinks
//! - Throttling the broker sink
//! - Isolating slow sinks so they never block the bridge loop

pub mod backoff;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod publisher;
pub mod sinks;
pub mod throttle;

pub use backoff::ReconnectBackoff;
pub use contracts::{MetricsSnapshot, SnapshotSink};
pub use error::PublisherError;
pub use handle::SinkHandle;
pub use metrics::{SinkMetrics, SinkMetricsSnapshot};
pub use publisher::{create_sink_handle, BrokerDelivery, OutputPublisher, TickDelivery};
pub use sinks::{ChannelSink, LogSink, MqttSink, UdpSink};
pub use throttle::BrokerThrottle;
