//! OutputPublisher - per-tick fan-out to the three consumers

use tracing::{debug, info, instrument};

use contracts::{BridgeBlueprint, BrokerConfig, MetricsSnapshot, SinkConfig, SinkType, TimestampMs};

use crate::error::PublisherError;
use crate::handle::SinkHandle;
use crate::metrics::SinkMetricsSnapshot;
use crate::sinks::{LogSink, MqttSink, UdpSink};
use crate::throttle::BrokerThrottle;

/// What happened to the broker lane in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerDelivery {
    /// Queued for the broker
    Sent,
    /// Within the publish interval, skipped
    Throttled,
    /// Broker queue full or worker gone
    Dropped,
    /// No broker configured
    Disabled,
}

/// Result of [`OutputPublisher::publish_tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDelivery {
    pub peripheral: bool,
    pub sensor_network: bool,
    pub broker: BrokerDelivery,
}

struct BrokerLane {
    handle: SinkHandle,
    throttle: BrokerThrottle,
}

/// Distributes each tick's snapshot to the peripheral, sensor-network and broker sinks
pub struct OutputPublisher {
    peripheral: SinkHandle,
    sensor_network: SinkHandle,
    broker: Option<BrokerLane>,
}

impl OutputPublisher {
    /// Create a publisher with prepared sink handles
    pub fn new(
        peripheral: SinkHandle,
        sensor_network: SinkHandle,
        broker: Option<(SinkHandle, BrokerThrottle)>,
    ) -> Self {
        Self {
            peripheral,
            sensor_network,
            broker: broker.map(|(handle, throttle)| BrokerLane { handle, throttle }),
        }
    }

    /// Build every sink named in the blueprint
    #[instrument(name = "publisher_from_blueprint", skip(blueprint))]
    pub async fn from_blueprint(blueprint: &BridgeBlueprint) -> Result<Self, PublisherError> {
        let peripheral = create_sink_handle(&blueprint.peripheral).await?;
        let sensor_network = create_sink_handle(&blueprint.sensor_network).await?;
        let broker = blueprint.broker.as_ref().map(create_broker_lane);

        info!(
            peripheral = %peripheral.name(),
            sensor_network = %sensor_network.name(),
            broker = broker.is_some(),
            "Output publisher ready"
        );

        Ok(Self::new(peripheral, sensor_network, broker))
    }

    /// Deliver the tick's snapshot
    ///
    /// Peripheral and sensor network always get it; the broker only when its
    /// throttle allows. Never blocks and never fails.
    pub fn publish_tick(&mut self, snapshot: MetricsSnapshot, now_ms: TimestampMs) -> TickDelivery {
        let peripheral = self.peripheral.try_send(snapshot);
        let sensor_network = self.sensor_network.try_send(snapshot);

        let broker = match self.broker.as_mut() {
            None => BrokerDelivery::Disabled,
            Some(lane) if !lane.throttle.ready(now_ms) => {
                observability::record_broker_throttled();
                BrokerDelivery::Throttled
            }
            Some(lane) => {
                if lane.handle.try_send(snapshot) {
                    lane.throttle.mark(now_ms);
                    BrokerDelivery::Sent
                } else {
                    BrokerDelivery::Dropped
                }
            }
        };

        TickDelivery {
            peripheral,
            sensor_network,
            broker,
        }
    }

    pub fn has_broker(&self) -> bool {
        self.broker.is_some()
    }

    /// Counters of every sink, peripheral first
    pub fn metrics(&self) -> Vec<(String, SinkMetricsSnapshot)> {
        let mut handles = vec![&self.peripheral, &self.sensor_network];
        if let Some(lane) = &self.broker {
            handles.push(&lane.handle);
        }
        handles
            .into_iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Drain and close every sink
    #[instrument(name = "publisher_shutdown", skip(self))]
    pub async fn shutdown(self) {
        self.peripheral.shutdown().await;
        self.sensor_network.shutdown().await;
        if let Some(lane) = self.broker {
            lane.handle.shutdown().await;
        }
        debug!("Output publisher shut down");
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "publisher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, PublisherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Udp => {
            let sink = UdpSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| PublisherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

fn create_broker_lane(config: &BrokerConfig) -> (SinkHandle, BrokerThrottle) {
    let sink = MqttSink::connect("broker", config);
    (
        SinkHandle::spawn(sink, config.queue_capacity),
        BrokerThrottle::new(config.publish_interval_ms),
    )
}
