//! # Integration Tests
//!
//! Cross-crate tests for the rower bridge.
//!
//! Covers:
//! - Config round trips through the loader
//! - Mock e2e runs: mock rower -> ingestion -> engine -> publisher
//! - Sink delivery over real sockets

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    const BRIDGE_TOML: &str = r#"
[engine]
tick_interval_ms = 100
pulse_timeout_ms = 300

[source]
kind = "mock"
stroke_rate_spm = 28.0

[peripheral]
name = "ble"
sink_type = "udp"
params = { addr = "127.0.0.1:7001" }

[sensor_network]
name = "ant"
sink_type = "log"

[broker]
host = "10.0.20.26"
"#;

    #[test]
    fn test_config_round_trip() {
        let blueprint = ConfigLoader::load_from_str(BRIDGE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.engine.power_window_strokes, 4);

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.engine, blueprint.engine);
        assert_eq!(reloaded.peripheral.params, blueprint.peripheral.params);

        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        let broker = from_json.broker.unwrap();
        assert_eq!(broker.host, "10.0.20.26");
        assert_eq!(broker.publish_interval_ms, 1000);
    }

    #[test]
    fn test_credentials_not_serialized() {
        let mut blueprint = ConfigLoader::load_from_str(BRIDGE_TOML, ConfigFormat::Toml).unwrap();
        if let Some(broker) = blueprint.broker.as_mut() {
            broker.username = Some("rower".into());
            broker.password = Some("secret".into());
        }
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        assert!(!toml.contains("secret"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        EngineConfig, MetricsSnapshot, RowerCommand, RowerEvent, SinkConfig, SinkType,
    };
    use ingestion::{
        wall_clock_ms, BackpressureConfig, EventIngestion, MockRower, MockRowerConfig,
    };
    use publisher::{
        create_sink_handle, BrokerDelivery, BrokerThrottle, ChannelSink, OutputPublisher,
        SinkHandle,
    };
    use telemetry_engine::{CommandOutcome, PresentationState, TelemetryEngine};
    use tokio::sync::mpsc;

    struct Harness {
        rower: Arc<MockRower>,
        ingestion: EventIngestion,
        events: async_channel::Receiver<RowerEvent>,
        engine: TelemetryEngine,
        publisher: OutputPublisher,
        peripheral_rx: mpsc::Receiver<MetricsSnapshot>,
        sensor_rx: mpsc::Receiver<MetricsSnapshot>,
    }

    fn channel_handle(name: &str) -> (SinkHandle, mpsc::Receiver<MetricsSnapshot>) {
        let (sink, rx) = ChannelSink::pair(name, 256);
        (SinkHandle::spawn(sink, 256), rx)
    }

    fn harness() -> Harness {
        let rower = Arc::new(MockRower::new(MockRowerConfig {
            stroke_rate_spm: 30.0,
            peak_watts: 200.0,
            pulse_interval_ms: 20,
            ..Default::default()
        }));
        let mut ingestion = EventIngestion::new(rower.clone(), BackpressureConfig::new(1024));
        let events = ingestion.take_receiver().unwrap();

        let (peripheral, peripheral_rx) = channel_handle("peripheral");
        let (sensor_network, sensor_rx) = channel_handle("sensor_network");

        Harness {
            rower,
            ingestion,
            events,
            engine: TelemetryEngine::new(EngineConfig {
                tick_interval_ms: 50,
                pulse_timeout_ms: 150,
                ..Default::default()
            }),
            publisher: OutputPublisher::new(peripheral, sensor_network, None),
            peripheral_rx,
            sensor_rx,
        }
    }

    impl Harness {
        /// Run the bridge loop for `duration`, returning the last snapshot
        async fn run_for(&mut self, duration: Duration) -> MetricsSnapshot {
            let mut ticker = tokio::time::interval(Duration::from_millis(50));
            let deadline = tokio::time::sleep(duration);
            tokio::pin!(deadline);
            let mut last = MetricsSnapshot::ZERO;

            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    Ok(event) = self.events.recv() => {
                        self.engine.push(&event, wall_clock_ms());
                    }
                    _ = ticker.tick() => {
                        let now = wall_clock_ms();
                        self.engine.tick(now);
                        last = self.engine.resolve(now);
                        let delivery = self.publisher.publish_tick(last, now);
                        assert!(delivery.peripheral && delivery.sensor_network);
                        assert_eq!(delivery.broker, BrokerDelivery::Disabled);
                    }
                }
            }
            last
        }
    }

    /// Mock rower -> ingestion -> engine -> publisher, through active and standstill
    #[tokio::test]
    async fn test_e2e_active_then_standstill() {
        let mut h = harness();
        h.ingestion.start().unwrap();

        let active = h.run_for(Duration::from_millis(2500)).await;
        assert_eq!(h.engine.state(), PresentationState::Active);
        assert!(active.total_strokes > 0, "strokes should accumulate");
        assert!(active.total_distance_m > 0);
        assert!(active.elapsed_time_seconds >= 1);

        h.rower.pause();
        let still = h.run_for(Duration::from_millis(600)).await;
        assert_eq!(h.engine.state(), PresentationState::Standstill);
        assert_eq!(still.stroke_rate, 0.0);
        assert_eq!(still.watts, 0);
        assert_eq!(still.speed, 0.0);
        assert!(still.total_strokes >= active.total_strokes);
        assert!(still.total_distance_m >= active.total_distance_m);

        h.ingestion.stop();
        let metrics = h.publisher.metrics();
        h.publisher.shutdown().await;

        let mut delivered = 0;
        while h.peripheral_rx.try_recv().is_ok() {
            delivered += 1;
        }
        assert!(delivered > 10);
        assert!(h.sensor_rx.try_recv().is_ok());
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|(_, m)| m.dropped_count == 0));
    }

    /// Reset command reaches the device and the engine returns to zero
    #[tokio::test]
    async fn test_e2e_reset_command() {
        let mut h = harness();
        h.ingestion.start().unwrap();
        h.run_for(Duration::from_millis(1200)).await;
        assert!(h.engine.live().total_strokes > 0);

        let now = wall_clock_ms();
        assert_eq!(
            h.engine.apply_command(RowerCommand::SetHeartRate(120), now),
            CommandOutcome::HeartRateUpdated(120)
        );
        assert_eq!(
            h.engine.apply_command(RowerCommand::ResetDevice, now),
            CommandOutcome::DeviceResetRequested
        );
        h.ingestion.request_reset().unwrap();
        h.rower.pause();

        // reset event is emitted even while paused
        let snapshot = h.run_for(Duration::from_millis(300)).await;
        assert_eq!(h.engine.state(), PresentationState::Reset);
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                heart_rate: 120,
                ..MetricsSnapshot::ZERO
            }
        );

        h.ingestion.stop();
        h.publisher.shutdown().await;
    }

    /// Broker lane only publishes once per interval
    #[tokio::test]
    async fn test_broker_throttle_through_publisher() {
        let (peripheral, _p_rx) = channel_handle("peripheral");
        let (sensor_network, _s_rx) = channel_handle("sensor_network");
        let (broker, mut broker_rx) = channel_handle("broker");
        let mut publisher = OutputPublisher::new(
            peripheral,
            sensor_network,
            Some((broker, BrokerThrottle::new(1000))),
        );

        let mut sent = Vec::new();
        for tick in 0..=20u64 {
            let now = tick * 100;
            let snapshot = MetricsSnapshot {
                elapsed_time_seconds: tick as u32,
                ..MetricsSnapshot::ZERO
            };
            if publisher.publish_tick(snapshot, now).broker == BrokerDelivery::Sent {
                sent.push(now);
            }
        }
        assert_eq!(sent, vec![0, 1000, 2000]);

        publisher.shutdown().await;
        let mut received = Vec::new();
        while let Ok(snapshot) = broker_rx.try_recv() {
            received.push(snapshot.elapsed_time_seconds);
        }
        assert_eq!(received, vec![0, 10, 20]);
    }

    /// UDP sink built from config delivers JSON datagrams
    #[tokio::test]
    async fn test_udp_sink_delivery() {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let config = SinkConfig {
            name: "ble".to_string(),
            sink_type: SinkType::Udp,
            queue_capacity: 8,
            params: HashMap::from([("addr".to_string(), addr.to_string())]),
        };
        let handle = create_sink_handle(&config).await.unwrap();

        let snapshot = MetricsSnapshot {
            stroke_rate: 24.0,
            total_strokes: 12,
            watts: 130,
            heart_rate: 96,
            ..MetricsSnapshot::ZERO
        };
        assert!(handle.try_send(snapshot));

        let mut buf = vec![0u8; 2048];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let received: MetricsSnapshot = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(received, snapshot);

        handle.shutdown().await;
    }
}
