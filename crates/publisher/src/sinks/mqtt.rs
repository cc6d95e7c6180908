//! MqttSink - JSON snapshots to a broker topic over a persistent connection

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{BrokerConfig, ContractError, MetricsSnapshot, SnapshotSink};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::backoff::ReconnectBackoff;

/// Pending requests rumqttc buffers while the connection is down
const REQUEST_CAPACITY: usize = 16;

/// Broker sink
///
/// The connection is driven by a background task that owns the rumqttc
/// event loop and reconnects with bounded exponential backoff.
pub struct MqttSink {
    name: String,
    topic: String,
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
}

impl MqttSink {
    /// Open the broker connection
    ///
    /// Returns immediately; the first ConnAck arrives on the event-loop task.
    #[instrument(
        name = "mqtt_sink_connect",
        skip(name, config),
        fields(host = %config.host, port = config.port, topic = %config.topic)
    )]
    pub fn connect(name: impl Into<String>, config: &BrokerConfig) -> Self {
        let name = name.into();

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let backoff = ReconnectBackoff::from_millis(
            config.reconnect.initial_backoff_ms,
            config.reconnect.max_backoff_ms,
        );

        let task_connected = Arc::clone(&connected);
        let task_name = name.clone();
        let event_loop = tokio::spawn(async move {
            drive_event_loop(eventloop, task_connected, backoff, task_name).await;
        });

        info!(sink = %name, host = %config.host, port = config.port, "MqttSink connecting");

        Self {
            name,
            topic: config.topic.clone(),
            client,
            connected,
            event_loop: Some(event_loop),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl SnapshotSink for MqttSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "mqtt_sink_write", skip(self, snapshot), fields(sink = %self.name))]
    async fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), ContractError> {
        if !self.is_connected() {
            return Err(ContractError::sink_connection(
                &self.name,
                "broker not connected",
            ));
        }

        let payload = serde_json::to_vec(snapshot)
            .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))?;

        self.client
            .try_publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        debug!(sink = %self.name, topic = %self.topic, "Published");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "mqtt_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.is_connected() {
            if let Err(e) = self.client.disconnect().await {
                warn!(sink = %self.name, error = %e, "Broker disconnect failed");
            }
        }
        if let Some(task) = self.event_loop.take() {
            task.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
        info!(sink = %self.name, "MqttSink closed");
        Ok(())
    }
}

#[instrument(name = "mqtt_event_loop", skip(eventloop, connected, backoff), fields(sink = %name))]
async fn drive_event_loop(
    mut eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    mut backoff: ReconnectBackoff,
    name: String,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                connected.store(true, Ordering::Relaxed);
                backoff.reset();
                info!(sink = %name, code = ?ack.code, "Broker connected");
            }
            Ok(_) => {}
            Err(e) => {
                connected.store(false, Ordering::Relaxed);
                let delay = backoff.next_delay();
                let delay_ms = delay.as_millis() as u64;
                warn!(sink = %name, error = %e, delay_ms, "Broker connection lost, retrying");
                observability::record_broker_reconnect(delay_ms);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
