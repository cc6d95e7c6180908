//! UdpSink - fire-and-forget JSON datagrams to an external encoder process

use contracts::{ContractError, MetricsSnapshot, SnapshotSink};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument};

/// Configuration for UdpSink
#[derive(Debug, Clone)]
pub struct UdpSinkConfig {
    /// Encoder address
    pub addr: SocketAddr,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl UdpSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let max_packet_size = match params.get("max_packet_size") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{}': {}", raw, e))?,
            None => 65_000,
        };

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Sink that sends each snapshot as one JSON datagram
///
/// The peripheral and sensor-network encoders live out of process and listen
/// on `addr`.
pub struct UdpSink {
    name: String,
    config: UdpSinkConfig,
    socket: Option<UdpSocket>,
}

impl UdpSink {
    #[instrument(name = "udp_sink_new", skip(name, config), fields(target = %config.addr))]
    pub async fn new(name: impl Into<String>, config: UdpSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind_addr = if config.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&config.addr).await?;

        debug!(sink = %name, target = %config.addr, "UdpSink connected");

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = UdpSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket not connected"))
    }

    fn encode(&self, snapshot: &MetricsSnapshot) -> Result<Vec<u8>, ContractError> {
        let data = serde_json::to_vec(snapshot)
            .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))?;

        if data.len() > self.config.max_packet_size {
            return Err(ContractError::sink_write(
                &self.name,
                format!(
                    "payload of {} bytes exceeds max_packet_size {}",
                    data.len(),
                    self.config.max_packet_size
                ),
            ));
        }
        Ok(data)
    }
}

impl SnapshotSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "udp_sink_write", skip(self, snapshot), fields(sink = %self.name))]
    async fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), ContractError> {
        let data = self.encode(snapshot)?;
        let socket = self.socket()?;

        match socket.send(&data).await {
            Ok(sent) => {
                debug!(sink = %self.name, bytes = sent, "Sent");
            }
            Err(e) => {
                // Best-effort: encoder not listening is not a sink failure
                error!(sink = %self.name, error = %e, "UDP send failed");
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "udp_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "UdpSink closed");
        Ok(())
    }
}
