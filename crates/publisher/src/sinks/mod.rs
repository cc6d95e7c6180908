//! Sink implementations
//!
//! Contains LogSink, UdpSink, ChannelSink and MqttSink.

mod channel;
mod log;
mod mqtt;
mod udp;

pub use self::channel::ChannelSink;
pub use self::log::LogSink;
pub use self::mqtt::MqttSink;
pub use self::udp::{UdpSink, UdpSinkConfig};
