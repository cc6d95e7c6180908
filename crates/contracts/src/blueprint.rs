//! BridgeBlueprint - Config Loader 输出
//!
//! 描述完整的桥接配置：引擎参数、事件源、两个不限流的 sink 以及 broker。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::EngineConfig;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的桥接配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BridgeBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 引擎参数
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// 事件源
    #[serde(default)]
    pub source: SourceConfig,

    /// 短距无线外设 sink
    #[validate(nested)]
    pub peripheral: SinkConfig,

    /// 运动传感器网络 sink
    #[validate(nested)]
    pub sensor_network: SinkConfig,

    /// 消息 broker（缺省 = 不向 broker 发布）
    #[serde(default)]
    #[validate(nested)]
    pub broker: Option<BrokerConfig>,
}

/// 事件源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// 模拟划船机
    Mock {
        /// 模拟桨频 (次/分钟)
        #[serde(default = "default_mock_stroke_rate")]
        stroke_rate_spm: f64,

        /// 每桨峰值功率 (W)
        #[serde(default = "default_mock_peak_watts")]
        peak_watts: f64,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Mock {
            stroke_rate_spm: default_mock_stroke_rate(),
            peak_watts: default_mock_peak_watts(),
        }
    }
}

fn default_mock_stroke_rate() -> f64 {
    24.0
}

fn default_mock_peak_watts() -> f64 {
    150.0
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink 名称
    #[validate(length(min = 1, message = "sink name cannot be empty"))]
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    32
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// JSON 数据报，发往外部编码进程
    Udp,
}

/// MQTT broker 配置
///
/// 凭据不从配置文件读取，启动时由环境变量注入。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BrokerConfig {
    #[validate(length(min = 1, message = "broker host cannot be empty"))]
    pub host: String,

    #[serde(default = "default_broker_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    #[serde(default = "default_client_id")]
    #[validate(length(min = 1, message = "client id cannot be empty"))]
    pub client_id: String,

    #[serde(default = "default_topic")]
    #[validate(length(min = 1, message = "topic cannot be empty"))]
    pub topic: String,

    #[serde(skip)]
    pub username: Option<String>,

    #[serde(skip)]
    pub password: Option<String>,

    #[serde(default = "default_keep_alive_secs")]
    #[validate(range(min = 5))]
    pub keep_alive_secs: u64,

    /// 两次 broker 发布的最小间隔 (ms)
    #[serde(default = "default_publish_interval_ms")]
    #[validate(range(min = 1))]
    pub publish_interval_ms: u64,

    #[serde(default = "default_broker_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl BrokerConfig {
    /// Broker at `host` with every other field at its default
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_broker_port(),
            client_id: default_client_id(),
            topic: default_topic(),
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive_secs(),
            publish_interval_ms: default_publish_interval_ms(),
            queue_capacity: default_broker_queue_capacity(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// 重连退避配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_broker_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "pirowflo".to_string()
}

fn default_topic() -> String {
    "waterrower/data".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_publish_interval_ms() -> u64 {
    1000
}

fn default_broker_queue_capacity() -> usize {
    16
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}
