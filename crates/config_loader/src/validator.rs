//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束（contracts 上的 `validator` derive）
//! - peripheral / sensor_network 的 sink 名称唯一
//! - udp sink 必须带可解析的 `addr`
//! - 重连退避上下限有序
//! - mock 源参数为正

use std::net::SocketAddr;

use contracts::{BridgeBlueprint, ContractError, SinkConfig, SinkType, SourceConfig};
use validator::Validate;

/// 校验 BridgeBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_sink_params("peripheral", &blueprint.peripheral)?;
    validate_sink_params("sensor_network", &blueprint.sensor_network)?;
    validate_broker(blueprint)?;
    validate_source(blueprint)?;
    Ok(())
}

/// 校验 derive 声明的字段级约束
fn validate_fields(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|errors| ContractError::config_validation("blueprint", errors.to_string()))
}

/// 校验 sink 名称唯一性
fn validate_sink_names(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    if blueprint.peripheral.name == blueprint.sensor_network.name {
        return Err(ContractError::config_validation(
            format!("sensor_network.name={}", blueprint.sensor_network.name),
            "duplicate sink name",
        ));
    }
    Ok(())
}

/// 校验 udp sink 参数
fn validate_sink_params(section: &str, sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.sink_type != SinkType::Udp {
        return Ok(());
    }

    let addr = sink.params.get("addr").ok_or_else(|| {
        ContractError::config_validation(
            format!("{section}.params.addr"),
            "udp sink requires 'addr'",
        )
    })?;

    addr.parse::<SocketAddr>().map_err(|e| {
        ContractError::config_validation(
            format!("{section}.params.addr"),
            format!("invalid address '{addr}': {e}"),
        )
    })?;

    Ok(())
}

/// 校验 broker 重连配置
fn validate_broker(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    let Some(broker) = &blueprint.broker else {
        return Ok(());
    };

    let reconnect = &broker.reconnect;
    if reconnect.initial_backoff_ms == 0 {
        return Err(ContractError::config_validation(
            "broker.reconnect.initial_backoff_ms",
            "initial_backoff_ms must be > 0",
        ));
    }
    if reconnect.initial_backoff_ms > reconnect.max_backoff_ms {
        return Err(ContractError::config_validation(
            "broker.reconnect",
            format!(
                "initial_backoff_ms ({}) must be <= max_backoff_ms ({})",
                reconnect.initial_backoff_ms, reconnect.max_backoff_ms
            ),
        ));
    }
    Ok(())
}

/// 校验事件源配置
fn validate_source(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    match &blueprint.source {
        SourceConfig::Mock {
            stroke_rate_spm,
            peak_watts,
        } => {
            if *stroke_rate_spm <= 0.0 {
                return Err(ContractError::config_validation(
                    "source.stroke_rate_spm",
                    format!("stroke_rate_spm must be > 0, got {stroke_rate_spm}"),
                ));
            }
            if *peak_watts < 0.0 {
                return Err(ContractError::config_validation(
                    "source.peak_watts",
                    format!("peak_watts must be >= 0, got {peak_watts}"),
                ));
            }
        }
    }
    Ok(())
}
