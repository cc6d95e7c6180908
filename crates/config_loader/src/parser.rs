//! Configuration parsing
//!
//! TOML (preferred) and JSON.

use contracts::{BridgeBlueprint, ContractError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<BridgeBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<BridgeBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<BridgeBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkType, SourceConfig};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[peripheral]
name = "ble"
sink_type = "log"

[sensor_network]
name = "ant"
sink_type = "udp"
params = { addr = "127.0.0.1:5602" }
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.peripheral.sink_type, SinkType::Log);
        assert_eq!(bp.sensor_network.params["addr"], "127.0.0.1:5602");
        assert!(bp.broker.is_none());
        assert_eq!(bp.engine.tick_interval_ms, 100);
        assert!(matches!(bp.source, SourceConfig::Mock { .. }));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "engine": { "pulse_timeout_ms": 250 },
            "source": { "kind": "mock", "stroke_rate_spm": 30.0 },
            "peripheral": { "name": "ble", "sink_type": "log" },
            "sensor_network": { "name": "ant", "sink_type": "log" },
            "broker": { "host": "localhost" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.engine.pulse_timeout_ms, 250);
        assert_eq!(bp.engine.power_window_strokes, 4);
        assert_eq!(bp.broker.unwrap().topic, "waterrower/data");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_sink_type_rejected() {
        let content = r#"
[peripheral]
name = "ble"
sink_type = "bluetooth"

[sensor_network]
name = "ant"
sink_type = "log"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
