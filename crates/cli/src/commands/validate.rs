//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    tick_interval_ms: u64,
    peripheral: String,
    sensor_network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    broker: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    tick_interval_ms: blueprint.engine.tick_interval_ms,
                    peripheral: format!(
                        "{} ({:?})",
                        blueprint.peripheral.name, blueprint.peripheral.sink_type
                    ),
                    sensor_network: format!(
                        "{} ({:?})",
                        blueprint.sensor_network.name, blueprint.sensor_network.sink_type
                    ),
                    broker: blueprint
                        .broker
                        .as_ref()
                        .map(|b| format!("{}:{}/{}", b.host, b.port, b.topic)),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &BridgeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    match &blueprint.broker {
        None => warnings.push("No broker configured - broker publishing disabled".to_string()),
        Some(broker) if broker.publish_interval_ms < blueprint.engine.tick_interval_ms => {
            warnings.push(format!(
                "broker.publish_interval_ms ({}) is shorter than the tick ({} ms) - broker gets every tick",
                broker.publish_interval_ms, blueprint.engine.tick_interval_ms
            ));
        }
        Some(_) => {}
    }

    if blueprint.peripheral.sink_type == SinkType::Log
        && blueprint.sensor_network.sink_type == SinkType::Log
    {
        warnings.push("peripheral and sensor_network are both log sinks - no device receives data".to_string());
    }

    if blueprint.engine.pulse_timeout_ms < blueprint.engine.tick_interval_ms {
        warnings.push(format!(
            "engine.pulse_timeout_ms ({}) is shorter than the tick ({} ms) - standstill may flicker",
            blueprint.engine.pulse_timeout_ms, blueprint.engine.tick_interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tick: {} ms", summary.tick_interval_ms);
            println!("  Peripheral: {}", summary.peripheral);
            println!("  Sensor network: {}", summary.sensor_network);
            println!(
                "  Broker: {}",
                summary.broker.as_deref().unwrap_or("disabled")
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
