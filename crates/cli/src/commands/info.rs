//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, SinkConfig, SourceConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    engine: contracts::EngineConfig,
    source: String,
    sinks: Vec<SinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    broker: Option<BrokerInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    role: &'static str,
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct BrokerInfo {
    host: String,
    port: u16,
    client_id: String,
    topic: String,
    publish_interval_ms: u64,
    keep_alive_secs: u64,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn describe_source(source: &SourceConfig) -> String {
    match source {
        SourceConfig::Mock {
            stroke_rate_spm,
            peak_watts,
        } => format!("mock ({stroke_rate_spm} spm, {peak_watts} W peak)"),
    }
}

fn sink_info(role: &'static str, sink: &SinkConfig, with_params: bool) -> SinkInfo {
    SinkInfo {
        role,
        name: sink.name.clone(),
        sink_type: format!("{:?}", sink.sink_type),
        queue_capacity: sink.queue_capacity,
        params: if with_params {
            sink.params.clone()
        } else {
            HashMap::new()
        },
    }
}

fn build_config_info(blueprint: &BridgeBlueprint, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        engine: blueprint.engine.clone(),
        source: describe_source(&blueprint.source),
        sinks: vec![
            sink_info("peripheral", &blueprint.peripheral, args.sinks),
            sink_info("sensor_network", &blueprint.sensor_network, args.sinks),
        ],
        broker: blueprint.broker.as_ref().map(|b| BrokerInfo {
            host: b.host.clone(),
            port: b.port,
            client_id: b.client_id.clone(),
            topic: b.topic.clone(),
            publish_interval_ms: b.publish_interval_ms,
            keep_alive_secs: b.keep_alive_secs,
            initial_backoff_ms: b.reconnect.initial_backoff_ms,
            max_backoff_ms: b.reconnect.max_backoff_ms,
        }),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Rower Bridge Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Engine");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Tick: {} ms", info.engine.tick_interval_ms);
    println!("   ├─ Pulse timeout: {} ms", info.engine.pulse_timeout_ms);
    println!("   ├─ Power window: {} strokes", info.engine.power_window_strokes);
    println!(
        "   └─ Heart-rate override TTL: {} ms",
        info.engine.heart_rate_override_ttl_ms
    );

    println!("\n🚣 Source");
    println!("   └─ {}", info.source);

    println!("\n📤 Sinks ({})", info.sinks.len());
    for (i, sink) in info.sinks.iter().enumerate() {
        let is_last = i == info.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };
        println!(
            "   {} {}: {} ({}, queue {})",
            prefix, sink.role, sink.name, sink.sink_type, sink.queue_capacity
        );
        for (key, value) in &sink.params {
            println!("   {}  └─ {} = {}", child_prefix, key, value);
        }
    }

    println!("\n📡 Broker");
    match &info.broker {
        Some(broker) => {
            println!("   ├─ Server: {}:{}", broker.host, broker.port);
            println!("   ├─ Client id: {}", broker.client_id);
            println!("   ├─ Topic: {}", broker.topic);
            println!("   ├─ Publish interval: {} ms", broker.publish_interval_ms);
            println!(
                "   └─ Reconnect backoff: {}..{} ms",
                broker.initial_backoff_ms, broker.max_backoff_ms
            );
        }
        None => println!("   └─ disabled"),
    }

    println!();
}
