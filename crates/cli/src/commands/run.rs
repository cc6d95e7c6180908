//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, BrokerConfig, SourceConfig};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        peripheral = %blueprint.peripheral.name,
        sensor_network = %blueprint.sensor_network.name,
        broker = ?blueprint.broker.as_ref().map(|b| format!("{}:{}", b.host, b.port)),
        tick_ms = blueprint.engine.tick_interval_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        read_stdin: !args.no_stdin,
    };

    info!("Starting bridge...");

    let stats = Pipeline::new(pipeline_config)
        .run(setup_shutdown_signal())
        .await
        .context("Bridge execution failed")?;

    info!(
        events = stats.events_received,
        ticks = stats.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        "Bridge stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Fold command-line and environment overrides into the blueprint
fn apply_overrides(blueprint: &mut BridgeBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(ref host) = args.broker_host {
        info!(host = %host, "Overriding broker host from CLI");
        match blueprint.broker.as_mut() {
            Some(broker) => broker.host = host.clone(),
            None => blueprint.broker = Some(BrokerConfig::new(host.clone())),
        }
    }

    match (&args.mq_user, &args.mq_password) {
        (None, None) => {}
        (None, Some(_)) => {
            return Err(CliError::invalid_override(
                "broker password given without a user (MQ_USER)",
            ));
        }
        (Some(user), password) => match blueprint.broker.as_mut() {
            Some(broker) => {
                broker.username = Some(user.clone());
                broker.password = Some(password.clone().unwrap_or_default());
            }
            None => warn!("Broker credentials given but no broker configured, ignoring"),
        },
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &BridgeBlueprint) {
    println!("\n=== Configuration Summary ===\n");

    let engine = &blueprint.engine;
    println!("Engine:");
    println!("  Tick: {} ms", engine.tick_interval_ms);
    println!("  Pulse timeout: {} ms", engine.pulse_timeout_ms);
    println!("  Power window: {} strokes", engine.power_window_strokes);

    match &blueprint.source {
        SourceConfig::Mock {
            stroke_rate_spm,
            peak_watts,
        } => println!("\nSource: mock ({stroke_rate_spm} spm, {peak_watts} W)"),
    }

    println!("\nSinks:");
    for (role, sink) in [
        ("peripheral", &blueprint.peripheral),
        ("sensor_network", &blueprint.sensor_network),
    ] {
        println!("  - {role}: {} ({:?})", sink.name, sink.sink_type);
    }

    match &blueprint.broker {
        Some(broker) => println!(
            "  - broker: {}:{} topic '{}' every {} ms{}",
            broker.host,
            broker.port,
            broker.topic,
            broker.publish_interval_ms,
            if broker.username.is_some() {
                " (authenticated)"
            } else {
                ""
            }
        ),
        None => println!("  - broker: disabled"),
    }

    println!();
}
