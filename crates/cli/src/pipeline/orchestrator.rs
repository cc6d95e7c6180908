//! Bridge orchestrator - wires source, engine and publisher into the tick loop.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, EventSource, RowerCommand, SourceConfig};
use ingestion::{wall_clock_ms, BackpressureConfig, EventIngestion, MockRower, MockRowerConfig};
use publisher::OutputPublisher;
use telemetry_engine::{CommandOutcome, TelemetryEngine};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The bridge blueprint
    pub blueprint: BridgeBlueprint,

    /// Run timeout (None = until shutdown signal)
    pub timeout: Option<Duration>,

    /// Event channel capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Read operator commands from stdin
    pub read_stdin: bool,
}

/// Main bridge orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the bridge loop until `shutdown` resolves or the timeout expires
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Event source
        let source = build_source(&blueprint.source);
        info!(source = %source.name(), "Event source ready");

        let mut ingestion =
            EventIngestion::new(source, BackpressureConfig::new(self.config.buffer_size));
        let events = ingestion
            .take_receiver()
            .map_err(|e| CliError::bridge_execution(format!("ingestion receiver: {e}")))?;

        // Publisher
        let mut publisher = OutputPublisher::from_blueprint(blueprint)
            .await
            .context("Failed to create output publisher")?;

        let mut engine = TelemetryEngine::new(blueprint.engine.clone());

        let (command_tx, mut command_rx) = mpsc::channel::<String>(16);
        if self.config.read_stdin {
            tokio::spawn(read_commands(command_tx));
            info!("Reading operator commands from stdin");
        } else {
            drop(command_tx);
        }

        ingestion
            .start()
            .map_err(|e| CliError::bridge_execution(format!("failed to start source: {e}")))?;

        let tick_period = Duration::from_millis(blueprint.engine.tick_interval_ms);
        let mut ticker = tokio::time::interval(tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut stats = PipelineStats::default();
        let mut commands_open = self.config.read_stdin;

        info!(
            tick_ms = blueprint.engine.tick_interval_ms,
            broker = publisher.has_broker(),
            "Bridge running"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = &mut deadline => {
                    warn!(
                        timeout_secs = self.config.timeout.map(|t| t.as_secs()).unwrap_or(0),
                        "Bridge timed out"
                    );
                    break;
                }
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            stats.events_received += 1;
                            engine.push(&event, wall_clock_ms());
                        }
                        Err(_) => {
                            warn!("Event channel closed");
                            break;
                        }
                    }
                }
                line = command_rx.recv(), if commands_open => {
                    match line {
                        Some(line) => handle_command(&line, &mut engine, &ingestion, &mut stats),
                        None => {
                            debug!("Command input closed");
                            commands_open = false;
                        }
                    }
                }
                _ = ticker.tick() => {
                    let now = wall_clock_ms();
                    engine.tick(now);
                    let snapshot = engine.resolve(now);
                    let state = engine.state().as_str();

                    observability::record_snapshot(state, &snapshot);
                    stats.session.update(state, &snapshot);
                    stats.ticks += 1;

                    let delivery = publisher.publish_tick(snapshot, now);
                    stats.record_delivery(&delivery);
                }
            }
        }

        // Shutdown
        info!("Shutting down bridge...");
        ingestion.stop();
        stats.ingestion = ingestion.metrics().snapshot();
        stats.sinks = publisher.metrics();

        if tokio::time::timeout(Duration::from_secs(5), publisher.shutdown())
            .await
            .is_err()
        {
            warn!("Sink workers did not drain within 5s");
        }

        stats.duration = start_time.elapsed();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks = stats.ticks,
            "Bridge shutdown complete"
        );

        Ok(stats)
    }
}

/// Build the event source named in the blueprint
fn build_source(config: &SourceConfig) -> Arc<dyn EventSource> {
    match config {
        SourceConfig::Mock {
            stroke_rate_spm,
            peak_watts,
        } => Arc::new(MockRower::new(MockRowerConfig {
            stroke_rate_spm: *stroke_rate_spm,
            peak_watts: *peak_watts,
            ..Default::default()
        })),
    }
}

/// Parse and apply one operator command line
fn handle_command(
    line: &str,
    engine: &mut TelemetryEngine,
    ingestion: &EventIngestion,
    stats: &mut PipelineStats,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let command = match line.parse::<RowerCommand>() {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Rejected operator command");
            stats.commands_rejected += 1;
            return;
        }
    };

    stats.commands_applied += 1;
    match engine.apply_command(command, wall_clock_ms()) {
        CommandOutcome::DeviceResetRequested => {
            if let Err(e) = ingestion.request_reset() {
                warn!(error = %e, "Device reset request failed");
            }
        }
        CommandOutcome::HeartRateUpdated(bpm) => info!(bpm, "Heart rate override updated"),
        CommandOutcome::HeartRateUnchanged => debug!("Heart rate override unchanged"),
    }
}

/// Forward stdin lines until EOF or the receiver goes away
async fn read_commands(tx: mpsc::Sender<String>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EngineConfig;

    fn log_blueprint() -> BridgeBlueprint {
        config_loader::ConfigLoader::load_from_str(
            r#"
[engine]
tick_interval_ms = 20

[peripheral]
name = "ble"
sink_type = "log"

[sensor_network]
name = "ant"
sink_type = "log"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    #[test]
    fn test_handle_command_counts() {
        let mut engine = TelemetryEngine::new(EngineConfig::default());
        let ingestion = EventIngestion::new(
            build_source(&SourceConfig::default()),
            BackpressureConfig::default(),
        );
        let mut stats = PipelineStats::default();

        handle_command("hr 130", &mut engine, &ingestion, &mut stats);
        handle_command("fly away", &mut engine, &ingestion, &mut stats);
        handle_command("   ", &mut engine, &ingestion, &mut stats);
        // not listening: reset is accepted but the device request only warns
        handle_command("reset_ble", &mut engine, &ingestion, &mut stats);

        assert_eq!(stats.commands_applied, 2);
        assert_eq!(stats.commands_rejected, 1);
        assert_eq!(engine.heart_rate_override().value(), 130);
    }

    #[tokio::test]
    async fn test_run_until_timeout() {
        let config = PipelineConfig {
            blueprint: log_blueprint(),
            timeout: Some(Duration::from_millis(300)),
            buffer_size: 64,
            metrics_port: None,
            read_stdin: false,
        };

        let stats = Pipeline::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert!(stats.ticks >= 5);
        assert!(stats.events_received > 0);
        assert_eq!(stats.sinks.len(), 2);
        assert_eq!(stats.broker_sent, 0);
        assert_eq!(stats.session.total_ticks, stats.ticks);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let config = PipelineConfig {
            blueprint: log_blueprint(),
            timeout: None,
            buffer_size: 64,
            metrics_port: None,
            read_stdin: false,
        };

        let stats = Pipeline::new(config)
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert!(stats.duration >= Duration::from_millis(100));
    }
}
