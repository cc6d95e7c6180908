//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rower Bridge - rowing machine telemetry to peripheral, sensor network and MQTT
#[derive(Parser, Debug)]
#[command(
    name = "rower-bridge",
    author,
    version,
    about = "Rowing machine telemetry bridge",
    long_about = "Turns rowing machine events into a continuously refreshed metrics snapshot.\n\n\
                  Publishes the snapshot every tick to the peripheral and sensor-network \n\
                  sinks and, throttled, to an MQTT broker. Reads operator commands \n\
                  (`reset_ble`, `hr <bpm>`) from stdin."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ROWER_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ROWER_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "bridge.toml", env = "ROWER_BRIDGE_CONFIG")]
    pub config: PathBuf,

    /// Override the broker host from configuration
    #[arg(long, env = "ROWER_BRIDGE_BROKER_HOST")]
    pub broker_host: Option<String>,

    /// Broker user name
    #[arg(long, env = "MQ_USER")]
    pub mq_user: Option<String>,

    /// Broker password
    #[arg(long, env = "MQ_PASSWORD", hide_env_values = true)]
    pub mq_password: Option<String>,

    /// Run timeout in seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "ROWER_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running the bridge
    #[arg(long)]
    pub dry_run: bool,

    /// Event channel capacity
    #[arg(long, default_value = "256", env = "ROWER_BRIDGE_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "ROWER_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Do not read operator commands from stdin
    #[arg(long)]
    pub no_stdin: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink parameters
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
