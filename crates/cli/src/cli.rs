//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Multi-modal sensor fusion runner - Wi-Fi/camera/mmWave/BLE tracking pipeline
#[derive(Parser, Debug)]
#[command(
    name = "fusion-runner",
    author,
    version,
    about = "Real-time multi-modal sensor fusion pipeline",
    long_about = "Polls Wi-Fi, camera, mmWave, and BLE ingestion adapters, \n\
                  time-aligns their output, fuses it into 2D kinematic tracks \n\
                  with alert tiers, and dispatches the result to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FUSION_VERBOSE")]
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
        env = "FUSION_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fusion pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long, default_value = "config.json", env = "FUSION_CONFIG")]
    pub config: PathBuf,

    /// Interval between ingestion polls, in seconds
    #[arg(long, default_value = "0.2", env = "FUSION_POLL_INTERVAL")]
    pub poll_interval: f64,

    /// Maximum number of ticks to emit (0 = unlimited)
    #[arg(long, default_value = "0", env = "FUSION_MAX_ITERATIONS")]
    pub max_iterations: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FUSION_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Emit one bare `TrackState` JSON object per line to stdout instead of
    /// the full per-tick envelope, reproducing the original pipeline's
    /// simpler output mode.
    #[arg(long)]
    pub legacy_emission: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "FUSION_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor calibration information
    #[arg(long)]
    pub sensors: bool,

    /// Show sink configuration
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
