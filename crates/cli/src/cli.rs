//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::SensorFailurePolicy;
use std::path::PathBuf;

/// Sim Scenario - multirotor scene bootstrapper
#[derive(Parser, Debug)]
#[command(
    name = "sim-scenario",
    author,
    version,
    about = "Multirotor simulation scenario bootstrapper",
    long_about = "Builds a simulated world from a scenario file.\n\n\
                  Adds ground plane, lighting and props, spawns PX4-controlled \n\
                  multirotors with their sensors, and drives the simulation loop."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SIM_SCENARIO_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "SIM_SCENARIO_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the scene and run the simulation loop
    Run(RunArgs),

    /// Validate a scenario file without running
    Validate(ValidateArgs),

    /// Display scenario information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to scenario file (TOML, JSON or YAML)
    #[arg(
        short,
        long,
        default_value = "scenario.toml",
        env = "SIM_SCENARIO_CONFIG",
        conflicts_with = "reference"
    )]
    pub config: PathBuf,

    /// Use the built-in reference scene instead of a scenario file
    #[arg(long)]
    pub reference: bool,

    /// Override the working directory holding `config/` and `data/`
    #[arg(long, env = "SIM_SCENARIO_WORKING_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many simulation steps (0 = until interrupted)
    #[arg(long, default_value = "0", env = "SIM_SCENARIO_MAX_STEPS")]
    pub max_steps: u64,

    /// Step as fast as possible instead of pacing to wall-clock time
    #[arg(long)]
    pub fast: bool,

    /// Override what happens to a vehicle whose sensor fails to attach
    #[arg(long, value_enum, env = "SIM_SCENARIO_SENSOR_POLICY")]
    pub sensor_policy: Option<SensorPolicy>,

    /// Parse the sensor configuration once and share it between vehicles
    #[arg(long)]
    pub cache_sensor_config: bool,

    /// Validate the scenario and exit without building the scene
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SIM_SCENARIO_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to scenario file to validate
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to scenario file
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show namespaces, topics and backend ports per vehicle
    #[arg(long)]
    pub vehicles: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Sensor failure policy
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SensorPolicy {
    /// Keep the vehicle without the failed sensor
    Keep,
    /// Remove the vehicle and its sensors
    Rollback,
}

impl From<SensorPolicy> for SensorFailurePolicy {
    fn from(policy: SensorPolicy) -> Self {
        match policy {
            SensorPolicy::Keep => Self::KeepVehicle,
            SensorPolicy::Rollback => Self::RollbackVehicle,
        }
    }
}
