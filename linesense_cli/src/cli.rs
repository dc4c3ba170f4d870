//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "linesense", version, about = "Line sensor CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/linesense.toml")]
    pub config: PathBuf,

    /// Print readings and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to [logging].level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the calibration phase and print the per-sensor bounds
    Calibrate {
        /// Fixed number of sweeps (overrides config)
        #[arg(long, value_name = "N")]
        iterations: Option<u32>,
        /// Calibration length in ms (overrides config; ignored with --iterations)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },
    /// Calibrate, then run paced decision cycles
    Run {
        /// Stop after this many cycles (overrides config; 0 = until Ctrl-C)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Decision cycle rate in Hz (overrides config)
        #[arg(long, value_name = "HZ")]
        hz: Option<u32>,
        /// Fixed number of calibration sweeps (overrides config)
        #[arg(long, value_name = "N")]
        calibration_iterations: Option<u32>,
    },
    /// Sample raw frames into a CSV for later replay
    Record {
        /// Output CSV path
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        /// Number of frames to record
        #[arg(long, value_name = "N", default_value_t = 200)]
        frames: u32,
    },
    /// Calibrate from and replay recorded raw frames (no hardware needed)
    Replay {
        /// Recorded frames CSV (strict header s0..s{n-1}[,off0..])
        #[arg(long, value_name = "FILE")]
        frames: PathBuf,
    },
    /// Quick health check (config valid, source answers on every channel)
    SelfCheck,
}
