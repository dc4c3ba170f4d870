#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `linesense`: calibrate, run, record and replay a reflectance line sensor.

mod cli;
mod error_fmt;
mod logging;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, JSON_MODE};

fn load_config(path: &std::path::Path) -> eyre::Result<linesense_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = linesense_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn dispatch(cli: Cli, stop: &AtomicBool) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init(cli.json, cli.log_level.as_deref(), Some(&cfg.logging));
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Calibrate {
            iterations,
            duration_ms,
        } => session::calibrate(&cfg, cli.json, iterations, duration_ms),
        Commands::Run {
            cycles,
            hz,
            calibration_iterations,
        } => session::run(&cfg, cli.json, cycles, hz, calibration_iterations, stop),
        Commands::Record { out, frames } => session::record(&cfg, &out, frames),
        Commands::Replay { frames } => session::replay(&cfg, &frames, cli.json),
        Commands::SelfCheck => session::self_check(&cfg),
    }
}

fn main() {
    // Colored panic/error reports; a failure here only loses the colors.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            eprintln!("warning: Ctrl-C handler not installed: {e}");
        }
    }

    if let Err(err) = dispatch(cli, &stop) {
        tracing::error!(error = %format!("{err:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
