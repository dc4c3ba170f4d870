//! Command execution: source assembly, calibration, runs, recording and replay.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use linesense_core::mocks::NoopSource;
use linesense_core::{
    CalibrationPlan, CalibrationState, LineReading, LineSensor, RawReading, RunParams, RunSummary,
    SensorCfg,
};
use linesense_traits::{Clock, MonotonicClock, SampleSource};
use serde_json::json;

/// Open the configured sample source: the Pi backends with `--features
/// hardware`, the simulated row otherwise.
#[cfg(feature = "hardware")]
pub fn open_source(cfg: &linesense_config::Config) -> eyre::Result<Box<dyn SampleSource>> {
    use linesense_config::SamplingKind;
    use linesense_hardware::{Mcp3008Source, RcDischargeSource};

    let emitter = cfg.sensors.emitter_pin;
    let source: Box<dyn SampleSource> = match cfg.sampling.mode {
        SamplingKind::Analog => Box::new(
            Mcp3008Source::new(cfg.sampling.spi_clock_hz, emitter)
                .map_err(eyre::Report::new)
                .wrap_err("open MCP3008 on spi0")?,
        ),
        SamplingKind::Timed => Box::new(
            RcDischargeSource::new(&cfg.sensors.rc_pins, emitter)
                .map_err(eyre::Report::new)
                .wrap_err("open RC sensor pins")?,
        ),
    };
    tracing::info!(mode = ?cfg.sampling.mode, "hardware source ready");
    Ok(source)
}

#[cfg(not(feature = "hardware"))]
pub fn open_source(cfg: &linesense_config::Config) -> eyre::Result<Box<dyn SampleSource>> {
    Ok(Box::new(simulated_source(cfg)))
}

/// Simulated row wide enough for every configured channel.
///
/// The sweep period is given in cycles; the simulator ticks once per
/// averaged sample of channel 0, so it is scaled by `samples_per_sensor`.
#[cfg_attr(feature = "hardware", allow(dead_code))]
pub fn simulated_source(cfg: &linesense_config::Config) -> linesense_hardware::SimulatedArray {
    let sim_cfg = &cfg.simulation;
    let width = cfg
        .sensors
        .channels
        .iter()
        .max()
        .map_or(0, |&ch| ch.saturating_add(1));
    let period = sim_cfg
        .sweep_period_cycles
        .saturating_mul(u32::from(cfg.sensors.samples_per_sensor.max(1)));
    let sim = linesense_hardware::SimulatedArray::new(width)
        .with_noise(sim_cfg.noise)
        .with_sweep(sim_cfg.sweep_amplitude, period);
    sim.line().set_ambient(sim_cfg.ambient);
    tracing::debug!(
        width,
        noise = sim_cfg.noise,
        amplitude = sim_cfg.sweep_amplitude,
        period,
        "simulated source ready"
    );
    sim
}

pub fn build_sensor(cfg: &linesense_config::Config) -> eyre::Result<LineSensor> {
    let source = open_source(cfg)?;
    LineSensor::builder()
        .with_config(SensorCfg::from(cfg))
        .with_source(source)
        .build()
}

/// Config plan, with the command line taking precedence.
pub fn calibration_plan(
    cfg: &linesense_config::Config,
    iterations: Option<u32>,
    duration_ms: Option<u64>,
) -> CalibrationPlan {
    match (iterations, duration_ms) {
        (Some(n), _) => CalibrationPlan::Iterations(n.max(1)),
        (None, Some(ms)) => CalibrationPlan::Duration(Duration::from_millis(ms)),
        (None, None) => CalibrationPlan::from(&cfg.calibration),
    }
}

pub fn calibrate(
    cfg: &linesense_config::Config,
    json: bool,
    iterations: Option<u32>,
    duration_ms: Option<u64>,
) -> eyre::Result<()> {
    let mut sensor = build_sensor(cfg)?;
    let plan = calibration_plan(cfg, iterations, duration_ms);
    sensor
        .calibrate(plan, &MonotonicClock::new())
        .wrap_err("calibration")?;
    print_calibration(sensor.channels(), sensor.calibration(), json);
    Ok(())
}

pub fn run(
    cfg: &linesense_config::Config,
    json: bool,
    cycles: Option<u64>,
    hz: Option<u32>,
    calibration_iterations: Option<u32>,
    stop: &AtomicBool,
) -> eyre::Result<()> {
    let mut sensor = build_sensor(cfg)?;
    let clock = MonotonicClock::new();
    let plan = calibration_plan(cfg, calibration_iterations, None);
    let state = sensor.calibrate(plan, &clock).wrap_err("calibration")?;
    tracing::info!(
        observations = state.observations(),
        degenerate = state.degenerate_count(),
        "calibration complete"
    );

    let mut params = RunParams::from(&cfg.runner);
    if let Some(n) = cycles {
        params.max_cycles = n;
    }
    if let Some(hz) = hz {
        params.cycle_hz = hz.max(1);
    }

    let summary = linesense_core::run_cycles(&mut sensor, &params, &clock, stop, |cycle, r| {
        print_reading(cycle, r, json);
    })?;
    print_summary(&summary, json);
    Ok(())
}

/// Sample `frames` raw rows and write them as a replayable CSV.
pub fn record(cfg: &linesense_config::Config, out: &Path, frames: u32) -> eyre::Result<()> {
    let mut sensor = build_sensor(cfg)?;
    let clock = MonotonicClock::new();
    let period = Duration::from_micros(linesense_core::util::period_us(cfg.runner.cycle_hz));

    let mut captured = Vec::with_capacity(frames as usize);
    for i in 0..frames {
        let started = clock.now();
        let frame = sensor
            .read_raw()
            .wrap_err_with(|| format!("record frame {}", i + 1))?;
        captured.push(frame);
        let spent = clock.now().saturating_duration_since(started);
        if let Some(rest) = period.checked_sub(spent) {
            clock.sleep(rest);
        }
    }

    write_frames_csv(out, sensor.sensor_count(), &captured)
        .wrap_err_with(|| format!("write frames to {}", out.display()))?;
    tracing::info!(frames, path = %out.display(), "recording saved");
    Ok(())
}

fn write_frames_csv(path: &Path, sensors: usize, frames: &[RawReading]) -> eyre::Result<()> {
    let with_off = frames.first().is_some_and(|f| f.off.is_some());
    let mut wtr = csv::Writer::from_path(path)?;
    let header = (0..sensors)
        .map(|i| format!("s{i}"))
        .chain((0..if with_off { sensors } else { 0 }).map(|i| format!("off{i}")));
    wtr.write_record(header)?;
    for f in frames {
        let off = f.off.iter().flat_map(|o| o.iter());
        wtr.write_record(f.on.iter().chain(off).map(u16::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Calibrate from a recording and feed every frame through the pipeline.
///
/// The array width comes from the recording, so a replay does not need a
/// config with matching channels.
pub fn replay(cfg: &linesense_config::Config, frames_path: &Path, json: bool) -> eyre::Result<()> {
    let frames: Vec<RawReading> = linesense_config::load_frames_csv(frames_path)?
        .iter()
        .map(RawReading::from)
        .collect();
    let width = frames.first().map_or(0, |f| f.on.len());
    let mut sensor_cfg = SensorCfg::from(cfg);
    if sensor_cfg.channels.len() != width {
        tracing::debug!(
            configured = sensor_cfg.channels.len(),
            recorded = width,
            "replay uses the recorded width"
        );
        sensor_cfg.channels = (0..width).filter_map(|i| u8::try_from(i).ok()).collect();
    }

    let mut sensor = linesense_core::build_line_sensor(NoopSource, sensor_cfg)?;
    sensor
        .calibrate_from_frames(&frames)
        .wrap_err("calibrate from recording")?;
    let summary = linesense_core::run_frames(&mut sensor, &frames, |cycle, r| {
        print_reading(cycle, r, json);
    })?;
    print_summary(&summary, json);
    Ok(())
}

/// Build the sensor and take one raw row from every channel.
pub fn self_check(cfg: &linesense_config::Config) -> eyre::Result<()> {
    let mut sensor = build_sensor(cfg)?;
    let raw = sensor.read_raw().wrap_err("self-check read")?;
    tracing::info!(sensors = raw.on.len(), raw = ?raw.on.as_slice(), "self-check read");
    println!("OK");
    Ok(())
}

fn print_calibration(channels: &[u8], state: &CalibrationState, json: bool) {
    if json {
        let sensors: Vec<_> = state
            .sensors()
            .iter()
            .zip(channels)
            .map(|(s, ch)| {
                let mut obj = json!({
                    "channel": ch,
                    "min": s.on.min,
                    "max": s.on.max,
                    "degenerate": s.degenerate,
                });
                if state.ambient() && s.off.observed() {
                    obj["off_min"] = json!(s.off.min);
                    obj["off_max"] = json!(s.off.max);
                }
                obj
            })
            .collect();
        println!(
            "{}",
            json!({
                "calibration": {
                    "observations": state.observations(),
                    "raw_max": state.raw_max(),
                    "degenerate": state.degenerate_count(),
                    "sensors": sensors,
                }
            })
        );
        return;
    }

    println!(
        "calibrated {} sensors over {} sweeps",
        state.sensors().len(),
        state.observations()
    );
    for (s, ch) in state.sensors().iter().zip(channels) {
        let flag = if s.degenerate { "  (degenerate)" } else { "" };
        println!("  ch{ch:<2} min={:<5} max={:<5}{flag}", s.on.min, s.on.max);
    }
}

fn print_reading(cycle: u64, r: &LineReading, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "cycle": cycle,
                "calibrated": r.calibrated.as_slice(),
                "bits": r.bits.to_string(),
                "steps": r.steps,
                "error_milli": r.error_milli,
                "position": r.position,
                "gap": r.gap,
            })
        );
    } else {
        let sign = if r.error_milli < 0 { '-' } else { '+' };
        let err = r.error_milli.unsigned_abs();
        println!(
            "cycle {cycle}: bits={} steps={:+} error={sign}{}.{:03} position={}{}",
            r.bits,
            r.steps,
            err / 1000,
            err % 1000,
            r.position,
            if r.gap { " gap" } else { "" }
        );
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "summary": {
                    "cycles": summary.cycles,
                    "gaps": summary.gaps,
                    "last_steps": summary.last_steps(),
                    "last_position": summary.last.as_ref().map(|r| r.position),
                }
            })
        );
    } else {
        println!(
            "complete: {} cycles, {} gaps, last steps {:+}",
            summary.cycles,
            summary.gaps,
            summary.last_steps()
        );
    }
}
