#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and raw-frame recordings for the line sensor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Recorded raw frames are loaded from CSV with strict headers so a
//!   session can be replayed through the pipeline offline.
use serde::Deserialize;

/// Largest calibrated value; thresholds live on the same scale.
pub const CALIBRATED_MAX: u16 = 1000;

#[derive(Debug, Deserialize)]
pub struct Sensors {
    /// Hardware channel per logical slot, left to right.
    pub channels: Vec<u8>,
    /// Samples averaged per reading. 0 is coerced to 1 by the core.
    #[serde(default = "default_samples")]
    pub samples_per_sensor: u8,
    /// GPIO driving the IR emitter bank, if any.
    #[serde(default)]
    pub emitter_pin: Option<u8>,
    /// GPIO per channel for RC discharge sensors (channel = index into this list).
    #[serde(default)]
    pub rc_pins: Vec<u8>,
}

fn default_samples() -> u8 {
    4
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SamplingKind {
    #[default]
    Analog,
    Timed,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sampling {
    pub mode: SamplingKind,
    /// Converter full scale for analog mode.
    pub raw_max: u16,
    /// Discharge ceiling for timed mode (µs); also its raw full scale.
    pub timeout_us: u16,
    /// SPI clock for the MCP3008 backend.
    pub spi_clock_hz: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            mode: SamplingKind::Analog,
            raw_max: 1023,
            timeout_us: 2500,
            spi_clock_hz: 1_350_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GrayZone {
    #[default]
    Background,
    Line,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub white: u16,
    pub black: u16,
    /// How values strictly between `white` and `black` resolve.
    pub gray_zone: GrayZone,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            white: 300,
            black: 700,
            gray_zone: GrayZone::Background,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Classifier {
    /// Gain applied to the centroid offset in 8-sensor space.
    pub centroid_gain: f32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { centroid_gain: 2.0 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Dark line on a light floor.
    #[default]
    Dark,
    /// Light line on a dark floor.
    Light,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Line {
    pub polarity: Polarity,
    /// Sample with the emitter off as well and subtract ambient light.
    pub ambient: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Calibration length when `iterations` is not set.
    pub duration_ms: u64,
    /// Fixed number of calibration sweeps; takes precedence over `duration_ms`.
    pub iterations: Option<u32>,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            iterations: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Decision cycles per second.
    pub cycle_hz: u32,
    /// Stop after this many cycles; 0 runs until interrupted.
    pub max_cycles: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            cycle_hz: 100,
            max_cycles: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Line sweeps this far either side of the array centre (index units).
    pub sweep_amplitude: f32,
    /// Cycles per full sweep.
    pub sweep_period_cycles: u32,
    /// Peak-to-peak sample noise.
    pub noise: u16,
    /// Ambient light added to every reading.
    pub ambient: u16,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            sweep_amplitude: 3.0,
            sweep_period_cycles: 200,
            noise: 8,
            ambient: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub sensors: Sensors,
    #[serde(default)]
    pub sampling: Sampling,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub classifier: Classifier,
    #[serde(default)]
    pub line: Line,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Reject values no sensor could run with.
    ///
    /// Channel count and `samples_per_sensor = 0` are not errors here: the
    /// core clamps those silently so a misconfigured robot still produces a
    /// steering signal.
    pub fn validate(&self) -> eyre::Result<()> {
        // Thresholds
        if self.thresholds.white > CALIBRATED_MAX {
            eyre::bail!("thresholds.white must be in [0, {CALIBRATED_MAX}]");
        }
        if self.thresholds.black > CALIBRATED_MAX {
            eyre::bail!("thresholds.black must be in [0, {CALIBRATED_MAX}]");
        }
        if self.thresholds.white >= self.thresholds.black {
            eyre::bail!("thresholds.white must be < thresholds.black");
        }

        // Sampling
        match self.sampling.mode {
            SamplingKind::Analog => {
                if self.sampling.raw_max == 0 {
                    eyre::bail!("sampling.raw_max must be >= 1");
                }
            }
            SamplingKind::Timed => {
                if self.sampling.timeout_us == 0 {
                    eyre::bail!("sampling.timeout_us must be >= 1");
                }
                if !self.sensors.rc_pins.is_empty()
                    && let Some(&ch) = self
                        .sensors
                        .channels
                        .iter()
                        .find(|&&ch| usize::from(ch) >= self.sensors.rc_pins.len())
                {
                    eyre::bail!("sensors.channels entry {ch} has no matching sensors.rc_pins");
                }
            }
        }

        // Classifier
        let gain = self.classifier.centroid_gain;
        if !(gain.is_finite() && gain > 0.0 && gain <= 16.0) {
            eyre::bail!("classifier.centroid_gain must be in (0.0, 16.0]");
        }

        // Calibration
        match self.calibration.iterations {
            Some(0) => eyre::bail!("calibration.iterations must be >= 1"),
            Some(_) => {}
            None => {
                if self.calibration.duration_ms == 0 {
                    eyre::bail!("calibration.duration_ms must be >= 1");
                }
                if self.calibration.duration_ms > 10 * 60 * 1000 {
                    eyre::bail!("calibration.duration_ms is unreasonably large (>10min)");
                }
            }
        }

        // Runner
        if self.runner.cycle_hz == 0 {
            eyre::bail!("runner.cycle_hz must be > 0");
        }

        // Simulation
        if !self.simulation.sweep_amplitude.is_finite() {
            eyre::bail!("simulation.sweep_amplitude must be finite");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// One recorded sample of the whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Emitter-on readings, left to right.
    pub on: Vec<u16>,
    /// Emitter-off readings when the recording was made in ambient mode.
    pub off: Option<Vec<u16>>,
}

/// Parse recorded frames from CSV text.
///
/// Expected headers: `s0,s1,...,s{n-1}` optionally followed by
/// `off0,...,off{n-1}`.
///
/// Example:
/// s0,s1,s2
/// 100,870,95
/// 98,880,110
pub fn parse_frames<R: std::io::Read>(reader: R) -> eyre::Result<Vec<RawFrame>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read frame CSV headers: {e}"))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    let n = actual.iter().take_while(|h| h.starts_with('s')).count();
    let with_off = actual.len() == 2 * n;
    let expected: Vec<String> = (0..n)
        .map(|i| format!("s{i}"))
        .chain((0..if with_off { n } else { 0 }).map(|i| format!("off{i}")))
        .collect();
    if n == 0 || actual != expected {
        eyre::bail!(
            "frame CSV must have headers 's0..s{{n-1}}' optionally followed by 'off0..off{{n-1}}', got: {}",
            actual.join(",")
        );
    }

    let mut frames = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {e}", idx + 2))?;
        let values = rec
            .iter()
            .map(str::parse::<u16>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| eyre::eyre!("invalid CSV row {}: {e}", idx + 2))?;
        if values.len() != expected.len() {
            eyre::bail!(
                "invalid CSV row {}: expected {} values, got {}",
                idx + 2,
                expected.len(),
                values.len()
            );
        }
        let (on, off) = values.split_at(n);
        frames.push(RawFrame {
            on: on.to_vec(),
            off: with_off.then(|| off.to_vec()),
        });
    }
    Ok(frames)
}

pub fn load_frames_csv(path: &std::path::Path) -> eyre::Result<Vec<RawFrame>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open frame CSV {:?}: {}", path, e))?;
    parse_frames(file)
}
