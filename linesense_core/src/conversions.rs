//! `From` implementations bridging `linesense_config` types to core runtime types.

use std::time::Duration;

use crate::config::{
    CalibrationPlan, ClassifierCfg, GrayZonePolicy, LinePolarity, RunParams, SamplingMode,
    SensorCfg, Thresholds,
};
use crate::types::RawReading;

// ── Sampling ─────────────────────────────────────────────────────────────────

impl From<&linesense_config::Sampling> for SamplingMode {
    fn from(c: &linesense_config::Sampling) -> Self {
        match c.mode {
            linesense_config::SamplingKind::Analog => SamplingMode::Analog {
                raw_max: c.raw_max,
            },
            linesense_config::SamplingKind::Timed => SamplingMode::Timed {
                timeout_us: c.timeout_us,
            },
        }
    }
}

// ── Thresholds ───────────────────────────────────────────────────────────────

impl From<linesense_config::GrayZone> for GrayZonePolicy {
    fn from(g: linesense_config::GrayZone) -> Self {
        match g {
            linesense_config::GrayZone::Background => GrayZonePolicy::Background,
            linesense_config::GrayZone::Line => GrayZonePolicy::Line,
        }
    }
}

impl From<&linesense_config::Thresholds> for Thresholds {
    fn from(c: &linesense_config::Thresholds) -> Self {
        Self {
            white: c.white,
            black: c.black,
            gray_zone: c.gray_zone.into(),
        }
    }
}

// ── Line / classifier ────────────────────────────────────────────────────────

impl From<linesense_config::Polarity> for LinePolarity {
    fn from(p: linesense_config::Polarity) -> Self {
        match p {
            linesense_config::Polarity::Dark => LinePolarity::DarkLine,
            linesense_config::Polarity::Light => LinePolarity::LightLine,
        }
    }
}

impl From<&linesense_config::Classifier> for ClassifierCfg {
    fn from(c: &linesense_config::Classifier) -> Self {
        Self {
            centroid_gain: c.centroid_gain,
        }
    }
}

// ── Whole sensor ─────────────────────────────────────────────────────────────

impl From<&linesense_config::Config> for SensorCfg {
    fn from(c: &linesense_config::Config) -> Self {
        Self {
            channels: c.sensors.channels.clone(),
            samples_per_sensor: c.sensors.samples_per_sensor,
            sampling: (&c.sampling).into(),
            thresholds: (&c.thresholds).into(),
            polarity: c.line.polarity.into(),
            ambient: c.line.ambient,
            classifier: (&c.classifier).into(),
        }
    }
}

// ── Calibration / runner ─────────────────────────────────────────────────────

impl From<&linesense_config::CalibrationCfg> for CalibrationPlan {
    fn from(c: &linesense_config::CalibrationCfg) -> Self {
        match c.iterations {
            Some(n) => CalibrationPlan::Iterations(n),
            None => CalibrationPlan::Duration(Duration::from_millis(c.duration_ms)),
        }
    }
}

impl From<&linesense_config::RunnerCfg> for RunParams {
    fn from(c: &linesense_config::RunnerCfg) -> Self {
        Self {
            cycle_hz: c.cycle_hz,
            max_cycles: c.max_cycles,
        }
    }
}

// ── Recorded frames ──────────────────────────────────────────────────────────

impl From<&linesense_config::RawFrame> for RawReading {
    fn from(f: &linesense_config::RawFrame) -> Self {
        RawReading::from_slices(&f.on, f.off.as_deref())
    }
}
