//! Runtime configuration types for the sensor pipeline.
//!
//! These are the structs used by `LineSensor`. They are separate from the
//! TOML-deserialized config in `linesense_config`.

use std::time::Duration;

/// Default centroid gain in milli-units (2.0).
pub const DEFAULT_CENTROID_GAIN_MILLI: i64 = 2000;

/// How raw readings are obtained from the `SampleSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Averaged ADC conversions in `[0, raw_max]`.
    Analog { raw_max: u16 },
    /// RC discharge time in µs, capped at `timeout_us` (which is also the raw full scale).
    Timed { timeout_us: u16 },
}

impl SamplingMode {
    /// Largest raw value this mode can produce.
    pub fn raw_max(&self) -> u16 {
        match *self {
            SamplingMode::Analog { raw_max } => raw_max.max(1),
            SamplingMode::Timed { timeout_us } => timeout_us.max(1),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match *self {
            SamplingMode::Analog { .. } => None,
            SamplingMode::Timed { timeout_us } => {
                Some(Duration::from_micros(u64::from(timeout_us.max(1))))
            }
        }
    }
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Analog { raw_max: 1023 }
    }
}

/// Resolution of calibrated values strictly between the two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrayZonePolicy {
    /// Borderline readings count as floor.
    #[default]
    Background,
    /// Borderline readings count as line.
    Line,
}

/// Binary thresholds on the calibrated 0..=1000 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// At or below: background.
    pub white: u16,
    /// At or above: line.
    pub black: u16,
    pub gray_zone: GrayZonePolicy,
}

impl Thresholds {
    pub const fn new(white: u16, black: u16) -> Self {
        Self {
            white,
            black,
            gray_zone: GrayZonePolicy::Background,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(300, 700)
    }
}

/// Which side of the contrast is the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePolarity {
    /// Dark line on a light floor: high raw (little reflection) means line.
    #[default]
    DarkLine,
    /// Light line on a dark floor: calibrated values are inverted.
    LightLine,
}

/// Discrete classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierCfg {
    /// Gain applied to the centroid offset, expressed in 8-sensor space.
    pub centroid_gain: f32,
}

impl Default for ClassifierCfg {
    fn default() -> Self {
        Self { centroid_gain: 2.0 }
    }
}

/// Everything a `LineSensor` needs besides its source.
#[derive(Debug, Clone)]
pub struct SensorCfg {
    /// Hardware channel per slot, left to right. Truncated to `MAX_SENSORS`.
    pub channels: Vec<u8>,
    /// Samples averaged per reading; 0 is coerced to 1.
    pub samples_per_sensor: u8,
    pub sampling: SamplingMode,
    pub thresholds: Thresholds,
    pub polarity: LinePolarity,
    /// Also sample with the emitter off and subtract ambient light.
    pub ambient: bool,
    pub classifier: ClassifierCfg,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            samples_per_sensor: 4,
            sampling: SamplingMode::default(),
            thresholds: Thresholds::default(),
            polarity: LinePolarity::default(),
            ambient: false,
            classifier: ClassifierCfg::default(),
        }
    }
}

/// Decision-cycle pacing for `runner::run_cycles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    pub cycle_hz: u32,
    /// 0 runs until the stop flag is raised.
    pub max_cycles: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            cycle_hz: 100,
            max_cycles: 0,
        }
    }
}

/// How long the calibration phase samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPlan {
    /// Fixed number of sweeps (at least one).
    Iterations(u32),
    /// Sweep until the budget elapses (at least one sweep).
    Duration(Duration),
}

impl Default for CalibrationPlan {
    fn default() -> Self {
        CalibrationPlan::Duration(Duration::from_millis(3000))
    }
}
