#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Line-sensor decision pipeline (hardware-agnostic).
//!
//! All hardware access goes through `linesense_traits::SampleSource`.
//!
//! ## Pipeline
//!
//! - **Calibration**: per-sensor min/max tracking, optionally with an
//!   emitter-off (ambient) range (`calibration`)
//! - **Normalization**: raw to 0..=1000, higher = more line (`normalize`)
//! - **Thresholding**: value to line/background bit with a gray-zone policy (`classify`)
//! - **Discrete error**: 8-sensor pattern table with centroid fallback (`discrete`)
//! - **Position**: weighted centroid over calibrated values (`position`)
//! - **Gap**: every examined sensor reads background (`gap`)
//!
//! `LineSensor` ties these together with a sampling source and a phase flag;
//! `runner` paces decision cycles.
//!
//! ## Fixed-Point Arithmetic
//!
//! Steering errors and positions are reported in milli-units (×1000) and
//! computed with integer arithmetic only, so mirrored inputs give exactly
//! negated errors.

pub mod bits;
pub mod builder;
pub mod calibration;
pub mod classify;
pub mod config;
pub mod conversions;
pub mod discrete;
pub mod error;
pub mod fixed_point;
pub mod gap;
pub mod hw_error;
pub mod mocks;
pub mod normalize;
pub mod position;
pub mod runner;
pub mod sensor;
pub mod status;
pub mod types;
pub mod util;

pub use bits::{BitVector, ParseBitsError};
pub use builder::{LineSensorBuilder, Missing, Set, build_line_sensor, build_line_sensor_with_table};
pub use calibration::{Bounds, CalibrationState, CalibrationTracker, SensorCalibration};
pub use classify::{Zone, classify, classify_row, zone};
pub use config::{
    CalibrationPlan, ClassifierCfg, GrayZonePolicy, LinePolarity, RunParams, SamplingMode,
    SensorCfg, Thresholds,
};
pub use discrete::{CANONICAL_PATTERNS, DiscreteErrorClassifier, PatternTable, TableError};
pub use error::{BuildError, LineSenseError, Report, Result};
pub use gap::is_gap;
pub use normalize::{NormalizationEngine, normalize};
pub use position::PositionEstimator;
pub use runner::{RunSummary, run_cycles, run_frames};
pub use sensor::{LineReading, LineSensor};
pub use status::Phase;
pub use types::{CALIBRATED_MAX, MAX_SENSORS, RawReading, Readings};
