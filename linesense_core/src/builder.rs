//! Type-state builder for `LineSensor` and the generic `build_line_sensor` constructor.
//!
//! `build()` is only available once a source has been provided; `try_build()`
//! is always available and reports the missing source at runtime.

use std::marker::PhantomData;

use eyre::WrapErr;
use linesense_traits::SampleSource;

use crate::bits::BitVector;
use crate::calibration::CalibrationTracker;
use crate::config::*;
use crate::discrete::{DiscreteErrorClassifier, PatternTable};
use crate::error::{BuildError, Result};
use crate::fixed_point::gain_to_milli;
use crate::normalize::NormalizationEngine;
use crate::position::PositionEstimator;
use crate::sensor::LineSensor;
use crate::status::Phase;
use crate::types::{Channels, MAX_SENSORS};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `LineSensor`.
pub struct LineSensorBuilder<S> {
    source: Option<Box<dyn SampleSource>>,
    cfg: SensorCfg,
    table: Option<PatternTable>,
    _s: PhantomData<S>,
}

impl Default for LineSensorBuilder<Missing> {
    fn default() -> Self {
        Self {
            source: None,
            cfg: SensorCfg::default(),
            table: None,
            _s: PhantomData,
        }
    }
}

impl LineSensor {
    /// Start building a boxed `LineSensor`.
    pub fn builder() -> LineSensorBuilder<Missing> {
        LineSensorBuilder::default()
    }
}

/// Clamp configuration misuse and assemble the sensor.
///
/// Shared by `LineSensorBuilder::try_build()` and `build_line_sensor()`.
fn validate_and_build<S: SampleSource>(
    mut source: S,
    cfg: SensorCfg,
    table: Option<PatternTable>,
) -> Result<LineSensor<S>> {
    if cfg.channels.len() > MAX_SENSORS {
        tracing::warn!(
            configured = cfg.channels.len(),
            max = MAX_SENSORS,
            "too many channels; extra sensors ignored"
        );
    }
    let channels: Channels = cfg.channels.iter().copied().take(MAX_SENSORS).collect();
    if channels.is_empty() {
        tracing::warn!("no channels configured; reads will be empty");
    }

    let samples = if cfg.samples_per_sensor == 0 {
        tracing::warn!("samples_per_sensor = 0 coerced to 1");
        1
    } else {
        cfg.samples_per_sensor
    };

    if cfg.thresholds.white >= cfg.thresholds.black {
        tracing::warn!(
            white = cfg.thresholds.white,
            black = cfg.thresholds.black,
            "white threshold not below black; black wins on overlap"
        );
    }

    let gain_milli = gain_to_milli(cfg.classifier.centroid_gain, DEFAULT_CENTROID_GAIN_MILLI);
    let table = table.unwrap_or_else(|| PatternTable::canonical().clone());

    source
        .set_emitter(true)
        .map_err(|e| eyre::Report::new(crate::hw_error::map_hw_error(&*e)))
        .wrap_err("enabling emitter")?;

    tracing::debug!(
        sensors = channels.len(),
        samples,
        sampling = ?cfg.sampling,
        ambient = cfg.ambient,
        gain_milli,
        "line sensor built"
    );

    Ok(LineSensor {
        source,
        tracker: CalibrationTracker::new(channels.len(), cfg.sampling.raw_max(), cfg.ambient),
        channels,
        samples,
        sampling: cfg.sampling,
        thresholds: cfg.thresholds,
        engine: NormalizationEngine::new(cfg.polarity, cfg.ambient),
        classifier: DiscreteErrorClassifier::new(table, gain_milli),
        position: PositionEstimator::new(),
        last_bits: BitVector::new(),
        phase: Phase::Uncalibrated,
    })
}

impl<S> LineSensorBuilder<S> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<LineSensor> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        validate_and_build(source, self.cfg, self.table)
    }
}

/// Chainable setters that do not affect type-state.
impl<S> LineSensorBuilder<S> {
    /// Replace the whole configuration.
    pub fn with_config(mut self, cfg: SensorCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = u8>) -> Self {
        self.cfg.channels = channels.into_iter().collect();
        self
    }
    pub fn with_samples_per_sensor(mut self, n: u8) -> Self {
        self.cfg.samples_per_sensor = n;
        self
    }
    pub fn with_sampling(mut self, sampling: SamplingMode) -> Self {
        self.cfg.sampling = sampling;
        self
    }
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.cfg.thresholds = thresholds;
        self
    }
    pub fn with_polarity(mut self, polarity: LinePolarity) -> Self {
        self.cfg.polarity = polarity;
        self
    }
    pub fn with_ambient(mut self, ambient: bool) -> Self {
        self.cfg.ambient = ambient;
        self
    }
    pub fn with_classifier(mut self, classifier: ClassifierCfg) -> Self {
        self.cfg.classifier = classifier;
        self
    }
    /// Use a custom 8-sensor pattern table instead of the built-in one.
    pub fn with_pattern_table(mut self, table: PatternTable) -> Self {
        self.table = Some(table);
        self
    }
}

// Setter that advances type-state
impl LineSensorBuilder<Missing> {
    pub fn with_source(self, source: impl SampleSource + 'static) -> LineSensorBuilder<Set> {
        LineSensorBuilder {
            source: Some(Box::new(source)),
            cfg: self.cfg,
            table: self.table,
            _s: PhantomData,
        }
    }
}

impl LineSensorBuilder<Set> {
    /// Build the sensor. Only available once a source is set.
    pub fn build(self) -> Result<LineSensor> {
        self.try_build()
    }
}

/// Build a statically-dispatched `LineSensor<S>` from a concrete source.
pub fn build_line_sensor<S: SampleSource>(source: S, cfg: SensorCfg) -> Result<LineSensor<S>> {
    validate_and_build(source, cfg, None)
}

/// `build_line_sensor` with a custom pattern table.
pub fn build_line_sensor_with_table<S: SampleSource>(
    source: S,
    cfg: SensorCfg,
    table: PatternTable,
) -> Result<LineSensor<S>> {
    validate_and_build(source, cfg, Some(table))
}
