//! The `LineSensor` facade: sampling, calibration phase and the per-cycle pipeline.

use std::time::Duration;

use eyre::WrapErr;
use linesense_traits::{Clock, SampleSource};

use crate::bits::BitVector;
use crate::calibration::{CalibrationState, CalibrationTracker};
use crate::classify::classify_row;
use crate::config::{CalibrationPlan, SamplingMode, Thresholds};
use crate::discrete::DiscreteErrorClassifier;
use crate::error::{LineSenseError, Result};
use crate::gap::is_gap;
use crate::hw_error::map_hw_error;
use crate::normalize::NormalizationEngine;
use crate::position::PositionEstimator;
use crate::status::Phase;
use crate::types::{Channels, RawReading, Readings};

/// Pause between duration-bounded calibration sweeps.
pub const CALIBRATION_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Result of one decision cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReading {
    /// Calibrated values, 0..=1000, higher = more line.
    pub calibrated: Readings,
    pub bits: BitVector,
    /// Discrete error in whole steps (−7..=7); feed back as `last_steps`.
    pub steps: i8,
    /// `steps` × 1000.
    pub error_milli: i32,
    /// Weighted-centroid position in `[0, (n-1)*1000]`.
    pub position: u32,
    pub gap: bool,
}

/// A row of reflectance sensors behind one `SampleSource`.
///
/// Generic over the source for static dispatch; `LineSensor` without a type
/// argument boxes it.
pub struct LineSensor<S: SampleSource = Box<dyn SampleSource>> {
    pub(crate) source: S,
    pub(crate) channels: Channels,
    pub(crate) samples: u8,
    pub(crate) sampling: SamplingMode,
    pub(crate) thresholds: Thresholds,
    pub(crate) engine: NormalizationEngine,
    pub(crate) classifier: DiscreteErrorClassifier,
    pub(crate) tracker: CalibrationTracker,
    pub(crate) position: PositionEstimator,
    pub(crate) last_bits: BitVector,
    pub(crate) phase: Phase,
}

impl<S: SampleSource> core::fmt::Debug for LineSensor<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineSensor")
            .field("channels", &self.channels)
            .field("sampling", &self.sampling)
            .field("phase", &self.phase)
            .field("last_bits", &self.last_bits.to_string())
            .finish_non_exhaustive()
    }
}

impl<S: SampleSource> LineSensor<S> {
    pub fn sensor_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[u8] {
        &self.channels
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn calibration(&self) -> &CalibrationState {
        self.tracker.state()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Bit vector from the most recent binary or line read.
    pub fn bits(&self) -> &BitVector {
        &self.last_bits
    }

    pub fn last_position(&self) -> u32 {
        self.position.last_position()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    // ── Sampling ─────────────────────────────────────────────────────────────

    /// Sample every channel, averaging `samples_per_sensor` reads each
    /// (integer mean, truncated).
    ///
    /// In ambient mode the row is sampled a second time with the emitter
    /// off; the emitter is switched back on before returning.
    pub fn read_raw(&mut self) -> Result<RawReading> {
        if self.channels.is_empty() {
            return Ok(RawReading::default());
        }
        if !self.engine.ambient {
            let on = self.sample_row()?;
            return Ok(RawReading { on, off: None });
        }
        self.emitter(true)?;
        let on = self.sample_row()?;
        self.emitter(false)?;
        let off = self.sample_row();
        self.emitter(true)?;
        Ok(RawReading { on, off: Some(off?) })
    }

    fn emitter(&mut self, on: bool) -> Result<()> {
        self.source
            .set_emitter(on)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("switching emitter {}", if on { "on" } else { "off" }))
    }

    fn sample_row(&mut self) -> Result<Readings> {
        let raw_max = u32::from(self.sampling.raw_max());
        let n = u32::from(self.samples.max(1));
        let mut row = Readings::new();
        for i in 0..self.channels.len() {
            let ch = self.channels[i];
            let mut sum: u32 = 0;
            for _ in 0..n {
                sum += u32::from(self.sample_one(ch)?);
            }
            let avg = (sum / n).min(raw_max) as u16;
            // Capacity matches `channels`, so this never drops a value.
            let _ = row.push(avg);
        }
        tracing::trace!(raw = ?row.as_slice(), "row sampled");
        Ok(row)
    }

    fn sample_one(&mut self, channel: u8) -> Result<u16> {
        let raw = match self.sampling {
            SamplingMode::Analog { .. } => self.source.sample_analog(channel),
            SamplingMode::Timed { timeout_us } => self
                .source
                .sample_timed(channel, Duration::from_micros(u64::from(timeout_us.max(1)))),
        };
        raw.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("sampling channel {channel}"))
    }

    // ── Calibration ──────────────────────────────────────────────────────────

    /// Enter the calibration phase with fresh bounds.
    pub fn begin_calibration(&mut self) {
        self.tracker.reset();
        self.position.reset();
        self.last_bits = BitVector::new();
        self.phase = Phase::Calibrating;
        tracing::debug!(sensors = self.channels.len(), "calibration started");
    }

    fn require_calibrating(&self, op: &str) -> Result<()> {
        if self.phase != Phase::Calibrating {
            return Err(eyre::Report::new(LineSenseError::State(format!(
                "{op} outside calibration; call begin_calibration first"
            ))));
        }
        Ok(())
    }

    /// Take one sample sweep and widen the bounds with it.
    pub fn calibrate_step(&mut self) -> Result<()> {
        self.require_calibrating("calibrate_step")?;
        let raw = self.read_raw().wrap_err("calibration sweep")?;
        self.tracker.observe(&raw.on, raw.off.as_deref());
        tracing::trace!(
            sweep = self.tracker.state().observations(),
            raw = ?raw.on.as_slice(),
            "calibration sweep"
        );
        Ok(())
    }

    /// Widen the bounds with a pre-recorded frame instead of sampling.
    pub fn observe_frame(&mut self, frame: &RawReading) -> Result<()> {
        self.require_calibrating("observe_frame")?;
        self.check_shape(frame)?;
        self.tracker.observe(&frame.on, frame.off.as_deref());
        Ok(())
    }

    /// Finalize the bounds and leave the calibration phase.
    pub fn finish_calibration(&mut self) -> &CalibrationState {
        self.phase = Phase::Ready;
        self.tracker.finalize()
    }

    /// Calibrate with exactly `iterations` sweeps (minimum one).
    pub fn calibrate_iterations(&mut self, iterations: u32) -> Result<&CalibrationState> {
        self.begin_calibration();
        for _ in 0..iterations.max(1) {
            self.calibrate_step()?;
        }
        Ok(self.finish_calibration())
    }

    /// Calibrate until `budget` has elapsed on `clock`, with at least one sweep.
    pub fn calibrate_for<C: Clock>(
        &mut self,
        budget: Duration,
        clock: &C,
    ) -> Result<&CalibrationState> {
        self.begin_calibration();
        let epoch = clock.now();
        loop {
            self.calibrate_step()?;
            if clock.expired(epoch, budget) {
                break;
            }
            clock.sleep(CALIBRATION_SWEEP_INTERVAL);
        }
        Ok(self.finish_calibration())
    }

    pub fn calibrate<C: Clock>(
        &mut self,
        plan: CalibrationPlan,
        clock: &C,
    ) -> Result<&CalibrationState> {
        match plan {
            CalibrationPlan::Iterations(n) => self.calibrate_iterations(n),
            CalibrationPlan::Duration(d) => self.calibrate_for(d, clock),
        }
    }

    /// Run a calibration phase over recorded frames.
    pub fn calibrate_from_frames(&mut self, frames: &[RawReading]) -> Result<&CalibrationState> {
        self.begin_calibration();
        for (i, frame) in frames.iter().enumerate() {
            self.observe_frame(frame)
                .wrap_err_with(|| format!("calibration frame {i}"))?;
        }
        Ok(self.finish_calibration())
    }

    fn ensure_ready(&mut self) -> Result<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Calibrating => Err(eyre::Report::new(LineSenseError::State(
                "read during calibration; call finish_calibration first".into(),
            ))),
            Phase::Uncalibrated => {
                tracing::warn!("reading before calibration; finalizing empty bounds");
                self.tracker.finalize();
                self.phase = Phase::Ready;
                Ok(())
            }
        }
    }

    fn check_shape(&self, frame: &RawReading) -> Result<()> {
        let expected = self.channels.len();
        let off_len = frame.off.as_ref().map_or(expected, |o| o.len());
        if frame.on.len() != expected || off_len != expected {
            let got = if frame.on.len() != expected {
                frame.on.len()
            } else {
                off_len
            };
            return Err(eyre::Report::new(LineSenseError::FrameShape { expected, got }));
        }
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Calibrated 0..=1000 values for a fresh sample.
    pub fn read_calibrated(&mut self) -> Result<Readings> {
        self.ensure_ready()?;
        let raw = self.read_raw()?;
        Ok(self.normalize(&raw))
    }

    fn normalize(&self, raw: &RawReading) -> Readings {
        self.engine
            .normalize_row(&raw.on, raw.off.as_deref(), self.tracker.state())
    }

    /// Replace the binary thresholds, keeping the gray-zone policy.
    pub fn set_binary_thresholds(&mut self, white: u16, black: u16) {
        if white >= black {
            tracing::warn!(white, black, "white threshold not below black; black wins on overlap");
        }
        self.thresholds.white = white;
        self.thresholds.black = black;
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Fresh bit vector, also stored for `bits()` and `gap_detection()`.
    pub fn read_binary(&mut self) -> Result<BitVector> {
        let calibrated = self.read_calibrated()?;
        let bits = classify_row(&calibrated, &self.thresholds);
        self.last_bits = bits;
        Ok(bits)
    }

    /// Full decision cycle on a fresh sample.
    pub fn read_line(&mut self, last_steps: i32) -> Result<LineReading> {
        self.ensure_ready()?;
        let raw = self.read_raw()?;
        Ok(self.evaluate(&raw, last_steps))
    }

    /// Full decision cycle on a supplied raw frame (replay, host-side sampling).
    pub fn process_frame(&mut self, frame: &RawReading, last_steps: i32) -> Result<LineReading> {
        self.ensure_ready()?;
        self.check_shape(frame)?;
        Ok(self.evaluate(frame, last_steps))
    }

    fn evaluate(&mut self, raw: &RawReading, last_steps: i32) -> LineReading {
        let calibrated = self.normalize(raw);
        let bits = classify_row(&calibrated, &self.thresholds);
        let steps = self.classifier.classify_steps(&bits, last_steps);
        let position = self.position.estimate(&calibrated);
        let gap = is_gap(&bits);
        self.last_bits = bits;
        tracing::trace!(%bits, steps, position, gap, "cycle");
        LineReading {
            calibrated,
            bits,
            steps,
            error_milli: i32::from(steps) * 1000,
            position,
            gap,
        }
    }

    /// Discrete error (×1000) for `bits`, or the last stored bit vector.
    pub fn compute_error_from_bits(&self, bits: Option<&BitVector>, last_steps: i32) -> i32 {
        self.classifier
            .classify_error(bits.unwrap_or(&self.last_bits), last_steps)
    }

    /// Gap check on the last stored bit vector.
    pub fn gap_detection(&self) -> bool {
        is_gap(&self.last_bits)
    }
}
