//! Per-sensor min/max range tracking.
//!
//! Bounds start at sentinel extremes (`min = raw_max`, `max = 0`) so the first
//! observation always widens them. `finalize` replaces any range that never
//! opened up with the full raw domain and marks the sensor degenerate, so no
//! consumer of the bounds ever divides by a non-positive span.

use crate::types::MAX_SENSORS;

/// Observed raw range of one sensor under one emitter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u16,
    pub max: u16,
}

impl Bounds {
    pub const fn sentinel(raw_max: u16) -> Self {
        Self { min: raw_max, max: 0 }
    }

    #[inline]
    pub fn widen(&mut self, raw: u16) {
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
    }

    /// At least one sample has been seen.
    #[inline]
    pub fn observed(&self) -> bool {
        self.max >= self.min
    }

    /// Strictly positive width.
    #[inline]
    pub fn has_span(&self) -> bool {
        self.max > self.min
    }
}

/// Calibration of a single sensor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCalibration {
    /// Emitter-on range.
    pub on: Bounds,
    /// Emitter-off (ambient) range; stays at the sentinel unless ambient mode is on.
    pub off: Bounds,
    /// Set by `finalize` when `on` never opened up; normalizes to 0.
    pub degenerate: bool,
}

impl SensorCalibration {
    const fn sentinel(raw_max: u16) -> Self {
        Self {
            on: Bounds::sentinel(raw_max),
            off: Bounds::sentinel(raw_max),
            degenerate: false,
        }
    }
}

/// Read-only view of the whole array's calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationState {
    sensors: heapless::Vec<SensorCalibration, MAX_SENSORS>,
    raw_max: u16,
    ambient: bool,
    finalized: bool,
    observations: u32,
}

impl CalibrationState {
    pub fn sensors(&self) -> &[SensorCalibration] {
        &self.sensors
    }

    pub fn sensor(&self, index: usize) -> Option<&SensorCalibration> {
        self.sensors.get(index)
    }

    pub fn raw_max(&self) -> u16 {
        self.raw_max
    }

    pub fn ambient(&self) -> bool {
        self.ambient
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of `observe` calls since the last reset.
    pub fn observations(&self) -> u32 {
        self.observations
    }

    /// Sensors whose range never opened up.
    pub fn degenerate_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.degenerate).count()
    }
}

/// Accumulates `CalibrationState` during the calibration phase.
#[derive(Debug, Clone)]
pub struct CalibrationTracker {
    state: CalibrationState,
}

impl CalibrationTracker {
    /// Tracker for `sensors` slots (clamped to `MAX_SENSORS`) over `[0, raw_max]`.
    pub fn new(sensors: usize, raw_max: u16, ambient: bool) -> Self {
        let raw_max = raw_max.max(1);
        let sensors = (0..sensors.min(MAX_SENSORS))
            .map(|_| SensorCalibration::sentinel(raw_max))
            .collect();
        Self {
            state: CalibrationState {
                sensors,
                raw_max,
                ambient,
                finalized: false,
                observations: 0,
            },
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Return every sensor to sentinel bounds and reopen the tracker.
    pub fn reset(&mut self) {
        let raw_max = self.state.raw_max;
        for s in self.state.sensors.iter_mut() {
            *s = SensorCalibration::sentinel(raw_max);
        }
        self.state.finalized = false;
        self.state.observations = 0;
    }

    /// Widen bounds with one sweep of readings.
    ///
    /// `raw_off` is only used in ambient mode. Extra values beyond the sensor
    /// count are ignored. A finalized tracker is left untouched until `reset`.
    pub fn observe(&mut self, raw_on: &[u16], raw_off: Option<&[u16]>) {
        if self.state.finalized {
            tracing::warn!("calibration observe after finalize ignored; reset first");
            return;
        }
        for (s, &raw) in self.state.sensors.iter_mut().zip(raw_on) {
            s.on.widen(raw);
        }
        if self.state.ambient
            && let Some(off) = raw_off
        {
            for (s, &raw) in self.state.sensors.iter_mut().zip(off) {
                s.off.widen(raw);
            }
        }
        self.state.observations = self.state.observations.saturating_add(1);
    }

    /// Close the calibration phase. Idempotent.
    pub fn finalize(&mut self) -> &CalibrationState {
        if self.state.finalized {
            return &self.state;
        }
        let raw_max = self.state.raw_max;
        for (i, s) in self.state.sensors.iter_mut().enumerate() {
            if !s.on.has_span() {
                tracing::warn!(
                    sensor = i,
                    min = s.on.min,
                    max = s.on.max,
                    "sensor range never opened; using full scale and reporting 0"
                );
                s.on = Bounds { min: 0, max: raw_max };
                s.degenerate = true;
            }
        }
        self.state.finalized = true;
        tracing::debug!(
            observations = self.state.observations,
            degenerate = self.state.degenerate_count(),
            "calibration finalized"
        );
        &self.state
    }
}
