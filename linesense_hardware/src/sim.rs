//! Simulated reflectance array.
//!
//! Models a row of sensors spaced one index unit apart over a floor with a
//! single line. Higher raw values mean less reflected light (darker surface),
//! which is how both analog reflectance boards and RC discharge sensors behave.

use linesense_traits::{BoxError, SampleSource};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::HwError;
use crate::util::ceiling_us;

/// Full scale of the simulated 10-bit converter.
pub const SIM_RAW_MAX: u16 = 1023;

/// Shared handle used to move the simulated line while a sensor owns the array.
#[derive(Debug, Clone)]
pub struct LineHandle {
    position: Rc<Cell<f32>>,
    ambient: Rc<Cell<u16>>,
}

impl LineHandle {
    /// Place the line centre at `index` (sensor index units, may be fractional or off-array).
    pub fn set_position(&self, index: f32) {
        self.position.set(index);
    }

    pub fn position(&self) -> f32 {
        self.position.get()
    }

    /// Shift the line by `delta` index units.
    pub fn nudge(&self, delta: f32) {
        self.position.set(self.position.get() + delta);
    }

    /// Ambient light level added to every reading.
    pub fn set_ambient(&self, level: u16) {
        self.ambient.set(level);
    }
}

/// Simulated sensor row implementing both sampling strategies.
#[derive(Debug)]
pub struct SimulatedArray {
    sensors: u8,
    line: LineHandle,
    /// Raw level over bare floor.
    floor_raw: u16,
    /// Raw level directly over the line.
    line_raw: u16,
    /// Line half width in index units.
    half_width: f32,
    noise: u16,
    rng: u32,
    emitter_on: bool,
    sweep: Option<Sweep>,
}

/// Sinusoidal line motion around the array centre.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    amplitude: f32,
    period: u32,
    tick: u32,
}

impl SimulatedArray {
    pub fn new(sensors: u8) -> Self {
        Self {
            sensors,
            line: LineHandle {
                position: Rc::new(Cell::new(f32::from(sensors.saturating_sub(1)) / 2.0)),
                ambient: Rc::new(Cell::new(0)),
            },
            floor_raw: 90,
            line_raw: 900,
            half_width: 1.0,
            noise: 0,
            rng: 0x9E37_79B9,
            emitter_on: true,
            sweep: None,
        }
    }

    /// Move the line automatically: one step per emitter-on conversion of
    /// channel 0, a full period every `period` steps.
    pub fn with_sweep(mut self, amplitude: f32, period: u32) -> Self {
        self.sweep = Some(Sweep {
            amplitude,
            period: period.max(1),
            tick: 0,
        });
        self
    }

    fn centre(&self) -> f32 {
        f32::from(self.sensors.saturating_sub(1)) / 2.0
    }

    fn advance(&mut self, channel: u8) {
        if channel != 0 || !self.emitter_on {
            return;
        }
        let centre = self.centre();
        if let Some(sw) = self.sweep.as_mut() {
            let phase = sw.tick as f32 / sw.period as f32 * std::f32::consts::TAU;
            self.line.set_position(centre + sw.amplitude * phase.sin());
            sw.tick = (sw.tick + 1) % sw.period;
        }
    }

    /// Peak-to-peak pseudo-random noise added to each sample.
    pub fn with_noise(mut self, amplitude: u16) -> Self {
        self.noise = amplitude;
        self
    }

    /// Raw levels seen over floor and over line.
    pub fn with_levels(mut self, floor_raw: u16, line_raw: u16) -> Self {
        self.floor_raw = floor_raw.min(SIM_RAW_MAX);
        self.line_raw = line_raw.min(SIM_RAW_MAX);
        self
    }

    pub fn with_half_width(mut self, half_width: f32) -> Self {
        self.half_width = half_width.max(0.05);
        self
    }

    /// Handle for steering the simulated line.
    pub fn line(&self) -> LineHandle {
        self.line.clone()
    }

    pub fn emitter_on(&self) -> bool {
        self.emitter_on
    }

    fn next_noise(&mut self) -> i32 {
        if self.noise == 0 {
            return 0;
        }
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        let span = u32::from(self.noise) + 1;
        (x % span) as i32 - i32::from(self.noise / 2)
    }

    fn level(&mut self, channel: u8) -> Result<u16, HwError> {
        if channel >= self.sensors {
            return Err(HwError::ChannelOutOfRange(channel));
        }
        let ambient = i32::from(self.line.ambient.get());
        let reflected = if self.emitter_on {
            let dist = (f32::from(channel) - self.line.position()).abs();
            let cover = (1.0 - dist / self.half_width).clamp(0.0, 1.0);
            let floor = f32::from(self.floor_raw);
            (floor + cover * (f32::from(self.line_raw) - floor)) as i32
        } else {
            0
        };
        let v = reflected + ambient + self.next_noise();
        Ok(v.clamp(0, i32::from(SIM_RAW_MAX)) as u16)
    }
}

impl SampleSource for SimulatedArray {
    fn sample_analog(&mut self, channel: u8) -> Result<u16, BoxError> {
        self.advance(channel);
        let v = self.level(channel)?;
        tracing::trace!(channel, raw = v, "sim analog sample");
        Ok(v)
    }

    fn sample_timed(&mut self, channel: u8, timeout: Duration) -> Result<u16, BoxError> {
        self.advance(channel);
        let ceiling = u32::from(ceiling_us(timeout));
        let v = u32::from(self.level(channel)?);
        let t = (v * ceiling / u32::from(SIM_RAW_MAX)) as u16;
        tracing::trace!(channel, discharge_us = t, "sim timed sample");
        Ok(t)
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), BoxError> {
        self.emitter_on = on;
        Ok(())
    }
}
