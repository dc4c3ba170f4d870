//! Raspberry Pi backends over `rppal`.
//!
//! - `Mcp3008Source`: analog reflectance boards wired to an MCP3008 ADC on SPI0.
//! - `RcDischargeSource`: RC (QTR-RC style) sensors on GPIO, timed discharge.

use std::time::Duration;

use linesense_traits::{BoxError, SampleSource};
use rppal::gpio::{Gpio, IoPin, Mode, OutputPin};
use rppal::spi::{self, Bus, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::discharge_time_us;

/// Time the RC node is driven high before discharge timing starts.
const CHARGE_TIME: Duration = Duration::from_micros(10);

fn open_emitter(gpio: &Gpio, pin: Option<u8>) -> Result<Option<OutputPin>> {
    pin.map(|p| {
        gpio.get(p)
            .map(|pin| pin.into_output_high())
            .map_err(|e| HwError::Gpio(format!("open emitter pin {p}: {e}")))
    })
    .transpose()
}

fn drive_emitter(emitter: &mut Option<OutputPin>, on: bool) {
    if let Some(pin) = emitter.as_mut() {
        if on {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }
}

/// MCP3008 8-channel 10-bit ADC.
pub struct Mcp3008Source {
    spi: Spi,
    emitter: Option<OutputPin>,
}

impl Mcp3008Source {
    pub fn new(clock_hz: u32, emitter_pin: Option<u8>) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, clock_hz, spi::Mode::Mode0)
            .map_err(|e| HwError::Spi(format!("open spi0: {e}")))?;
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let emitter = open_emitter(&gpio, emitter_pin)?;
        Ok(Self { spi, emitter })
    }

    fn convert(&mut self, channel: u8) -> Result<u16> {
        if channel > 7 {
            return Err(HwError::ChannelOutOfRange(channel));
        }
        // Start bit, single-ended mode, channel select.
        let tx = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        trace!(channel, raw, "mcp3008 conversion");
        Ok(raw)
    }
}

impl SampleSource for Mcp3008Source {
    fn sample_analog(&mut self, channel: u8) -> std::result::Result<u16, BoxError> {
        Ok(self.convert(channel)?)
    }

    fn sample_timed(
        &mut self,
        _channel: u8,
        _timeout: Duration,
    ) -> std::result::Result<u16, BoxError> {
        Err(Box::new(HwError::Unsupported("timed")))
    }

    fn set_emitter(&mut self, on: bool) -> std::result::Result<(), BoxError> {
        drive_emitter(&mut self.emitter, on);
        Ok(())
    }
}

/// RC discharge sensors, one GPIO per sensor; channel = index into `pins`.
pub struct RcDischargeSource {
    pins: Vec<IoPin>,
    emitter: Option<OutputPin>,
}

impl RcDischargeSource {
    pub fn new(pins: &[u8], emitter_pin: Option<u8>) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pins = pins
            .iter()
            .map(|&p| {
                gpio.get(p)
                    .map(|pin| pin.into_io(Mode::Input))
                    .map_err(|e| HwError::Gpio(format!("open sensor pin {p}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let emitter = open_emitter(&gpio, emitter_pin)?;
        Ok(Self { pins, emitter })
    }

    fn time_discharge(&mut self, channel: u8, timeout: Duration) -> Result<u16> {
        let pin = self
            .pins
            .get_mut(usize::from(channel))
            .ok_or(HwError::ChannelOutOfRange(channel))?;
        pin.set_mode(Mode::Output);
        pin.set_high();
        std::thread::sleep(CHARGE_TIME);
        pin.set_mode(Mode::Input);
        let t = discharge_time_us(|| pin.is_high(), timeout);
        trace!(channel, discharge_us = t, "rc discharge");
        Ok(t)
    }
}

impl SampleSource for RcDischargeSource {
    fn sample_analog(&mut self, _channel: u8) -> std::result::Result<u16, BoxError> {
        Err(Box::new(HwError::Unsupported("analog")))
    }

    fn sample_timed(
        &mut self,
        channel: u8,
        timeout: Duration,
    ) -> std::result::Result<u16, BoxError> {
        Ok(self.time_discharge(channel, timeout)?)
    }

    fn set_emitter(&mut self, on: bool) -> std::result::Result<(), BoxError> {
        drive_emitter(&mut self.emitter, on);
        Ok(())
    }
}
