pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every hardware trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Supplier of raw reflectance readings, one channel at a time.
///
/// A source usually backs only one of the two sampling strategies; the other
/// should return an "unsupported" error. Both calls must return within a
/// bounded time.
pub trait SampleSource {
    /// One ADC conversion of `channel`, in `[0, raw_max]` of the converter.
    fn sample_analog(&mut self, channel: u8) -> Result<u16, BoxError>;

    /// RC discharge time of `channel` in microseconds, capped at `timeout`.
    fn sample_timed(
        &mut self,
        channel: u8,
        timeout: std::time::Duration,
    ) -> Result<u16, BoxError>;

    /// Switch the IR emitter bank. Sources without an emitter return `Ok(())`.
    fn set_emitter(&mut self, on: bool) -> Result<(), BoxError>;
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn sample_analog(&mut self, channel: u8) -> Result<u16, BoxError> {
        (**self).sample_analog(channel)
    }

    fn sample_timed(
        &mut self,
        channel: u8,
        timeout: std::time::Duration,
    ) -> Result<u16, BoxError> {
        (**self).sample_timed(channel, timeout)
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), BoxError> {
        (**self).set_emitter(on)
    }
}
