//! Fixed-capacity containers shared across the pipeline.

/// Sensor slots per array.
pub const MAX_SENSORS: usize = if cfg!(feature = "compact") { 8 } else { 16 };

/// Upper end of the calibrated scale.
pub const CALIBRATED_MAX: u16 = 1000;

/// One value per active sensor, left to right.
pub type Readings = heapless::Vec<u16, MAX_SENSORS>;

/// Hardware channel per active slot.
pub type Channels = heapless::Vec<u8, MAX_SENSORS>;

/// Raw sample of the whole row, optionally with an emitter-off companion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReading {
    pub on: Readings,
    pub off: Option<Readings>,
}

impl RawReading {
    /// Build from slices, keeping at most `MAX_SENSORS` values of each.
    pub fn from_slices(on: &[u16], off: Option<&[u16]>) -> Self {
        Self {
            on: truncated(on),
            off: off.map(truncated),
        }
    }
}

pub(crate) fn truncated(values: &[u16]) -> Readings {
    values.iter().copied().take(MAX_SENSORS).collect()
}
