//! Calibrated value to line/background bit.

use crate::bits::BitVector;
use crate::config::{GrayZonePolicy, Thresholds};

/// Three-way view of a calibrated value against the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Background,
    Gray,
    Line,
}

/// `value >= black` is line, `value <= white` is background, anything in
/// between is gray. `black` wins when the thresholds overlap.
pub fn zone(value: u16, t: &Thresholds) -> Zone {
    if value >= t.black {
        Zone::Line
    } else if value <= t.white {
        Zone::Background
    } else {
        Zone::Gray
    }
}

/// Binary line decision. Gray readings follow `t.gray_zone`.
pub fn classify(value: u16, t: &Thresholds) -> bool {
    match zone(value, t) {
        Zone::Line => true,
        Zone::Background => false,
        Zone::Gray => matches!(t.gray_zone, GrayZonePolicy::Line),
    }
}

pub fn classify_row(values: &[u16], t: &Thresholds) -> BitVector {
    values.iter().map(|&v| classify(v, t)).collect()
}
