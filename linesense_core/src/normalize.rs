//! Raw reading to calibrated 0..=1000 conversion.
//!
//! All arithmetic is done in `i64`, and the result is always clamped because
//! raw noise can land outside the calibrated envelope.

use crate::calibration::{CalibrationState, SensorCalibration};
use crate::config::LinePolarity;
use crate::fixed_point::{MILLI, clamp_to_u16};
use crate::types::{CALIBRATED_MAX, Readings};

/// Normalize one reading in line-present polarity (higher = more likely line).
///
/// `ambient_raw` is the emitter-off reading; it is only used when the
/// sensor's ambient bounds were observed during calibration. Degenerate
/// sensors read 0 for every input and either polarity.
pub fn normalize(
    raw: u16,
    calib: &SensorCalibration,
    ambient_raw: Option<u16>,
    polarity: LinePolarity,
) -> u16 {
    if calib.degenerate || !calib.on.has_span() {
        return 0;
    }
    let value = match ambient_raw {
        Some(off) if calib.off.observed() => ambient_value(raw, off, calib),
        _ => plain_value(raw, calib),
    };
    match polarity {
        LinePolarity::DarkLine => value,
        LinePolarity::LightLine => CALIBRATED_MAX - value,
    }
}

fn plain_value(raw: u16, calib: &SensorCalibration) -> u16 {
    let lo = i64::from(calib.on.min);
    let hi = i64::from(calib.on.max);
    scale(i64::from(raw) - lo, hi - lo)
}

fn ambient_value(on: u16, off: u16, calib: &SensorCalibration) -> u16 {
    let v_eff = i64::from(on) - i64::from(off);
    let lo_eff = i64::from(calib.on.min) - i64::from(calib.off.max);
    let mut hi_eff = i64::from(calib.on.max) - i64::from(calib.off.min);
    if hi_eff <= lo_eff {
        hi_eff = lo_eff + 1;
    }
    scale(v_eff - lo_eff, hi_eff - lo_eff)
}

#[inline]
fn scale(offset: i64, span: i64) -> u16 {
    if span <= 0 {
        return 0;
    }
    clamp_to_u16(offset * MILLI / span, CALIBRATED_MAX)
}

/// Row-level normalization with a fixed polarity and ambient setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizationEngine {
    pub polarity: LinePolarity,
    pub ambient: bool,
}

impl NormalizationEngine {
    pub fn new(polarity: LinePolarity, ambient: bool) -> Self {
        Self { polarity, ambient }
    }

    /// Normalize a full row. Output length is the shorter of the readings
    /// and the calibrated sensor count.
    pub fn normalize_row(
        &self,
        raw_on: &[u16],
        raw_off: Option<&[u16]>,
        calib: &CalibrationState,
    ) -> Readings {
        let off = if self.ambient { raw_off } else { None };
        raw_on
            .iter()
            .zip(calib.sensors())
            .enumerate()
            .map(|(i, (&raw, cal))| {
                let ambient_raw = off.and_then(|o| o.get(i).copied());
                normalize(raw, cal, ambient_raw, self.polarity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Bounds, CalibrationTracker};

    fn cal(min: u16, max: u16) -> SensorCalibration {
        SensorCalibration {
            on: Bounds { min, max },
            off: Bounds::sentinel(1023),
            degenerate: false,
        }
    }

    #[test]
    fn plain_form_scales_linearly() {
        let c = cal(100, 600);
        assert_eq!(normalize(100, &c, None, LinePolarity::DarkLine), 0);
        assert_eq!(normalize(350, &c, None, LinePolarity::DarkLine), 500);
        assert_eq!(normalize(600, &c, None, LinePolarity::DarkLine), 1000);
    }

    #[test]
    fn out_of_envelope_readings_clamp() {
        let c = cal(100, 600);
        assert_eq!(normalize(20, &c, None, LinePolarity::DarkLine), 0);
        assert_eq!(normalize(1023, &c, None, LinePolarity::DarkLine), 1000);
    }

    #[test]
    fn light_line_inverts() {
        let c = cal(100, 600);
        assert_eq!(normalize(100, &c, None, LinePolarity::LightLine), 1000);
        assert_eq!(normalize(475, &c, None, LinePolarity::LightLine), 250);
    }

    #[test]
    fn degenerate_reads_zero_in_both_polarities() {
        let mut t = CalibrationTracker::new(1, 1023, false);
        t.observe(&[512], None);
        let state = t.finalize();
        let c = &state.sensors()[0];
        for raw in [0, 1, 512, 1023] {
            assert_eq!(normalize(raw, c, None, LinePolarity::DarkLine), 0);
            assert_eq!(normalize(raw, c, None, LinePolarity::LightLine), 0);
        }
    }

    #[test]
    fn ambient_form_subtracts_background() {
        // on in [300, 900], off in [50, 100]: lo_eff = 200, hi_eff = 850
        let c = SensorCalibration {
            on: Bounds { min: 300, max: 900 },
            off: Bounds { min: 50, max: 100 },
            degenerate: false,
        };
        assert_eq!(normalize(300, &c, Some(100), LinePolarity::DarkLine), 0);
        assert_eq!(normalize(900, &c, Some(50), LinePolarity::DarkLine), 1000);
        // v_eff = 525 - 0 -> (525 - 200) * 1000 / 650 = 500
        assert_eq!(normalize(525, &c, Some(0), LinePolarity::DarkLine), 500);
    }

    #[test]
    fn ambient_ignored_when_off_bounds_never_seen() {
        let c = cal(100, 600);
        assert_eq!(
            normalize(350, &c, Some(300), LinePolarity::DarkLine),
            normalize(350, &c, None, LinePolarity::DarkLine)
        );
    }

    #[test]
    fn ambient_narrow_effective_span() {
        // lo_eff = 500 - 450 = 50, hi_eff = 501 - 450 = 51
        let c = SensorCalibration {
            on: Bounds { min: 500, max: 501 },
            off: Bounds { min: 450, max: 450 },
            degenerate: false,
        };
        assert_eq!(normalize(500, &c, Some(450), LinePolarity::DarkLine), 0);
        assert_eq!(normalize(501, &c, Some(450), LinePolarity::DarkLine), 1000);
        assert_eq!(normalize(501, &c, Some(0), LinePolarity::DarkLine), 1000);
    }

    #[test]
    fn row_normalization_respects_ambient_flag() {
        let mut t = CalibrationTracker::new(2, 1023, true);
        t.observe(&[100, 100], Some(&[0, 0]));
        t.observe(&[600, 600], Some(&[50, 50]));
        let state = t.finalize().clone();

        let plain = NormalizationEngine::new(LinePolarity::DarkLine, false);
        let row = plain.normalize_row(&[350, 600], Some(&[50, 50]), &state);
        assert_eq!(row.as_slice(), &[500, 1000]);

        let amb = NormalizationEngine::new(LinePolarity::DarkLine, true);
        // lo_eff = 100 - 50 = 50, hi_eff = 600 - 0 = 600
        let row = amb.normalize_row(&[350, 600], Some(&[50, 0]), &state);
        assert_eq!(row.as_slice(), &[454, 1000]);
    }
}
