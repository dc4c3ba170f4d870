//! Integer helpers for the fixed-point (×1000) steering units.
//!
//! The classifier works on exact rationals so that mirrored inputs produce
//! exactly negated outputs; floats are only touched when a config gain is
//! converted once at build time.

/// Milli-units per unit (steps, sensor-index positions, gains).
pub const MILLI: i64 = 1000;

/// `num / den` rounded to nearest with ties away from zero.
///
/// Returns 0 when `den == 0`. Odd-symmetric: `f(-n, d) == -f(n, d)`.
#[inline]
pub fn div_round_half_away(num: i64, den: i64) -> i64 {
    if den == 0 {
        return 0;
    }
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let half = den / 2;
    let mag = (num.unsigned_abs() + half.unsigned_abs()) / den.unsigned_abs();
    let mag = i64::try_from(mag).unwrap_or(i64::MAX);
    if num < 0 { -mag } else { mag }
}

/// Quantize a gain to milli-units, rounding to nearest. Non-finite or
/// non-positive gains map to `fallback_milli`.
#[inline]
pub fn gain_to_milli(gain: f32, fallback_milli: i64) -> i64 {
    if !gain.is_finite() || gain <= 0.0 {
        return fallback_milli;
    }
    let scaled = (f64::from(gain) * MILLI as f64).round();
    if scaled >= i64::MAX as f64 {
        i64::MAX
    } else {
        (scaled as i64).max(1)
    }
}

/// Clamp an `i64` into `[0, hi]` and narrow.
#[inline]
pub fn clamp_to_u16(v: i64, hi: u16) -> u16 {
    v.clamp(0, i64::from(hi)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_ties_away_from_zero() {
        assert_eq!(div_round_half_away(5, 2), 3);
        assert_eq!(div_round_half_away(-5, 2), -3);
        assert_eq!(div_round_half_away(7, 2), 4);
        assert_eq!(div_round_half_away(3, 2), 2);
        assert_eq!(div_round_half_away(1, 2), 1);
        assert_eq!(div_round_half_away(-1, 2), -1);
    }

    #[test]
    fn rounds_to_nearest_otherwise() {
        assert_eq!(div_round_half_away(10, 3), 3);
        assert_eq!(div_round_half_away(11, 3), 4);
        assert_eq!(div_round_half_away(-11, 3), -4);
        assert_eq!(div_round_half_away(0, 7), 0);
    }

    #[test]
    fn negative_denominator_and_zero() {
        assert_eq!(div_round_half_away(5, -2), -3);
        assert_eq!(div_round_half_away(-5, -2), 3);
        assert_eq!(div_round_half_away(42, 0), 0);
    }

    #[test]
    fn gain_quantization() {
        assert_eq!(gain_to_milli(2.0, 2000), 2000);
        assert_eq!(gain_to_milli(1.2345, 2000), 1235);
        assert_eq!(gain_to_milli(f32::NAN, 2000), 2000);
        assert_eq!(gain_to_milli(-1.0, 2000), 2000);
        assert_eq!(gain_to_milli(1e-9, 2000), 1);
    }

    #[test]
    fn clamp_narrowing() {
        assert_eq!(clamp_to_u16(-5, 1000), 0);
        assert_eq!(clamp_to_u16(1500, 1000), 1000);
        assert_eq!(clamp_to_u16(420, 1000), 420);
    }
}
