//! Continuous line position from calibrated values.

use crate::fixed_point::MILLI;

/// Weighted-centroid position in `[0, (n-1)*1000]`, remembering the last
/// result for the line-lost fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionEstimator {
    last: u32,
}

impl PositionEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_position(&self) -> u32 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }

    /// Estimate from calibrated values (higher = more line).
    ///
    /// When every value is 0 the result snaps to the end of the array
    /// nearest the previous estimate. The result is always stored.
    pub fn estimate(&mut self, calibrated: &[u16]) -> u32 {
        if calibrated.is_empty() {
            self.last = 0;
            return 0;
        }
        let mut weighted: u64 = 0;
        let mut total: u64 = 0;
        for (i, &v) in calibrated.iter().enumerate() {
            weighted += u64::from(v) * i as u64 * MILLI as u64;
            total += u64::from(v);
        }
        let far_end = (calibrated.len() as u32 - 1) * MILLI as u32;
        let pos = if total == 0 {
            if self.last < far_end / 2 { 0 } else { far_end }
        } else {
            (weighted / total) as u32
        };
        tracing::trace!(position = pos, total, "position estimate");
        self.last = pos;
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_line() {
        let mut p = PositionEstimator::new();
        assert_eq!(p.estimate(&[0, 0, 0, 1000, 1000, 0, 0, 0]), 3500);
    }

    #[test]
    fn single_sensor_positions() {
        let mut p = PositionEstimator::new();
        assert_eq!(p.estimate(&[1000, 0, 0, 0, 0]), 0);
        assert_eq!(p.estimate(&[0, 0, 0, 0, 1000]), 4000);
        assert_eq!(p.estimate(&[0, 500, 500, 0, 0]), 1500);
    }

    #[test]
    fn lost_line_snaps_to_nearest_end() {
        let mut p = PositionEstimator::new();
        p.estimate(&[0, 0, 0, 0, 0, 0, 900, 100]);
        assert_eq!(p.estimate(&[0; 8]), 7000);
        assert_eq!(p.last_position(), 7000);

        p.estimate(&[800, 200, 0, 0, 0, 0, 0, 0]);
        assert_eq!(p.estimate(&[0; 8]), 0);
    }

    #[test]
    fn midpoint_goes_to_far_end() {
        let mut p = PositionEstimator::new();
        p.estimate(&[0, 0, 1000, 0, 0]);
        assert_eq!(p.last_position(), 2000);
        assert_eq!(p.estimate(&[0; 5]), 4000);
    }

    #[test]
    fn empty_row_is_zero() {
        let mut p = PositionEstimator::new();
        p.estimate(&[0, 0, 1000]);
        assert_eq!(p.estimate(&[]), 0);
        assert_eq!(p.last_position(), 0);
    }
}
