//! Per-cycle line/background flags.

use std::fmt;
use std::str::FromStr;

use crate::types::MAX_SENSORS;

/// One flag per active sensor, index 0 leftmost. `true` = line detected.
///
/// Stored as a bit mask so it is `Copy` and cheap to carry across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BitVector {
    mask: u16,
    len: u8,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ParseBitsError {
    #[error("invalid bit character {0:?} (expected '0' or '1')")]
    InvalidChar(char),
    #[error("bit vector longer than {MAX_SENSORS} sensors")]
    TooLong,
}

impl BitVector {
    pub const fn new() -> Self {
        Self { mask: 0, len: 0 }
    }

    /// Append one flag. Returns `false` (and drops the flag) once full.
    pub fn push(&mut self, bit: bool) -> bool {
        if usize::from(self.len) >= MAX_SENSORS {
            return false;
        }
        if bit {
            self.mask |= 1 << self.len;
        }
        self.len += 1;
        true
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len()).then(|| self.mask & (1 << index) != 0)
    }

    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_ones(&self) -> u32 {
        self.mask.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(move |i| self.mask & (1 << i) != 0)
    }

    /// Same flags, right to left.
    pub fn mirrored(&self) -> Self {
        let mut out = Self::new();
        for i in (0..self.len()).rev() {
            out.push(self.mask & (1 << i) != 0);
        }
        out
    }

    /// Raw mask, bit `i` = sensor `i`.
    pub fn as_mask(&self) -> u16 {
        self.mask
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut out = Self::new();
        for b in iter {
            if !out.push(b) {
                break;
            }
        }
        out
    }
}

impl FromStr for BitVector {
    type Err = ParseBitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Self::new();
        for c in s.chars() {
            let bit = match c {
                '0' => false,
                '1' => true,
                other => return Err(ParseBitsError::InvalidChar(other)),
            };
            if !out.push(bit) {
                return Err(ParseBitsError::TooLong);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.iter() {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        let b: BitVector = "00011000".parse().unwrap();
        assert_eq!(b.len(), 8);
        assert_eq!(b.count_ones(), 2);
        assert_eq!(b.get(3), Some(true));
        assert_eq!(b.get(8), None);
        assert_eq!(b.to_string(), "00011000");
    }

    #[test]
    fn leading_zeros_are_kept() {
        let b: BitVector = "0000".parse().unwrap();
        assert_eq!(b.len(), 4);
        assert!(!b.is_empty());
        assert_eq!(b.to_string(), "0000");
    }

    #[test]
    fn mirror_reverses_order() {
        let b: BitVector = "00000111".parse().unwrap();
        assert_eq!(b.mirrored().to_string(), "11100000");
        assert_eq!(b.mirrored().mirrored(), b);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "0102".parse::<BitVector>(),
            Err(ParseBitsError::InvalidChar('2'))
        );
        let long = "0".repeat(MAX_SENSORS + 1);
        assert_eq!(long.parse::<BitVector>(), Err(ParseBitsError::TooLong));
    }

    #[test]
    fn collect_stops_at_capacity() {
        let b: BitVector = std::iter::repeat(true).take(MAX_SENSORS + 3).collect();
        assert_eq!(b.len(), MAX_SENSORS);
    }
}
