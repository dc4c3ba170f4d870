//! Discrete steering error in whole steps (−7..=7).
//!
//! Eight-sensor rows are looked up in a `PatternTable`; anything else falls
//! back to a centroid over the lit bits, rescaled into eight-sensor space.

use std::sync::OnceLock;

use crate::bits::BitVector;
use crate::config::DEFAULT_CENTROID_GAIN_MILLI;
use crate::fixed_point::{MILLI, div_round_half_away};

/// Largest step magnitude.
pub const MAX_STEP: i8 = 7;
/// Row width the pattern table is defined for.
pub const TABLE_WIDTH: usize = 8;
/// Largest centroid gain (×1000), matching the config limit of 16.0.
pub const MAX_GAIN_MILLI: i64 = 16_000;

/// Contiguous line segments, symmetric around the gap between sensors 3 and 4.
pub const CANONICAL_PATTERNS: [(&str, i8); 15] = [
    ("00000001", 7),
    ("00000011", 6),
    ("00000111", 5),
    ("00000110", 4),
    ("00001110", 3),
    ("00001100", 2),
    ("00011100", 1),
    ("00011000", 0),
    ("00111000", -1),
    ("00110000", -2),
    ("01110000", -3),
    ("01100000", -4),
    ("11100000", -5),
    ("11000000", -6),
    ("10000000", -7),
];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("pattern {0:?} must be exactly {TABLE_WIDTH} characters")]
    Width(String),
    #[error("pattern {0:?} must contain only '0' and '1'")]
    Charset(String),
    #[error("pattern {0:?} listed more than once")]
    Duplicate(String),
    #[error("step {step} for pattern {pattern:?} outside -{MAX_STEP}..={MAX_STEP}")]
    StepRange { pattern: String, step: i8 },
    #[error("step {0} must appear exactly once")]
    StepCount(i8),
}

/// Exact-match lookup from an 8-bit row to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTable {
    steps: [Option<i8>; 256],
}

impl PatternTable {
    /// Validate and index `entries`.
    ///
    /// Every step in −7..=7 must be mapped by exactly one pattern.
    pub fn try_new(entries: &[(&str, i8)]) -> Result<Self, TableError> {
        let mut steps = [None; 256];
        let mut seen = [0u8; 2 * MAX_STEP as usize + 1];
        for &(pattern, step) in entries {
            if pattern.len() != TABLE_WIDTH {
                return Err(TableError::Width(pattern.to_owned()));
            }
            let mut key = 0usize;
            for (i, c) in pattern.chars().enumerate() {
                match c {
                    '0' => {}
                    '1' => key |= 1 << i,
                    _ => return Err(TableError::Charset(pattern.to_owned())),
                }
            }
            if !(-MAX_STEP..=MAX_STEP).contains(&step) {
                return Err(TableError::StepRange {
                    pattern: pattern.to_owned(),
                    step,
                });
            }
            if steps[key].is_some() {
                return Err(TableError::Duplicate(pattern.to_owned()));
            }
            steps[key] = Some(step);
            let count = &mut seen[(step + MAX_STEP) as usize];
            if *count > 0 {
                return Err(TableError::StepCount(step));
            }
            *count = 1;
        }
        if let Some(idx) = seen.iter().position(|&n| n == 0) {
            return Err(TableError::StepCount(idx as i8 - MAX_STEP));
        }
        Ok(Self { steps })
    }

    /// The built-in table.
    pub fn canonical() -> &'static PatternTable {
        static TABLE: OnceLock<PatternTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            match PatternTable::try_new(&CANONICAL_PATTERNS) {
                Ok(t) => t,
                Err(e) => {
                    // Every 8-wide row then falls through to the centroid.
                    tracing::error!(error = %e, "built-in pattern table rejected");
                    PatternTable { steps: [None; 256] }
                }
            }
        })
    }

    /// Step for an exact 8-wide match.
    pub fn lookup(&self, bits: &BitVector) -> Option<i8> {
        if bits.len() != TABLE_WIDTH {
            return None;
        }
        self.steps[usize::from(bits.as_mask() & 0xFF)]
    }
}

/// Stateless classifier; the caller carries `last_steps` between cycles.
#[derive(Debug, Clone)]
pub struct DiscreteErrorClassifier {
    table: PatternTable,
    gain_milli: i64,
}

impl Default for DiscreteErrorClassifier {
    fn default() -> Self {
        Self::new(PatternTable::canonical().clone(), DEFAULT_CENTROID_GAIN_MILLI)
    }
}

impl DiscreteErrorClassifier {
    /// `gain_milli` is clamped to `1..=MAX_GAIN_MILLI`.
    pub fn new(table: PatternTable, gain_milli: i64) -> Self {
        let clamped = gain_milli.clamp(1, MAX_GAIN_MILLI);
        if clamped != gain_milli {
            tracing::warn!(
                requested = gain_milli,
                used = clamped,
                "centroid gain out of range; clamped"
            );
        }
        Self {
            table,
            gain_milli: clamped,
        }
    }

    pub fn gain_milli(&self) -> i64 {
        self.gain_milli
    }

    /// Whole steps in −7..=7.
    ///
    /// With no lit bit the previous sign is pushed to the extreme, so a lost
    /// line steers hard toward the side it was last seen on. An empty row
    /// (no active sensors) is 0.
    pub fn classify_steps(&self, bits: &BitVector, last_steps: i32) -> i8 {
        if bits.is_empty() {
            return 0;
        }
        if bits.count_ones() == 0 {
            return match last_steps.signum() {
                1 => MAX_STEP,
                -1 => -MAX_STEP,
                _ => 0,
            };
        }
        if let Some(step) = self.table.lookup(bits) {
            return step;
        }
        self.centroid_steps(bits)
    }

    /// `classify_steps` in ×1000 steering units.
    pub fn classify_error(&self, bits: &BitVector, last_steps: i32) -> i32 {
        i32::from(self.classify_steps(bits, last_steps)) * MILLI as i32
    }

    fn centroid_steps(&self, bits: &BitVector) -> i8 {
        let n = bits.len() as i64;
        if n <= 1 {
            return 0;
        }
        let lit = i64::from(bits.count_ones());
        let index_sum: i64 = bits
            .iter()
            .enumerate()
            .filter(|(_, b)| *b)
            .map(|(i, _)| i as i64)
            .sum();
        // rel = index_sum / lit - (n - 1) / 2, rescaled by 7 / (n - 1) and the gain.
        let num = (2 * index_sum - (n - 1) * lit) * i64::from(MAX_STEP) * self.gain_milli;
        let den = 2 * lit * (n - 1) * MILLI;
        let max = i64::from(MAX_STEP);
        div_round_half_away(num, den).clamp(-max, max) as i8
    }
}
