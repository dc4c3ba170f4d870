use crate::bits::BitVector;

/// True when at least one sensor was examined and none sees the line.
///
/// An empty row is never a gap, so a sensor with no channels cannot trigger a stop.
pub fn is_gap(bits: &BitVector) -> bool {
    !bits.is_empty() && bits.count_ones() == 0
}
