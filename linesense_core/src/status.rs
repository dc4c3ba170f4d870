//! Lifecycle phase of a sensor array.

/// Calibration must complete before normalized reads are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No calibration has run; the first read finalizes implicitly.
    #[default]
    Uncalibrated,
    /// Collecting bounds; normalized reads are rejected.
    Calibrating,
    /// Bounds finalized.
    Ready,
}
