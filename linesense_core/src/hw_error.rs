//! Maps `Box<dyn Error>` from trait boundaries to typed `LineSenseError`.
//!
//! The traits in `linesense_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `linesense_hardware::HwError` downcasting.

use crate::error::LineSenseError;

/// Map a trait-boundary error to a typed `LineSenseError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> LineSenseError {
    #[cfg(feature = "hardware-errors")]
    {
        use linesense_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => LineSenseError::Timeout,
                HwError::Unsupported(kind) => LineSenseError::Unsupported((*kind).to_string()),
                other => LineSenseError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") {
        LineSenseError::Timeout
    } else if lower.contains("not supported") {
        LineSenseError::Unsupported(s)
    } else {
        LineSenseError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_errors_fall_back_to_heuristics() {
        let e: Box<dyn std::error::Error + Send + Sync> = "adc timeout".into();
        assert_eq!(map_hw_error(&*e), LineSenseError::Timeout);
        let e: Box<dyn std::error::Error + Send + Sync> = "bus glitch".into();
        assert_eq!(
            map_hw_error(&*e),
            LineSenseError::Hardware("bus glitch".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hardware_errors_are_downcast() {
        use linesense_hardware::error::HwError;
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::Unsupported("timed"));
        assert_eq!(
            map_hw_error(&*e),
            LineSenseError::Unsupported("timed".into())
        );
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(HwError::ChannelOutOfRange(9));
        assert!(matches!(map_hw_error(&*e), LineSenseError::HardwareFault(_)));
    }
}
