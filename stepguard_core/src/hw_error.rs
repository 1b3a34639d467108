//! Maps `Box<dyn Error>` from trait boundaries to typed `DriveError`.
//!
//! The traits in `stepguard_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `stepguard_hardware::HwError` downcasting.

use crate::error::DriveError;

/// Map a trait-boundary error to a typed `DriveError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DriveError {
    #[cfg(feature = "hardware-errors")]
    {
        use stepguard_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::EchoTimeout => DriveError::Timeout,
                HwError::Io(io) => DriveError::Io(io.to_string()),
                other => DriveError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DriveError::Timeout
    } else {
        DriveError::Hardware(s)
    }
}
