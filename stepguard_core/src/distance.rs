//! Distance samples and echo-width conversion.

use std::time::Duration;

/// One normalized reading from the ranging sensor.
///
/// `NoEcho` means nothing answered within the timeout. It is treated as a
/// clear path, never as zero distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceSample {
    Cm(u32),
    #[default]
    NoEcho,
}

impl DistanceSample {
    #[inline]
    pub fn cm(self) -> Option<u32> {
        match self {
            DistanceSample::Cm(d) => Some(d),
            DistanceSample::NoEcho => None,
        }
    }

    #[inline]
    pub fn is_echo(self) -> bool {
        matches!(self, DistanceSample::Cm(_))
    }

    /// Value shown on the status line; `NoEcho` renders as 0.
    #[inline]
    pub fn display_cm(self) -> u32 {
        self.cm().unwrap_or(0)
    }
}

/// Speed of sound in cm per 10 ms (343 m/s); the divisor folds in the round trip.
const SOUND_CM_PER_10MS: u64 = 343;
const ROUND_TRIP_US: u64 = 20_000;

/// Echo pulse width to one-way distance in whole centimeters (truncated).
pub fn echo_to_cm(width: Duration) -> u32 {
    let us = width.as_micros().min(u128::from(u64::MAX)) as u64;
    let cm = us.saturating_mul(SOUND_CM_PER_10MS) / ROUND_TRIP_US;
    u32::try_from(cm).unwrap_or(u32::MAX)
}

/// Shortest echo width that [`echo_to_cm`] reads back as `cm`.
pub fn echo_for_cm(cm: u32) -> Duration {
    let us = (u64::from(cm) * ROUND_TRIP_US).div_ceil(SOUND_CM_PER_10MS);
    Duration::from_micros(us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        // ~58 us per cm
        assert_eq!(echo_to_cm(Duration::from_micros(583)), 9);
        assert_eq!(echo_to_cm(Duration::from_micros(5831)), 100);
        assert_eq!(echo_to_cm(Duration::ZERO), 0);
    }

    #[test]
    fn echo_for_cm_round_trips() {
        for cm in [0u32, 1, 2, 17, 35, 400, 10_000] {
            assert_eq!(echo_to_cm(echo_for_cm(cm)), cm, "cm={cm}");
        }
    }

    #[test]
    fn no_echo_displays_as_zero() {
        assert_eq!(DistanceSample::NoEcho.display_cm(), 0);
        assert_eq!(DistanceSample::Cm(42).display_cm(), 42);
        assert!(!DistanceSample::NoEcho.is_echo());
    }
}
