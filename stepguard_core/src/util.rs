//! Small integer and time helpers shared across the engine.

/// Integer division rounded to nearest, ties away from zero.
///
/// Returns 0 when `den == 0` instead of panicking.
#[inline]
pub fn div_round_nearest_u64(num: u64, den: u64) -> u64 {
    if den == 0 {
        return 0;
    }
    let q = num / den;
    let r = num % den;
    if r.saturating_mul(2) >= den { q + 1 } else { q }
}

/// Whole milliseconds in a `Duration`, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: std::time::Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rounds_half_up() {
        assert_eq!(div_round_nearest_u64(5, 2), 3);
        assert_eq!(div_round_nearest_u64(4, 3), 1);
        assert_eq!(div_round_nearest_u64(5, 3), 2);
        assert_eq!(div_round_nearest_u64(0, 7), 0);
    }

    #[test]
    fn zero_denominator_is_zero() {
        assert_eq!(div_round_nearest_u64(10, 0), 0);
    }

    #[test]
    fn duration_ms_truncates() {
        assert_eq!(duration_ms(Duration::from_micros(1999)), 1);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
