use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until `is_high` reads `level`, or `timeout` expires.
///
/// Returns the instant the level was observed. A zero `poll_interval` spins,
/// which is what echo timing needs; anything larger sleeps between reads.
pub fn wait_for_level(
    mut is_high: impl FnMut() -> bool,
    level: bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Instant> {
    let deadline = Instant::now() + timeout;
    loop {
        if is_high() == level {
            return Ok(Instant::now());
        }
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
}

/// Delay between step pulses for `rpm` on a motor with `steps_per_rev` steps.
///
/// Zero or negative rates give `None` (no motion).
pub fn step_interval(rpm: f32, steps_per_rev: u32) -> Option<Duration> {
    if !(rpm.is_finite() && rpm > 0.0) || steps_per_rev == 0 {
        return None;
    }
    let steps_per_sec = f64::from(rpm) * f64::from(steps_per_rev) / 60.0;
    Some(Duration::from_secs_f64(1.0 / steps_per_sec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_interval_matches_rate() {
        // 15 rpm * 2048 steps = 512 steps/s
        let d = step_interval(15.0, 2048).unwrap();
        assert_eq!(d.as_micros(), 1953);
        assert_eq!(step_interval(0.0, 2048), None);
        assert_eq!(step_interval(5.0, 0), None);
    }
}
