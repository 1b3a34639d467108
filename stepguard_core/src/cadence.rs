//! Fixed-period cadences for the cooperative control loop.

use std::time::{Duration, Instant};

/// Tracks when a periodic activity is next due.
///
/// Due immediately on the first poll. A slot that was missed entirely is
/// skipped instead of being replayed in a burst.
#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true (and schedules the next slot) when the activity is due at `now`.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(t) if now < t => false,
            Some(t) => {
                let next = t + self.period;
                self.next_due = Some(if next <= now { now + self.period } else { next });
                true
            }
            None => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }

    /// Time remaining until the next slot; zero if due or never polled.
    pub fn until_due(&self, now: Instant) -> Duration {
        self.next_due
            .map(|t| t.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}
