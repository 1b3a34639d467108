use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source shared by the control loop, cadences and samplers.
///
/// Implementations may simulate `sleep` (see [`ManualClock`]).
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let ms = self.now().saturating_duration_since(epoch).as_millis();
        ms.min(u128::from(u64::MAX)) as u64
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

/// Wall-clock monotonic time backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

/// Hand-driven clock for deterministic cadence tests and simulations.
///
/// Clones share the same timeline; `sleep` advances it instead of blocking.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Time elapsed on this timeline since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_timeline() {
        let a = ManualClock::new();
        let b = a.clone();
        let t0 = a.now();
        b.advance_ms(40);
        a.sleep(Duration::from_millis(10));
        assert_eq!(a.ms_since(t0), 50);
        assert_eq!(b.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn ms_since_saturates_for_future_epoch() {
        let c = ManualClock::new();
        let future = c.now() + Duration::from_secs(1);
        assert_eq!(c.ms_since(future), 0);
    }
}
