//! Distance acquisition.
//!
//! [`DistanceSampler`] wraps the ranging collaborator: one ping per call,
//! bounded by the echo timeout, normalized into a [`DistanceSample`].
//! [`BackgroundSampler`] moves a `DistanceSampler` onto its own thread and
//! publishes the latest sample through a bounded channel, so the control
//! loop stays the single owner of the regulation state.
//!
//! Each `BackgroundSampler` spawns exactly one thread, shut down and joined
//! when the sampler is dropped.
use crossbeam_channel as xch;
use stepguard_traits::Ranger;
use stepguard_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::distance::{DistanceSample, echo_to_cm};
use crate::error::DriveError;
use crate::hw_error::map_hw_error;

/// Normalize a raw ranger result.
///
/// No echo (or a zero-width pulse) becomes `NoEcho`; anything shorter than
/// `min_clamp_cm` is raised to it to defend against spuriously short echoes.
pub fn normalize_echo(width: Option<Duration>, min_clamp_cm: u32) -> DistanceSample {
    match width {
        Some(w) if !w.is_zero() => DistanceSample::Cm(echo_to_cm(w).max(min_clamp_cm)),
        _ => DistanceSample::NoEcho,
    }
}

pub struct DistanceSampler<R: Ranger> {
    ranger: R,
    timeout: Duration,
    min_clamp_cm: u32,
}

impl<R: Ranger> DistanceSampler<R> {
    pub fn new(ranger: R, timeout: Duration, min_clamp_cm: u32) -> Self {
        Self {
            ranger,
            timeout,
            min_clamp_cm,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Take one measurement. Blocks for at most the echo timeout.
    ///
    /// Ranger failures degrade to `NoEcho`; the engine then runs at the
    /// commanded level rather than halting.
    pub fn sample(&mut self) -> DistanceSample {
        match self.ranger.ping(self.timeout) {
            Ok(width) => {
                let sample = normalize_echo(width, self.min_clamp_cm);
                tracing::trace!(echo_us = width.map(|w| w.as_micros() as u64), ?sample, "ping");
                sample
            }
            Err(e) => {
                match map_hw_error(&*e) {
                    DriveError::Timeout => tracing::debug!("ranger timed out"),
                    other => tracing::warn!(error = %other, "ranger fault, treating as no echo"),
                }
                DistanceSample::NoEcho
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.ranger
    }
}

pub struct BackgroundSampler {
    rx: xch::Receiver<DistanceSample>,
    published: Arc<AtomicU64>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl BackgroundSampler {
    /// Spawn a thread that samples every `period`.
    pub fn spawn<R, C>(mut sampler: DistanceSampler<R>, period: Duration, clock: C) -> Self
    where
        R: Ranger + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let published = Arc::new(AtomicU64::new(0));
        let published_clone = published.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                let started = clock.now();
                let sample = sampler.sample();
                // Keep only the freshest sample: a full slot means the loop has
                // not consumed the previous one yet.
                match tx.try_send(sample) {
                    Ok(()) => {
                        published_clone.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(xch::TrySendError::Full(_)) => {}
                    Err(xch::TrySendError::Disconnected(_)) => {
                        tracing::debug!("sampler consumer disconnected, exiting thread");
                        break;
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let spent = clock.now().saturating_duration_since(started);
                clock.sleep(period.saturating_sub(spent));
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            published,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Most recent unread sample, if any.
    pub fn latest(&self) -> Option<DistanceSample> {
        self.rx.try_iter().last()
    }

    /// Number of samples handed to the channel so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Drop for BackgroundSampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The thread exits between pings, or after the current ping returns
        // (bounded by the echo timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
