use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use stepguard_traits::{Ranger, Stepper};

use crate::builder::ControllerBuilder;
use crate::config::SamplingMode;
use crate::controller::Controller;
use crate::error::Result as CoreResult;
use crate::sampler::{BackgroundSampler, DistanceSampler};
use crate::status::{LoopStats, Snapshot};
use crate::util::duration_ms;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised (Ctrl-C).
    Shutdown,
    /// `max_run` elapsed.
    MaxRuntime,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Stop after this long; `None` runs until shutdown.
    pub max_run: Option<Duration>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub reason: StopReason,
    pub last: Snapshot,
    pub stats: LoopStats,
    pub elapsed_ms: u64,
}

/// Drive the controller until shutdown or `max_run`, then release the stepper.
///
/// Sampling mode comes from the builder's `SamplingCfg`: `Direct` pings inside
/// the loop, `Background` moves the ranger onto a sampler thread.
pub fn run<R, M>(
    builder: ControllerBuilder<R, M>,
    opts: RunOptions,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary>
where
    R: Ranger + Send + 'static,
    M: Stepper,
{
    match builder.sampling().mode {
        SamplingMode::Direct => {
            let controller = builder.build()?;
            tracing::info!(mode = "direct", "run start");
            drive(controller, opts, shutdown, |c| c.step())
        }
        SamplingMode::Background => {
            let sampling = *builder.sampling();
            let clock = builder.clock();
            let (ranger, builder) = builder.split_ranger();
            let controller = builder.build()?;
            let min_clamp = controller.context().regulation_cfg().min_clamp_cm;
            let sampler = BackgroundSampler::spawn(
                DistanceSampler::new(ranger, sampling.echo_timeout, min_clamp),
                sampling.period,
                clock,
            );
            tracing::info!(mode = "background", "run start");
            drive(controller, opts, shutdown, move |c| {
                c.step_with_sample(sampler.latest())
            })
        }
    }
}

fn drive<R, M, F>(
    mut controller: Controller<R, M>,
    opts: RunOptions,
    shutdown: Arc<AtomicBool>,
    mut pass: F,
) -> CoreResult<RunSummary>
where
    R: Ranger,
    M: Stepper,
    F: FnMut(&mut Controller<R, M>) -> CoreResult<Snapshot>,
{
    let start = Instant::now();
    if let Err(e) = controller.begin() {
        if let Err(stop_err) = controller.stop() {
            tracing::warn!(error = %stop_err, "stepper release failed after start error");
        }
        return Err(e);
    }
    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        if opts.max_run.is_some_and(|m| start.elapsed() >= m) {
            break StopReason::MaxRuntime;
        }

        if let Err(e) = pass(&mut controller) {
            if let Err(stop_err) = controller.stop() {
                tracing::warn!(error = %stop_err, "stepper release failed after loop error");
            }
            tracing::error!(error = %e, "control loop aborted");
            return Err(e);
        }

        let idle = controller.idle_hint();
        if idle.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(idle);
        }
    };

    controller.stop()?;
    let summary = RunSummary {
        reason,
        last: controller.snapshot(),
        stats: controller.stats(),
        elapsed_ms: duration_ms(start.elapsed()),
    };
    tracing::info!(
        ?reason,
        passes = summary.stats.passes,
        samples = summary.stats.samples,
        elapsed_ms = summary.elapsed_ms,
        "run stopped"
    );
    Ok(summary)
}
