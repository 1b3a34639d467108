//! The cooperative control loop (`Controller`).
//!
//! One pass polls the command source, takes a distance sample when the
//! sampling cadence is due, re-issues actuation while the effective level is
//! above zero, and refreshes the status display on its own cadence. Only the
//! ranger ping may block, and only up to the echo timeout.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use stepguard_traits::clock::Clock;
use stepguard_traits::{AlertOutput, CommandSource, Ranger, StatusDisplay, Stepper};

use crate::actuation::Actuator;
use crate::cadence::Cadence;
use crate::command::CommandOutcome;
use crate::context::RegulationContext;
use crate::distance::DistanceSample;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::report::{StatusLines, format_status};
use crate::sampler::DistanceSampler;
use crate::status::{LoopStats, Snapshot};

/// Upper bound on codes drained from the command source per pass.
const MAX_COMMANDS_PER_PASS: usize = 8;
/// Longest idle sleep while stopped, so command input stays responsive.
pub const IDLE_POLL: Duration = Duration::from_millis(2);

pub struct Controller<R: Ranger, M: Stepper> {
    pub(crate) ctx: RegulationContext,
    pub(crate) sampler: DistanceSampler<R>,
    pub(crate) actuator: Actuator<M>,
    pub(crate) alert_out: Option<Box<dyn AlertOutput>>,
    pub(crate) display: Option<Box<dyn StatusDisplay>>,
    pub(crate) commands: Option<Box<dyn CommandSource>>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) sample_cadence: Cadence,
    pub(crate) display_cadence: Cadence,
    pub(crate) alert_written: Option<bool>,
    /// Samples arrive through `step_with_sample`; the sample cadence is unused.
    pub(crate) external_samples: bool,
    pub(crate) stats: LoopStats,
}

impl<R: Ranger, M: Stepper> core::fmt::Debug for Controller<R, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("commanded", &self.ctx.commanded())
            .field("effective", &self.ctx.effective())
            .field("distance", &self.ctx.distance())
            .field("alert", &self.ctx.alert())
            .field("rpm", &self.actuator.rpm())
            .finish()
    }
}

impl<R: Ranger, M: Stepper> Controller<R, M> {
    pub fn context(&self) -> &RegulationContext {
        &self.ctx
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            commanded: self.ctx.commanded(),
            effective: self.ctx.effective(),
            reducing: self.ctx.reducing(),
            distance: self.ctx.distance(),
            alert: self.ctx.alert().is_on(),
            rpm: self.actuator.rpm(),
        }
    }

    /// Current status lines, as the display would show them.
    pub fn status_lines(&self) -> StatusLines {
        format_status(
            self.ctx.commanded(),
            self.ctx.effective(),
            self.ctx.distance(),
            self.ctx.alert_cfg().on_cm,
        )
    }

    /// Prepare outputs for a run: drive the alert to its initial OFF state.
    pub fn begin(&mut self) -> Result<()> {
        self.write_alert()?;
        tracing::info!(
            commanded = %self.ctx.commanded(),
            sample_ms = self.sample_cadence.period().as_millis() as u64,
            display_ms = self.display_cadence.period().as_millis() as u64,
            "control loop start"
        );
        Ok(())
    }

    /// Feed one decoded code directly (bypassing the command source).
    pub fn apply_command(&mut self, code: u32) -> CommandOutcome {
        let outcome = self.ctx.apply_command(code);
        match outcome {
            CommandOutcome::Accepted { .. } => self.stats.commands_accepted += 1,
            _ => self.stats.commands_ignored += 1,
        }
        outcome
    }

    /// One loop pass that samples the ranger itself when the cadence is due.
    pub fn step(&mut self) -> Result<Snapshot> {
        self.poll_commands();
        if self.sample_cadence.due(self.clock.now()) {
            let sample = self.sampler.sample();
            self.on_sample(sample)?;
        }
        self.finish_pass()
    }

    /// One loop pass fed by an externally acquired sample (background sampler).
    pub fn step_with_sample(&mut self, sample: Option<DistanceSample>) -> Result<Snapshot> {
        self.external_samples = true;
        self.poll_commands();
        if let Some(s) = sample {
            self.on_sample(s)?;
        }
        self.finish_pass()
    }

    /// Release the stepper (best-effort callers ignore the error).
    pub fn stop(&mut self) -> Result<()> {
        self.actuator.stop()
    }

    /// How long the loop may sleep before anything is due.
    ///
    /// Zero while moving, since actuation is re-issued on every pass.
    pub fn idle_hint(&self) -> Duration {
        if self.actuator.is_moving() {
            return Duration::ZERO;
        }
        let now = self.clock.now();
        let mut idle = self.display_cadence.until_due(now).min(IDLE_POLL);
        if !self.external_samples {
            idle = idle.min(self.sample_cadence.until_due(now));
        }
        idle
    }

    fn poll_commands(&mut self) {
        let Some(src) = self.commands.as_mut() else {
            return;
        };
        let mut codes = Vec::new();
        while codes.len() < MAX_COMMANDS_PER_PASS {
            match src.poll() {
                Some(code) => codes.push(code),
                None => break,
            }
        }
        for code in codes {
            self.apply_command(code);
        }
    }

    fn on_sample(&mut self, sample: DistanceSample) -> Result<()> {
        self.stats.samples += 1;
        if !sample.is_echo() {
            self.stats.no_echo_samples += 1;
        }
        tracing::debug!(distance_cm = sample.cm(), "distance sample");
        let out = self.ctx.tick(sample);
        if out.alert_changed {
            self.write_alert()?;
        }
        Ok(())
    }

    fn finish_pass(&mut self) -> Result<Snapshot> {
        self.actuator.drive(self.ctx.effective())?;
        if self.display_cadence.due(self.clock.now()) {
            self.render();
        }
        self.stats.passes += 1;
        Ok(self.snapshot())
    }

    fn write_alert(&mut self) -> Result<()> {
        let on = self.ctx.alert().is_on();
        if self.alert_written == Some(on) {
            return Ok(());
        }
        if let Some(out) = self.alert_out.as_mut() {
            out.set(on)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("writing alert output")?;
        }
        self.alert_written = Some(on);
        Ok(())
    }

    fn render(&mut self) {
        let lines = self.status_lines();
        if let Some(display) = self.display.as_mut() {
            // The display is informational; a failed refresh is retried next slot.
            match display.show(&lines.line1, &lines.line2) {
                Ok(()) => self.stats.renders += 1,
                Err(e) => tracing::warn!(error = %e, "status display refresh failed"),
            }
        }
    }
}
