//! Type-state builder for `Controller`.
//!
//! `build()` only exists once both a ranger and a stepper have been supplied;
//! the marker type [`Missing`] fills their slots until then. Outputs, command
//! source, keymap and every config section are optional with defaults.

use std::sync::Arc;

use stepguard_config::KeyBinding;
use stepguard_traits::clock::{Clock, MonotonicClock};
use stepguard_traits::{AlertOutput, CommandSource, Ranger, StatusDisplay, Stepper};

use crate::actuation::Actuator;
use crate::cadence::Cadence;
use crate::command::CommandRegister;
use crate::config::*;
use crate::context::RegulationContext;
use crate::controller::Controller;
use crate::error::{BuildError, Result};
use crate::sampler::DistanceSampler;
use crate::status::LoopStats;

/// Placeholder for a collaborator that has not been provided yet.
pub struct Missing;

pub struct ControllerBuilder<R, M> {
    ranger: R,
    stepper: M,
    alert: Option<Box<dyn AlertOutput>>,
    display: Option<Box<dyn StatusDisplay>>,
    commands: Option<Box<dyn CommandSource>>,
    keymap: Option<Vec<KeyBinding>>,
    regulation: RegulationCfg,
    rate: RateCfg,
    alert_cfg: AlertCfg,
    sampling: SamplingCfg,
    display_cfg: DisplayCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl Default for ControllerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            ranger: Missing,
            stepper: Missing,
            alert: None,
            display: None,
            commands: None,
            keymap: None,
            regulation: RegulationCfg::default(),
            rate: RateCfg::default(),
            alert_cfg: AlertCfg::default(),
            sampling: SamplingCfg::default(),
            display_cfg: DisplayCfg::default(),
            clock: None,
        }
    }
}

impl ControllerBuilder<Missing, Missing> {
    /// Start building a controller.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R, M> ControllerBuilder<R, M> {
    pub fn with_ranger<R2: Ranger>(self, ranger: R2) -> ControllerBuilder<R2, M> {
        ControllerBuilder {
            ranger,
            stepper: self.stepper,
            alert: self.alert,
            display: self.display,
            commands: self.commands,
            keymap: self.keymap,
            regulation: self.regulation,
            rate: self.rate,
            alert_cfg: self.alert_cfg,
            sampling: self.sampling,
            display_cfg: self.display_cfg,
            clock: self.clock,
        }
    }

    pub fn with_stepper<M2: Stepper>(self, stepper: M2) -> ControllerBuilder<R, M2> {
        ControllerBuilder {
            ranger: self.ranger,
            stepper,
            alert: self.alert,
            display: self.display,
            commands: self.commands,
            keymap: self.keymap,
            regulation: self.regulation,
            rate: self.rate,
            alert_cfg: self.alert_cfg,
            sampling: self.sampling,
            display_cfg: self.display_cfg,
            clock: self.clock,
        }
    }

    /// Take the ranger back out, e.g. to hand it to a background sampler.
    pub fn split_ranger(self) -> (R, ControllerBuilder<crate::mocks::NoRanger, M>) {
        let ControllerBuilder {
            ranger,
            stepper,
            alert,
            display,
            commands,
            keymap,
            regulation,
            rate,
            alert_cfg,
            sampling,
            display_cfg,
            clock,
        } = self;
        (
            ranger,
            ControllerBuilder {
                ranger: crate::mocks::NoRanger,
                stepper,
                alert,
                display,
                commands,
                keymap,
                regulation,
                rate,
                alert_cfg,
                sampling,
                display_cfg,
                clock,
            },
        )
    }

    pub fn with_alert_output(mut self, out: impl AlertOutput + 'static) -> Self {
        self.alert = Some(Box::new(out));
        self
    }

    pub fn with_display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn with_commands(mut self, src: impl CommandSource + 'static) -> Self {
        self.commands = Some(Box::new(src));
        self
    }

    pub fn with_keymap(mut self, keymap: Vec<KeyBinding>) -> Self {
        self.keymap = Some(keymap);
        self
    }

    pub fn with_regulation(mut self, cfg: RegulationCfg) -> Self {
        self.regulation = cfg;
        self
    }

    pub fn with_rate(mut self, cfg: RateCfg) -> Self {
        self.rate = cfg;
        self
    }

    pub fn with_alert(mut self, cfg: AlertCfg) -> Self {
        self.alert_cfg = cfg;
        self
    }

    pub fn with_sampling(mut self, cfg: SamplingCfg) -> Self {
        self.sampling = cfg;
        self
    }

    pub fn with_display_cfg(mut self, cfg: DisplayCfg) -> Self {
        self.display_cfg = cfg;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn sampling(&self) -> &SamplingCfg {
        &self.sampling
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock
            .clone()
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()))
    }
}

impl<R: Ranger, M: Stepper> ControllerBuilder<R, M> {
    /// Validate configuration and assemble the controller.
    pub fn build(self) -> Result<Controller<R, M>> {
        validate(
            &self.regulation,
            &self.rate,
            &self.alert_cfg,
            &self.sampling,
            &self.display_cfg,
        )?;
        let clock = self.clock();
        let register = match self.keymap {
            Some(km) => CommandRegister::new(km),
            None => CommandRegister::default(),
        };
        Ok(Controller {
            ctx: RegulationContext::new(self.regulation, self.alert_cfg, register),
            sampler: DistanceSampler::new(
                self.ranger,
                self.sampling.echo_timeout,
                self.regulation.min_clamp_cm,
            ),
            actuator: Actuator::new(self.stepper, self.rate),
            alert_out: self.alert,
            display: self.display,
            commands: self.commands,
            clock,
            sample_cadence: Cadence::new(self.sampling.period),
            display_cadence: Cadence::new(self.display_cfg.refresh),
            alert_written: None,
            external_samples: false,
            stats: LoopStats::default(),
        })
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Single source of truth for runtime config validation.
fn validate(
    regulation: &RegulationCfg,
    rate: &RateCfg,
    alert: &AlertCfg,
    sampling: &SamplingCfg,
    display: &DisplayCfg,
) -> Result<()> {
    if regulation.base_safe_cm <= regulation.min_clamp_cm {
        return Err(invalid("base_safe_cm must exceed min_clamp_cm"));
    }
    if !(rate.level1_rpm.is_finite() && rate.level1_rpm > 0.0) {
        return Err(invalid("level1_rpm must be > 0"));
    }
    if !rate.level9_rpm.is_finite() || rate.level9_rpm < rate.level1_rpm {
        return Err(invalid("level9_rpm must be >= level1_rpm"));
    }
    if rate.steps_per_pass == 0 || rate.steps_per_rev == 0 {
        return Err(invalid("steps_per_pass and steps_per_rev must be >= 1"));
    }
    if alert.on_cm >= alert.off_cm {
        return Err(invalid("alert on_cm must be below off_cm"));
    }
    if sampling.period.is_zero() || sampling.echo_timeout.is_zero() {
        return Err(invalid("sampling period and echo timeout must be > 0"));
    }
    if display.refresh.is_zero() {
        return Err(invalid("display refresh must be > 0"));
    }
    Ok(())
}
