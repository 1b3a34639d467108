//! The regulation context: all mutable control state in one place.
//!
//! Commanded level, regulation output, last distance sample and alert state
//! live here and are only mutated through [`RegulationContext::apply_command`]
//! and [`RegulationContext::tick`]. The control loop owns the context; a
//! concurrent caller must route writes through that single owner.

use crate::alert::{AlertState, update_alert};
use crate::command::{CommandOutcome, CommandRegister};
use crate::config::{AlertCfg, RegulationCfg};
use crate::distance::DistanceSample;
use crate::level::Level;
use crate::regulation::{Regulation, regulate, safe_threshold_cm};

/// What changed during one sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub regulation_changed: bool,
    pub alert_changed: bool,
}

#[derive(Debug, Clone)]
pub struct RegulationContext {
    regulation_cfg: RegulationCfg,
    alert_cfg: AlertCfg,
    commands: CommandRegister,
    regulation: Regulation,
    distance: DistanceSample,
    alert: AlertState,
}

impl RegulationContext {
    pub fn new(regulation_cfg: RegulationCfg, alert_cfg: AlertCfg, commands: CommandRegister) -> Self {
        let regulation = Regulation::unrestricted(commands.level());
        Self {
            regulation_cfg,
            alert_cfg,
            commands,
            regulation,
            distance: DistanceSample::NoEcho,
            alert: AlertState::Off,
        }
    }

    pub fn commanded(&self) -> Level {
        self.commands.level()
    }

    pub fn effective(&self) -> Level {
        self.regulation.effective
    }

    pub fn reducing(&self) -> bool {
        self.regulation.reducing
    }

    pub fn regulation(&self) -> Regulation {
        self.regulation
    }

    pub fn distance(&self) -> DistanceSample {
        self.distance
    }

    pub fn alert(&self) -> AlertState {
        self.alert
    }

    pub fn regulation_cfg(&self) -> &RegulationCfg {
        &self.regulation_cfg
    }

    pub fn alert_cfg(&self) -> &AlertCfg {
        &self.alert_cfg
    }

    /// Safe threshold for the current commanded level.
    pub fn safe_threshold_cm(&self) -> u32 {
        safe_threshold_cm(&self.regulation_cfg, self.commanded())
    }

    /// Feed one decoded remote code.
    ///
    /// An accepted level is re-regulated immediately against the last known
    /// sample so the effective level never lags above a lowered command.
    pub fn apply_command(&mut self, code: u32) -> CommandOutcome {
        let outcome = self.commands.apply(code);
        if let CommandOutcome::Accepted { level, .. } = outcome {
            self.regulation = regulate(&self.regulation_cfg, self.regulation, level, self.distance);
        }
        outcome
    }

    /// One sampling tick: update regulation and alert from `sample`.
    pub fn tick(&mut self, sample: DistanceSample) -> TickOutcome {
        let prior = self.regulation;
        let prior_alert = self.alert;
        self.distance = sample;
        self.regulation = regulate(&self.regulation_cfg, prior, self.commanded(), sample);
        self.alert = update_alert(&self.alert_cfg, prior_alert, sample);

        let out = TickOutcome {
            regulation_changed: self.regulation != prior,
            alert_changed: self.alert != prior_alert,
        };
        if out.regulation_changed {
            if self.regulation.reducing && !prior.reducing {
                tracing::info!(
                    distance_cm = sample.cm(),
                    threshold_cm = self.safe_threshold_cm(),
                    effective = %self.regulation.effective,
                    "proximity reduction engaged"
                );
            } else if !self.regulation.reducing && prior.reducing {
                tracing::info!(distance_cm = sample.cm(), "proximity reduction released");
            } else {
                tracing::debug!(effective = %self.regulation.effective, "effective level changed");
            }
        }
        if out.alert_changed {
            tracing::info!(on = self.alert.is_on(), distance_cm = sample.cm(), "alert changed");
        }
        out
    }
}
