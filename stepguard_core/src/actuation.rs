//! Actuation adapter: effective level to continuous stepper motion.

use eyre::WrapErr;
use stepguard_traits::Stepper;

use crate::config::RateCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::level::Level;
use crate::regulation::rpm_for_level;

pub struct Actuator<M: Stepper> {
    stepper: M,
    rate: RateCfg,
    /// Rate last sent to the driver; `None` while released.
    applied_rpm: Option<f32>,
    steps_issued: u64,
}

impl<M: Stepper> Actuator<M> {
    pub fn new(stepper: M, rate: RateCfg) -> Self {
        Self {
            stepper,
            rate,
            applied_rpm: None,
            steps_issued: 0,
        }
    }

    pub fn rate_cfg(&self) -> &RateCfg {
        &self.rate
    }

    /// Rate currently applied (0.0 when stopped).
    pub fn rpm(&self) -> f32 {
        self.applied_rpm.unwrap_or(0.0)
    }

    pub fn is_moving(&self) -> bool {
        self.applied_rpm.is_some()
    }

    pub fn steps_issued(&self) -> u64 {
        self.steps_issued
    }

    /// Apply `level` for one loop pass.
    ///
    /// The underlying driver only moves a small increment per call, so this
    /// must run on every pass while the level is above zero.
    pub fn drive(&mut self, level: Level) -> Result<()> {
        if level.is_stop() {
            return self.stop();
        }
        let rpm = rpm_for_level(&self.rate, level);
        if self.applied_rpm != Some(rpm) {
            self.stepper
                .set_speed(rpm)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("setting stepper speed")?;
            tracing::debug!(%level, rpm, "stepper rate changed");
            self.applied_rpm = Some(rpm);
        }
        let steps = self.steps_per_pass();
        self.stepper
            .step(steps)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("stepping motor")?;
        self.steps_issued = self.steps_issued.saturating_add(u64::from(steps.unsigned_abs()));
        Ok(())
    }

    /// Release the motor if it is moving. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        if self.applied_rpm.take().is_some() {
            self.stepper
                .release()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("releasing stepper")?;
            tracing::debug!("stepper released");
        }
        Ok(())
    }

    fn steps_per_pass(&self) -> i32 {
        let n = i32::try_from(self.rate.steps_per_pass).unwrap_or(i32::MAX);
        n * self.rate.direction.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::mocks::{SpyStepper, StepperCall};

    fn lvl(v: i32) -> Level {
        Level::new(v).unwrap()
    }

    #[test]
    fn sets_speed_once_and_steps_every_pass() {
        let spy = SpyStepper::default();
        let calls = spy.calls();
        let mut a = Actuator::new(
            spy,
            RateCfg {
                level1_rpm: 2.0,
                level9_rpm: 10.0,
                steps_per_pass: 2,
                ..RateCfg::default()
            },
        );
        a.drive(lvl(5)).unwrap();
        a.drive(lvl(5)).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                StepperCall::SetSpeed(6.0),
                StepperCall::Step(2),
                StepperCall::Step(2)
            ]
        );
        assert_eq!(a.steps_issued(), 4);
        assert_eq!(a.rpm(), 6.0);
    }

    #[test]
    fn level_zero_releases_once() {
        let spy = SpyStepper::default();
        let calls = spy.calls();
        let mut a = Actuator::new(spy, RateCfg::default());
        a.drive(Level::STOP).unwrap();
        assert!(calls.lock().unwrap().is_empty());
        a.drive(lvl(1)).unwrap();
        a.drive(Level::STOP).unwrap();
        a.drive(Level::STOP).unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls.last(), Some(&StepperCall::Release));
        assert_eq!(calls.iter().filter(|c| **c == StepperCall::Release).count(), 1);
        assert!(!a.is_moving());
    }

    #[test]
    fn reverse_direction_steps_negative() {
        let spy = SpyStepper::default();
        let calls = spy.calls();
        let mut a = Actuator::new(
            spy,
            RateCfg {
                direction: Direction::Reverse,
                ..RateCfg::default()
            },
        );
        a.drive(Level::MAX).unwrap();
        assert_eq!(calls.lock().unwrap()[1], StepperCall::Step(-1));
    }

    #[test]
    fn driver_errors_propagate() {
        let mut a = Actuator::new(SpyStepper::failing(), RateCfg::default());
        let err = a.drive(lvl(3)).unwrap_err();
        assert!(format!("{err:#}").contains("setting stepper speed"));
    }
}
