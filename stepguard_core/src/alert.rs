//! Alert indicator hysteresis.
//!
//! Two states driven only by the distance sample. The ON/OFF thresholds are
//! asymmetric (`on_cm < off_cm`) so readings between them keep the current
//! state. `NoEcho` carries no information and never changes state.

use crate::config::AlertCfg;
use crate::distance::DistanceSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Off,
    On,
}

impl AlertState {
    #[inline]
    pub fn is_on(self) -> bool {
        matches!(self, AlertState::On)
    }
}

/// `(prior, sample) -> next` for the alert indicator.
pub fn update_alert(cfg: &AlertCfg, prior: AlertState, sample: DistanceSample) -> AlertState {
    match (prior, sample.cm()) {
        (AlertState::Off, Some(d)) if d < cfg.on_cm => AlertState::On,
        (AlertState::On, Some(d)) if d > cfg.off_cm => AlertState::Off,
        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: AlertCfg = AlertCfg {
        on_cm: 20,
        off_cm: 25,
    };

    #[test]
    fn turns_on_below_on_threshold_and_holds_through_band() {
        let s = update_alert(&CFG, AlertState::Off, DistanceSample::Cm(19));
        assert_eq!(s, AlertState::On);
        let s = update_alert(&CFG, s, DistanceSample::Cm(21));
        assert_eq!(s, AlertState::On);
        let s = update_alert(&CFG, s, DistanceSample::Cm(25));
        assert_eq!(s, AlertState::On);
        let s = update_alert(&CFG, s, DistanceSample::Cm(26));
        assert_eq!(s, AlertState::Off);
    }

    #[test]
    fn stays_off_at_on_threshold_and_in_band() {
        for d in [20, 22, 25, 400] {
            assert_eq!(
                update_alert(&CFG, AlertState::Off, DistanceSample::Cm(d)),
                AlertState::Off,
                "d={d}"
            );
        }
    }

    #[test]
    fn no_echo_never_changes_state() {
        assert_eq!(
            update_alert(&CFG, AlertState::On, DistanceSample::NoEcho),
            AlertState::On
        );
        assert_eq!(
            update_alert(&CFG, AlertState::Off, DistanceSample::NoEcho),
            AlertState::Off
        );
    }
}
