//! `From` implementations bridging `stepguard_config` types to `stepguard_core` types.

use std::time::Duration;

use crate::config::{AlertCfg, Direction, DisplayCfg, RateCfg, RegulationCfg, SamplingCfg, SamplingMode};

// ── RegulationCfg ────────────────────────────────────────────────────────────

impl From<&stepguard_config::RegulationCfg> for RegulationCfg {
    fn from(c: &stepguard_config::RegulationCfg) -> Self {
        Self {
            base_safe_cm: c.base_safe_cm,
            per_level_cm: c.per_level_cm,
            min_clamp_cm: c.min_clamp_cm,
            hysteresis_cm: c.hysteresis_cm,
        }
    }
}

// ── RateCfg ──────────────────────────────────────────────────────────────────

// Both enums live outside this crate, so a `From` impl is not allowed here.
fn direction_from(d: stepguard_config::Direction) -> Direction {
    match d {
        stepguard_config::Direction::Forward => Direction::Forward,
        stepguard_config::Direction::Reverse => Direction::Reverse,
    }
}

impl From<&stepguard_config::RateCfg> for RateCfg {
    fn from(c: &stepguard_config::RateCfg) -> Self {
        Self {
            level1_rpm: c.level1_rpm,
            level9_rpm: c.level9_rpm,
            direction: direction_from(c.direction),
            steps_per_rev: c.steps_per_rev,
            steps_per_pass: c.steps_per_pass,
        }
    }
}

// ── AlertCfg ─────────────────────────────────────────────────────────────────

impl From<&stepguard_config::AlertCfg> for AlertCfg {
    fn from(c: &stepguard_config::AlertCfg) -> Self {
        Self {
            on_cm: c.on_cm,
            off_cm: c.off_cm,
        }
    }
}

// ── SamplingCfg ──────────────────────────────────────────────────────────────

impl From<stepguard_config::SamplingMode> for SamplingMode {
    fn from(m: stepguard_config::SamplingMode) -> Self {
        match m {
            stepguard_config::SamplingMode::Direct => SamplingMode::Direct,
            stepguard_config::SamplingMode::Background => SamplingMode::Background,
        }
    }
}

impl From<&stepguard_config::SamplingCfg> for SamplingCfg {
    fn from(c: &stepguard_config::SamplingCfg) -> Self {
        Self {
            period: Duration::from_millis(c.period_ms),
            echo_timeout: Duration::from_millis(c.echo_timeout_ms),
            mode: c.mode.into(),
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<&stepguard_config::DisplayCfg> for DisplayCfg {
    fn from(c: &stepguard_config::DisplayCfg) -> Self {
        Self {
            refresh: Duration::from_millis(c.refresh_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_match_core_defaults() {
        assert_eq!(
            RegulationCfg::from(&stepguard_config::RegulationCfg::default()),
            RegulationCfg::default()
        );
        assert_eq!(
            RateCfg::from(&stepguard_config::RateCfg::default()),
            RateCfg::default()
        );
        assert_eq!(
            AlertCfg::from(&stepguard_config::AlertCfg::default()),
            AlertCfg::default()
        );
        assert_eq!(
            SamplingCfg::from(&stepguard_config::SamplingCfg::default()),
            SamplingCfg::default()
        );
        assert_eq!(
            DisplayCfg::from(&stepguard_config::DisplayCfg::default()),
            DisplayCfg::default()
        );
    }

    #[test]
    fn reverse_direction_carries_over() {
        let toml = stepguard_config::RateCfg {
            direction: stepguard_config::Direction::Reverse,
            ..stepguard_config::RateCfg::default()
        };
        assert_eq!(RateCfg::from(&toml).direction, Direction::Reverse);
    }
}
