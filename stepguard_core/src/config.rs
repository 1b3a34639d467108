//! Runtime configuration for the regulation engine.
//!
//! These are the structs consumed by `Controller` and the pure regulation
//! functions. They are separate from the TOML-deserialized config in
//! `stepguard_config`; see `conversions` for the mapping.

use std::time::Duration;

pub use stepguard_traits::Direction;

/// Safety-threshold and hysteresis parameters, all in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegulationCfg {
    /// Clear distance required at level 0.
    pub base_safe_cm: u32,
    /// Additional clear distance per commanded level.
    pub per_level_cm: u32,
    /// Lower bound of distance readings; maps to effective level 0.
    pub min_clamp_cm: u32,
    /// Band above the safe threshold where the last decision is held.
    pub hysteresis_cm: u32,
}

impl Default for RegulationCfg {
    fn default() -> Self {
        Self {
            base_safe_cm: 10,
            per_level_cm: 5,
            min_clamp_cm: 2,
            hysteresis_cm: 5,
        }
    }
}

/// Level-to-rate mapping and actuation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateCfg {
    /// Rate at level 1.
    pub level1_rpm: f32,
    /// Rate at level 9; levels in between are linearly interpolated.
    pub level9_rpm: f32,
    pub direction: Direction,
    pub steps_per_rev: u32,
    /// Steps issued on every control loop pass while moving.
    pub steps_per_pass: u32,
}

impl Default for RateCfg {
    fn default() -> Self {
        Self {
            level1_rpm: 2.0,
            level9_rpm: 15.0,
            direction: Direction::Forward,
            steps_per_rev: 2048,
            steps_per_pass: 1,
        }
    }
}

/// Alert indicator band. `on_cm` must be below `off_cm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCfg {
    pub on_cm: u32,
    pub off_cm: u32,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            on_cm: 20,
            off_cm: 25,
        }
    }
}

/// How distance samples reach the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// Ping inside the control loop on the sampling cadence.
    #[default]
    Direct,
    /// Dedicated sampler thread; the loop consumes the latest sample.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingCfg {
    pub period: Duration,
    /// Max wait for an echo before the sample becomes `NoEcho`.
    pub echo_timeout: Duration,
    pub mode: SamplingMode,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            echo_timeout: Duration::from_millis(30),
            mode: SamplingMode::Direct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCfg {
    pub refresh: Duration,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            refresh: Duration::from_millis(500),
        }
    }
}
