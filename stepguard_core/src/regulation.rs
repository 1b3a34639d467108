//! Proximity speed regulation.
//!
//! Converts `(commanded level, distance sample)` into an effective level every
//! sampling tick:
//!
//! - `NoEcho` counts as a clear path: run at the commanded level.
//! - Below the safe threshold, the clamped distance is mapped linearly from
//!   `[min_clamp, threshold]` onto `[0, commanded]`.
//! - Above `threshold + hysteresis`, run at the commanded level.
//! - Inside `[threshold, threshold + hysteresis]` the previous decision is held,
//!   which keeps the speed from chattering around the boundary.
//!
//! Everything here is a pure function of its arguments; state lives in
//! [`RegulationContext`](crate::context::RegulationContext).

use crate::config::{RateCfg, RegulationCfg};
use crate::distance::DistanceSample;
use crate::level::Level;
use crate::util::div_round_nearest_u64;

/// Output of one regulation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Regulation {
    pub effective: Level,
    /// True iff `effective < commanded` because of proximity.
    pub reducing: bool,
}

impl Regulation {
    /// No proximity restriction: run at `commanded`.
    #[inline]
    pub fn unrestricted(commanded: Level) -> Self {
        Self {
            effective: commanded,
            reducing: false,
        }
    }
}

/// Minimum clear distance for running at `level` without reduction.
///
/// `base + per_level * level`; at level 0 this is the base distance.
#[inline]
pub fn safe_threshold_cm(cfg: &RegulationCfg, level: Level) -> u32 {
    cfg.base_safe_cm
        .saturating_add(cfg.per_level_cm.saturating_mul(u32::from(level.get())))
}

/// Linear reduction for a distance below the safe threshold.
///
/// The distance is clamped into `[min_clamp, threshold]`, then mapped onto
/// `[0, commanded]` with round-half-up. Level 0 maps to 0, and so does a
/// degenerate range where the threshold does not exceed `min_clamp`.
pub fn proportional_level(cfg: &RegulationCfg, commanded: Level, distance_cm: u32) -> Level {
    if commanded.is_stop() {
        return Level::STOP;
    }
    let threshold = safe_threshold_cm(cfg, commanded);
    if threshold <= cfg.min_clamp_cm {
        return Level::STOP;
    }
    let clamped = distance_cm.clamp(cfg.min_clamp_cm, threshold);
    let span = u64::from(threshold - cfg.min_clamp_cm);
    let above_min = u64::from(clamped - cfg.min_clamp_cm);
    let mapped = div_round_nearest_u64(u64::from(commanded.get()) * above_min, span);
    Level::clamped(mapped.min(i64::MAX as u64) as i64).min(commanded)
}

/// Hold the previous decision for a (possibly new) commanded level.
///
/// An active reduction is kept but never above `commanded`; otherwise the
/// commanded level applies unchanged.
#[inline]
pub fn hold(prior: Regulation, commanded: Level) -> Regulation {
    let effective = if prior.reducing {
        prior.effective.min(commanded)
    } else {
        commanded
    };
    Regulation {
        effective,
        reducing: effective < commanded,
    }
}

/// One regulation decision: `(prior, commanded, sample) -> next`.
pub fn regulate(
    cfg: &RegulationCfg,
    prior: Regulation,
    commanded: Level,
    sample: DistanceSample,
) -> Regulation {
    let Some(d) = sample.cm() else {
        return Regulation::unrestricted(commanded);
    };
    let threshold = safe_threshold_cm(cfg, commanded);
    if d < threshold {
        let effective = proportional_level(cfg, commanded, d);
        Regulation {
            effective,
            reducing: effective < commanded,
        }
    } else if d > threshold.saturating_add(cfg.hysteresis_cm) {
        Regulation::unrestricted(commanded)
    } else {
        hold(prior, commanded)
    }
}

/// Drive rate for an effective level.
///
/// Level 0 is stopped; levels 1..=9 interpolate linearly between the
/// configured level-1 and level-9 rates.
pub fn rpm_for_level(cfg: &RateCfg, level: Level) -> f32 {
    match level.get() {
        0 => 0.0,
        l => {
            let steps = f32::from(l - 1);
            cfg.level1_rpm + (cfg.level9_rpm - cfg.level1_rpm) * steps / 8.0
        }
    }
}
