//! Observable state returned from each control loop pass.

use crate::distance::DistanceSample;
use crate::level::Level;

/// Point-in-time view of the regulation context and actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub commanded: Level,
    pub effective: Level,
    pub reducing: bool,
    pub distance: DistanceSample,
    pub alert: bool,
    pub rpm: f32,
}

/// Counters accumulated by the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub passes: u64,
    pub samples: u64,
    pub no_echo_samples: u64,
    pub renders: u64,
    pub commands_accepted: u64,
    pub commands_ignored: u64,
}
