#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core regulation logic (hardware-agnostic).
//!
//! This crate turns a commanded speed level and a stream of ultrasonic
//! distance samples into stepper actuation, an alert output and a two-line
//! status report. All hardware interactions go through the
//! `stepguard_traits` collaborator traits.
//!
//! ## Architecture
//!
//! - **Commands**: keymap lookup and the commanded level (`command`)
//! - **Sampling**: echo normalization, direct or background (`sampler`)
//! - **Regulation**: safe threshold, proportional reduction, hold band (`regulation`)
//! - **Alert**: on/off hysteresis (`alert`)
//! - **Actuation**: level to rate, steps re-issued every pass (`actuation`)
//! - **Reporting**: fixed-width status lines (`report`)
//! - **Loop**: cadences and the cooperative pass (`controller`, `runner`)
//!
//! Levels are integers `0..=9`; distances are whole centimetres.

pub mod actuation;
pub mod alert;
pub mod builder;
pub mod cadence;
pub mod command;
pub mod config;
pub mod context;
pub mod controller;
mod conversions;
pub mod distance;
pub mod error;
mod hw_error;
pub mod level;
pub mod mocks;
pub mod regulation;
pub mod report;
pub mod runner;
pub mod sampler;
pub mod status;
pub mod util;

pub use crate::alert::AlertState;
pub use crate::builder::ControllerBuilder;
pub use crate::command::{CommandOutcome, CommandRegister, RepeatFilter};
pub use crate::config::{AlertCfg, DisplayCfg, RateCfg, RegulationCfg, SamplingCfg, SamplingMode};
pub use crate::context::RegulationContext;
pub use crate::controller::Controller;
pub use crate::distance::DistanceSample;
pub use crate::error::{BuildError, DriveError, Report, Result};
pub use crate::hw_error::map_hw_error;
pub use crate::level::Level;
pub use crate::regulation::{Regulation, regulate, rpm_for_level, safe_threshold_cm};
pub use crate::report::{StatusLines, format_status};
pub use crate::runner::{RunOptions, RunSummary, StopReason, run};
pub use crate::sampler::{BackgroundSampler, DistanceSampler};
pub use crate::status::{LoopStats, Snapshot};
