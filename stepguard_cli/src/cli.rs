//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "stepguard",
    version,
    about = "Stepper speed regulator with ultrasonic proximity slow-down"
)]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/stepguard.toml")]
    pub config: PathBuf,

    /// Optional remote keymap CSV (strict header `code,level`)
    #[arg(long, value_name = "FILE")]
    pub keymap: Option<PathBuf>,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Sampling mode override for `run`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SamplingArg {
    /// Ping inside the control loop
    Direct,
    /// Ping on a dedicated sampler thread
    Background,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the regulation loop until Ctrl-C (or --max-run-ms)
    Run {
        /// Remote code to feed at start (decimal or 0x hex); repeatable
        #[arg(long = "press", value_name = "CODE", value_parser = parse_code_arg)]
        press: Vec<u32>,
        /// Read remote codes from stdin, one per line
        #[arg(long, action = ArgAction::SetTrue)]
        stdin: bool,
        /// Stop after this many milliseconds
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Override [sampling] mode from the config
        #[arg(long, value_enum, value_name = "MODE")]
        sampling: Option<SamplingArg>,
        /// Simulated obstacle start distance (ignored with real hardware)
        #[arg(long, value_name = "CM", default_value_t = 150.0)]
        sim_start_cm: f32,
        /// Simulated obstacle approach speed (ignored with real hardware)
        #[arg(long, value_name = "CM_PER_S", default_value_t = 10.0)]
        sim_speed_cm_s: f32,
        /// Print control loop stats
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Validate config and keymap, then take one distance sample
    SelfCheck,
    /// Print the effective remote keymap
    Keymap,
}

fn parse_code_arg(s: &str) -> Result<u32, String> {
    stepguard_config::parse_code(s).map_err(|e| e.to_string())
}
