//! Regulator assembly: config mapping, collaborator wiring, and run output.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use stepguard_config::{Config, KeyBinding};
use stepguard_core::builder::{ControllerBuilder, Missing};
use stepguard_core::error::Result as CoreResult;
use stepguard_core::{
    AlertCfg, DisplayCfg, DistanceSample, DistanceSampler, RateCfg, RegulationCfg, RepeatFilter,
    RunOptions, RunSummary, SamplingCfg, SamplingMode, StopReason,
};

use crate::cli::SamplingArg;
use crate::input::command_channel;

pub struct RunRequest {
    pub press: Vec<u32>,
    pub stdin: bool,
    pub max_run_ms: Option<u64>,
    pub sampling: Option<SamplingArg>,
    pub sim_start_cm: f32,
    pub sim_speed_cm_s: f32,
}

fn sampling_cfg(cfg: &Config, over: Option<SamplingArg>) -> SamplingCfg {
    let mut sampling: SamplingCfg = (&cfg.sampling).into();
    match over {
        Some(SamplingArg::Direct) => sampling.mode = SamplingMode::Direct,
        Some(SamplingArg::Background) => sampling.mode = SamplingMode::Background,
        None => {}
    }
    sampling
}

/// Builder with every config section applied but no collaborators yet.
fn base_builder(
    cfg: &Config,
    keymap: Vec<KeyBinding>,
    sampling: SamplingCfg,
) -> ControllerBuilder<Missing, Missing> {
    ControllerBuilder::new()
        .with_keymap(keymap)
        .with_regulation(RegulationCfg::from(&cfg.regulation))
        .with_rate(RateCfg::from(&cfg.rate))
        .with_alert(AlertCfg::from(&cfg.alert))
        .with_sampling(sampling)
        .with_display_cfg(DisplayCfg::from(&cfg.display))
}

pub fn run_regulator(
    cfg: &Config,
    keymap: Vec<KeyBinding>,
    req: &RunRequest,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary> {
    let sampling = sampling_cfg(cfg, req.sampling);
    let builder = base_builder(cfg, keymap, sampling)
        .with_commands(RepeatFilter::new(command_channel(&req.press, req.stdin)));
    let opts = RunOptions {
        max_run: req.max_run_ms.map(Duration::from_millis),
    };

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        let _ = (req.sim_start_cm, req.sim_speed_cm_s);
        let hw = hardware::open(cfg)?;
        let builder = builder
            .with_ranger(hw.ranger)
            .with_stepper(hw.stepper)
            .with_display(stepguard_hardware::LogDisplay::default());
        let builder = match hw.alert {
            Some(a) => builder.with_alert_output(a),
            None => builder,
        };
        stepguard_core::run(builder, opts, shutdown)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        let builder = builder
            .with_ranger(stepguard_hardware::SimulatedRanger::new(
                req.sim_start_cm,
                req.sim_speed_cm_s,
            ))
            .with_stepper(stepguard_hardware::SimulatedStepper::new())
            .with_alert_output(stepguard_hardware::SimulatedAlert::default())
            .with_display(stepguard_hardware::LogDisplay::default());
        stepguard_core::run(builder, opts, shutdown)
    }
}

/// One ping through the configured ranger.
pub fn probe_distance(cfg: &Config) -> CoreResult<DistanceSample> {
    let sampling: SamplingCfg = (&cfg.sampling).into();
    let min_clamp = cfg.regulation.min_clamp_cm;

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let ranger = hardware::open(cfg)?.ranger;
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let ranger = stepguard_hardware::SimulatedRanger::new(150.0, 0.0);

    let mut sampler = DistanceSampler::new(ranger, sampling.echo_timeout, min_clamp);
    Ok(sampler.sample())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod hardware {
    use eyre::WrapErr;
    use stepguard_config::Config;
    use stepguard_core::error::Result as CoreResult;
    use stepguard_core::map_hw_error;
    use stepguard_hardware::error::HwError;
    use stepguard_hardware::hardware::{GpioAlert, GpioStepper, Hcsr04, open_gpio};

    pub struct Hardware {
        pub ranger: Hcsr04,
        pub stepper: GpioStepper,
        pub alert: Option<GpioAlert>,
    }

    fn hw(e: HwError) -> eyre::Report {
        eyre::Report::new(map_hw_error(&e))
    }

    pub fn open(cfg: &Config) -> CoreResult<Hardware> {
        let p = &cfg.pins;
        let gpio = open_gpio().map_err(hw).wrap_err("open gpio")?;
        let ranger = Hcsr04::new(&gpio, p.trigger, p.echo)
            .map_err(hw)
            .wrap_err("open ranger pins")?;
        let stepper = GpioStepper::new(&gpio, p.step, p.dir, p.enable, cfg.rate.steps_per_rev)
            .map_err(hw)
            .wrap_err("open stepper pins")?;
        let alert = match p.alert_led {
            Some(pin) => Some(
                GpioAlert::new(&gpio, pin)
                    .map_err(hw)
                    .wrap_err("open alert pin")?,
            ),
            None => None,
        };
        tracing::info!(
            trigger = p.trigger,
            echo = p.echo,
            step = p.step,
            dir = p.dir,
            "gpio collaborators ready"
        );
        Ok(Hardware {
            ranger,
            stepper,
            alert,
        })
    }
}

fn reason_name(r: StopReason) -> &'static str {
    match r {
        StopReason::Shutdown => "Shutdown",
        StopReason::MaxRuntime => "MaxRuntime",
    }
}

/// Final summary as a single JSON object.
pub fn summary_json(s: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "reason": reason_name(s.reason),
        "elapsed_ms": s.elapsed_ms,
        "commanded": s.last.commanded.get(),
        "effective": s.last.effective.get(),
        "reducing": s.last.reducing,
        "distance_cm": s.last.distance.cm(),
        "alert": s.last.alert,
        "stats": {
            "passes": s.stats.passes,
            "samples": s.stats.samples,
            "no_echo_samples": s.stats.no_echo_samples,
            "renders": s.stats.renders,
            "commands_accepted": s.stats.commands_accepted,
            "commands_ignored": s.stats.commands_ignored,
        },
    })
}

/// Final summary for a terminal.
pub fn summary_text(s: &RunSummary, alert_on_cm: u32) -> String {
    let distance = match s.last.distance {
        DistanceSample::Cm(d) => format!("{d}cm"),
        DistanceSample::NoEcho => "no echo".to_string(),
    };
    let lines = stepguard_core::format_status(
        s.last.commanded,
        s.last.effective,
        s.last.distance,
        alert_on_cm,
    );
    format!(
        "Stopped ({}) after {} ms: commanded {}, effective {}, distance {}, alert {}\n[{}]\n[{}]",
        reason_name(s.reason),
        s.elapsed_ms,
        s.last.commanded,
        s.last.effective,
        distance,
        if s.last.alert { "on" } else { "off" },
        lines.line1,
        lines.line2,
    )
}

/// Print loop stats to stderr.
pub fn print_stats(s: &RunSummary) {
    let per_sec = if s.elapsed_ms > 0 {
        s.stats.passes as f64 * 1000.0 / s.elapsed_ms as f64
    } else {
        0.0
    };
    eprintln!("\n--- Stepguard Stats ---");
    eprintln!("Passes: {} ({per_sec:.0}/s)", s.stats.passes);
    eprintln!(
        "Samples: {} ({} without echo)",
        s.stats.samples, s.stats.no_echo_samples
    );
    eprintln!("Display refreshes: {}", s.stats.renders);
    eprintln!(
        "Commands accepted/ignored: {} / {}",
        s.stats.commands_accepted, s.stats.commands_ignored
    );
    eprintln!("-----------------------\n");
}
