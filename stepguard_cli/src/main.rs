//! `stepguard` binary entry point.

mod cli;
mod error_fmt;
mod input;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use stepguard_config::{Config, KeyBinding, Logging};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{config_error, exit_code_for_error, format_error_json, humanize};
use crate::run::{RunRequest, print_stats, probe_distance, run_regulator, summary_json, summary_text};

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: could not install error report hook: {e}");
    }
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        tracing::debug!(error = ?err, "exiting with error");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    let keymap = load_keymap(&cfg, cli.keymap.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), bindings = keymap.len(), "config loaded");

    match cli.cmd {
        Commands::Run {
            press,
            stdin,
            max_run_ms,
            sampling,
            sim_start_cm,
            sim_speed_cm_s,
            stats,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;

            let req = RunRequest {
                press,
                stdin,
                max_run_ms,
                sampling,
                sim_start_cm,
                sim_speed_cm_s,
            };
            let summary = run_regulator(&cfg, keymap, &req, shutdown)?;
            if stats {
                print_stats(&summary);
            }
            if cli.json {
                println!("{}", summary_json(&summary));
            } else {
                println!("{}", summary_text(&summary, cfg.alert.on_cm));
            }
        }
        Commands::SelfCheck => {
            let sample = probe_distance(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "bindings": keymap.len(),
                        "distance_cm": sample.cm(),
                    })
                );
            } else {
                match sample.cm() {
                    Some(d) => println!("OK: config valid, {} bindings, distance {d}cm", keymap.len()),
                    None => println!("OK: config valid, {} bindings, no echo", keymap.len()),
                }
            }
        }
        Commands::Keymap => print_keymap(&keymap, cli.json),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("read config {}: {e}", path.display())))?;
    let cfg = stepguard_config::load_toml(&text)
        .map_err(|e| config_error(format!("parse config {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| config_error(format!("{e}")))?;
    Ok(cfg)
}

/// `--keymap` CSV wins over inline `[keymap]` bindings, which win over the defaults.
fn load_keymap(cfg: &Config, csv: Option<&Path>) -> Result<Vec<KeyBinding>> {
    match csv {
        Some(p) => stepguard_config::load_keymap_csv(p).map_err(|e| config_error(format!("{e}"))),
        None => Ok(cfg.effective_keymap()),
    }
}

fn print_keymap(keymap: &[KeyBinding], json: bool) {
    let mut sorted = keymap.to_vec();
    sorted.sort_by_key(|b| (b.level, b.code));
    if json {
        let rows: Vec<_> = sorted
            .iter()
            .map(|b| serde_json::json!({ "code": format!("{:#X}", b.code), "level": b.level }))
            .collect();
        println!("{}", serde_json::Value::Array(rows));
    } else {
        for b in &sorted {
            println!("{:#010X} -> {}", b.code, b.level);
        }
    }
}

fn init_tracing(json: bool, level: &str, logging: &Logging) -> Result<()> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err("invalid --log-level")?,
    };
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let Some(name) = path.file_name() else {
                return Err(config_error(format!("logging.file {file:?} has no file name")));
            };
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "never" => tracing_appender::rolling::never(dir, name),
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                other => {
                    return Err(config_error(format!(
                        "logging.rotation must be never|daily|hourly, got {other:?}"
                    )));
                }
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
                .map_err(|e| config_error(format!("logging.level: {e}")))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("init tracing: {e}"))
}
