//! Human-readable error descriptions and structured JSON error formatting.

use stepguard_core::error::{BuildError, DriveError};

/// Wrap a configuration problem so it maps to the config exit code.
pub fn config_error(msg: impl Into<String>) -> eyre::Report {
    eyre::Report::new(DriveError::Config(msg.into()))
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/stepguard.toml for a sample."
        );
    }

    if let Some(de) = err.downcast_ref::<DriveError>() {
        return match de {
            DriveError::Config(msg) if msg.contains("keymap CSV must have headers") => {
                "Invalid headers in keymap CSV. Expected 'code,level'.".to_string()
            }
            DriveError::Config(msg) => format!(
                "What happened: Configuration problem: {msg}.\nLikely causes: Missing file, missing [pins], or out-of-range values.\nHow to fix: Edit the TOML config (or keymap CSV) and try again."
            ),
            DriveError::Timeout => {
                "What happened: The ultrasonic ranger timed out.\nLikely causes: TRIG/ECHO pins swapped, no 5V/GND, or echo_timeout_ms too low.\nHow to fix: Check [pins] and wiring, and consider raising sampling.echo_timeout_ms.".to_string()
            }
            DriveError::Hardware(msg) | DriveError::HardwareFault(msg) | DriveError::Io(msg) => {
                format!(
                    "What happened: Hardware error ({msg}).\nLikely causes: Incorrect pin numbers, wiring/power issues, or missing GPIO permissions.\nHow to fix: Fix the [pins] values in the config and ensure the process can access GPIO."
                )
            }
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for configuration problems, 3 for hardware, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<DriveError>() {
        Some(DriveError::Config(_)) => 2,
        Some(
            DriveError::Hardware(_)
            | DriveError::HardwareFault(_)
            | DriveError::Io(_)
            | DriveError::Timeout,
        ) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        2 => "Config",
        3 => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "detail": format!("{err:#}"),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn wrapped_hardware_errors_keep_their_exit_code() {
        let err: eyre::Result<()> = Err(eyre::Report::new(DriveError::Hardware("pin 18 busy".into())));
        let err = err.wrap_err("stepping motor").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("pin 18 busy"));
    }

    #[test]
    fn config_errors_map_to_two() {
        let err = config_error("alert.on_cm must be < alert.off_cm");
        assert_eq!(exit_code_for_error(&err), 2);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
        assert!(v["message"].as_str().unwrap().contains("alert.on_cm"));
    }

    #[test]
    fn plain_errors_are_generic() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("Original: boom"));
    }
}
