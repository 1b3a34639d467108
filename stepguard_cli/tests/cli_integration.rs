use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config; the sim backend ignores the pins but they must be present
fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[pins]
trigger = 23
echo = 24
step = 17
dir = 27

[sampling]
period_ms = 20
echo_timeout_ms = 30

[display]
refresh_ms = 100
{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--max-run-ms", "150"], 0, "Stopped (MaxRuntime)", "stdout")]
#[case(&["run", "--press", "0xZZ"], 2, "invalid remote code", "stderr")]
#[case(&["keymap"], 0, "0x00FF52AD -> 9", "stdout")]
#[case(&["self-check"], 0, "distance 150cm", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = Command::cargo_bin("stepguard").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg).arg("--log-level").arg("error");
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
#[case::missing_file(None, "Configuration problem")]
#[case::inverted_alert(Some("[alert]\non_cm = 30\noff_cm = 25\n"), "alert.on_cm")]
#[case::zero_rate(Some("[rate]\nlevel1_rpm = 0.0\n"), "rate.level1_rpm")]
fn cli_rejects_bad_config(#[case] extra: Option<&str>, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = match extra {
        Some(e) => write_config(&dir, e),
        None => dir.path().join("missing.toml"),
    };

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--config").arg(&cfg).arg("keymap");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn cli_reports_bad_keymap_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let bad_csv = dir.path().join("keys.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "code,speed").unwrap();
    writeln!(f, "0xFF6897,0").unwrap();

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--keymap")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid headers in keymap CSV"));
}

#[rstest]
fn cli_keymap_csv_replaces_defaults() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let csv = dir.path().join("keys.csv");
    fs::write(&csv, "code,level\n0x10,0\n17,4\n").unwrap();

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--keymap")
        .arg(&csv)
        .arg("keymap");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0x00000011 -> 4"))
        .stdout(predicate::str::contains("0x00FF52AD").not());
}
