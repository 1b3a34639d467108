use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[pins]
trigger = 23
echo = 24
step = 17
dir = 27

[sampling]
period_ms = 20
echo_timeout_ms = 30
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_line(stdout: &[u8], key: &str) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .find(|l| l.contains(&format!("\"{key}\"")))
        .unwrap_or("")
        .to_string();
    assert!(!line.is_empty(), "no JSON line with {key} found; stdout was: {stdout}");
    serde_json::from_str(&line).expect("valid JSON")
}

/// Obstacle parked at 15 cm while level 5 is commanded: reduced to 2, alert on.
#[rstest]
#[case::direct("direct")]
#[case::background("background")]
fn json_summary_for_reduced_run(#[case] mode: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--press", "0xFF38C7", "--max-run-ms", "300"])
        .args(["--sim-start-cm", "15", "--sim-speed-cm-s", "0"])
        .args(["--sampling", mode]);

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line(&out, "effective");

    assert_eq!(v["reason"], "MaxRuntime");
    assert_eq!(v["commanded"], 5);
    assert_eq!(v["effective"], 2);
    assert_eq!(v["reducing"], true);
    assert_eq!(v["alert"], true);
    assert_eq!(v["distance_cm"], 15);
    assert!(v["elapsed_ms"].as_u64().unwrap() >= 300);
    assert!(v["stats"]["samples"].as_u64().unwrap() >= 1);
    assert_eq!(v["stats"]["commands_accepted"], 1);
}

#[rstest]
fn json_summary_reads_codes_from_stdin() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // piping stdin needs assert_cmd's own Command
    let mut cmd = assert_cmd::Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--stdin", "--max-run-ms", "400"])
        .args(["--sim-start-cm", "300", "--sim-speed-cm-s", "0"])
        .write_stdin("# remote\n0xFFFFFFFF\n0xFF52AD\n");

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = json_line(&out, "effective");
    assert_eq!(v["commanded"], 9);
    assert_eq!(v["effective"], 9);
    assert_eq!(v["reducing"], false);
    assert_eq!(v["alert"], false);
}

#[rstest]
fn json_error_for_missing_config() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--json")
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check");

    let out = cmd.assert().code(2).get_output().stdout.clone();
    let v = json_line(&out, "reason");
    assert_eq!(v["reason"], "Config");
    assert!(v["message"].as_str().unwrap().contains("read config"));
}

#[rstest]
fn json_keymap_lists_default_digits() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.arg("--json").arg("--config").arg(&cfg).arg("keymap");
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["code"], "0xFF6897");
    assert_eq!(rows[0]["level"], 0);
    assert_eq!(rows[9]["level"], 9);
}
