//! Integration tests for spatialflow-cli.
//!
//! Tests invoke the built binary and check its output for every command.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `spatialflow` binary built by cargo.
fn spatialflow_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spatialflow"))
}

fn stdout_of(args: &[&str]) -> String {
    let output = spatialflow_bin()
        .args(args)
        .output()
        .expect("failed to run spatialflow");
    assert!(
        output.status.success(),
        "spatialflow {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// `spatialflow info`
// ---------------------------------------------------------------------------

#[test]
fn cli_info_lists_kinds_protocols_and_demos() {
    let stdout = stdout_of(&["info"]);

    assert!(stdout.contains("Parameter Kinds"));
    for protocol in ["DoubleBuffering", "MessageQueue", "SharedData"] {
        assert!(stdout.contains(protocol), "missing protocol {protocol}");
    }
    for demo in ["passthrough", "identity", "swap", "fanout", "downmix"] {
        assert!(stdout.contains(demo), "missing demo {demo}");
    }
}

#[test]
fn cli_info_prints_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[context]\nperiod = 128\n").unwrap();

    let stdout = stdout_of(&["--config", path.to_str().unwrap(), "info", "--show-config"]);
    assert!(stdout.contains("period = 128"), "got: {stdout}");
}

#[test]
fn cli_help_works() {
    let stdout = stdout_of(&["--help"]);
    assert!(stdout.contains("inspect"));
    assert!(stdout.contains("run"));
}

// ---------------------------------------------------------------------------
// `spatialflow inspect`
// ---------------------------------------------------------------------------

#[test]
fn cli_inspect_shows_schedule_and_rows() {
    let stdout = stdout_of(&["inspect", "downmix"]);

    assert!(stdout.contains("Schedule"));
    let half = stdout.find("top/half").expect("half scheduled");
    let sum = stdout.find("top/sum").expect("sum scheduled");
    assert!(half < sum, "half must run before sum");
    assert!(stdout.contains("Row Map"));
}

#[test]
fn cli_inspect_json_is_valid() {
    let stdout = stdout_of(&["inspect", "swap", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    assert_eq!(value["demo"], "swap");
    assert_eq!(value["capture_width"], 2);
    assert_eq!(value["schedule"][0], "top/matrix");
}

#[test]
fn cli_inspect_unknown_demo_fails() {
    let output = spatialflow_bin()
        .args(["inspect", "no-such-demo"])
        .output()
        .expect("failed to run spatialflow");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown demo"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// `spatialflow run`
// ---------------------------------------------------------------------------

#[test]
fn cli_run_every_demo() {
    for demo in ["passthrough", "identity", "swap", "fanout", "downmix"] {
        let stdout = stdout_of(&["run", demo, "--blocks", "8"]);
        assert!(stdout.contains("OK: 8 blocks"), "{demo}: {stdout}");
    }
}

#[test]
fn cli_run_honours_config_period() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[context]\nperiod = 32\n\n[memory]\nalignment_bytes = 64\n").unwrap();

    let stdout = stdout_of(&["-c", path.to_str().unwrap(), "run", "identity", "-b", "4"]);
    assert!(stdout.contains("blocks of 32 samples"), "got: {stdout}");
}

#[test]
fn cli_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[memory]\nalignment_bytes = 12\n").unwrap();

    let output = spatialflow_bin()
        .args(["--config", path.to_str().unwrap(), "info"])
        .output()
        .expect("failed to run spatialflow");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("alignment_bytes"), "got: {stderr}");
}
