// ABOUTME: Integration tests for the trainload-cli binary
// ABOUTME: Help output, bundle errors and the load command's JSON report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::io::Write;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::NamedTempFile;

/// Run the CLI and capture exit code, stdout and stderr
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_trainload-cli"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn two_day_bundle() -> NamedTempFile {
    let times: Vec<f64> = (0..=3600).map(f64::from).collect();
    let watts = vec![200.0; times.len()];
    let bundle = json!({
        "athlete": {
            "id": 3,
            "ftp_history": [{"ts": "2024-01-01T00:00:00Z", "value": 200.0}]
        },
        "activities": [
            {
                "id": 1,
                "athlete": 3,
                "ts": "2024-03-01T08:00:00Z",
                "base_type": "ride",
                "streams": {"time": times, "watts": watts}
            },
            {
                "id": 2,
                "athlete": 3,
                "ts": "2024-03-02T08:00:00Z",
                "base_type": "ride",
                "streams": {"time": times, "watts": watts}
            }
        ]
    });
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bundle.to_string().as_bytes()).unwrap();
    file
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for command in ["stats", "load", "peaks"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_missing_bundle_fails() {
    let (code, stdout, stderr) = run_cli(&["stats", "--bundle", "/nonexistent/bundle.json"]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("bundle"), "{stderr}");
}

#[test]
fn test_load_reports_rising_training_load() {
    let bundle = two_day_bundle();
    let path = bundle.path().to_str().unwrap();

    let (code, stdout, stderr) = run_cli(&["load", "--bundle", path]);
    assert_eq!(code, 0, "{stderr}");

    let rows: Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let tss = rows[0]["tss"].as_f64().unwrap();
    assert!((tss - 100.0).abs() < 1e-3);
    let first_atl = rows[0]["training"]["atl"].as_f64().unwrap();
    let second_atl = rows[1]["training"]["atl"].as_f64().unwrap();
    assert!(second_atl > first_atl);
}
