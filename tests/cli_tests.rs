// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the actual pyrolog binary against a recorded session.

mod common;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use common::{session_start, temp_workspace, SimDevice};
use pyrolog::core::ManualClock;
use pyrolog::io::constants::stream;
use pyrolog::{LiveTransport, LogWriter, Robot};

/// Run pyrolog with arguments
fn run(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_pyrolog");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|_| panic!("Failed to run {:?}", bin))
}

/// Run pyrolog and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run pyrolog and assert failure
fn run_err(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        !output.status.success(),
        "Command should have failed but succeeded: {:?}",
        args
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Record the CLI drive routine for 300 ms against a simulated device.
fn record_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("naio170615_134507.log");
    let clock = ManualClock::new();
    let writer = Arc::new(
        LogWriter::with_clock(File::create(&path).unwrap(), session_start(), clock.clone())
            .unwrap(),
    );
    writer.write(stream::INFO, b"cli fixture").unwrap();
    writer
        .write(stream::SIDE_CHANNEL, &zstd::bulk::compress(b"side bytes", 3).unwrap())
        .unwrap();

    let device = SimDevice::with_cycles(5, clock, Duration::from_millis(100));
    let mut robot = Robot::new(LiveTransport::new(device, Arc::clone(&writer)));
    robot.annot(b"TAG:forward:BEGIN").unwrap();
    robot.move_forward();
    robot.wait(Duration::from_millis(300)).unwrap();
    robot.stop();
    robot.update().unwrap();
    robot.annot(b"TAG:forward:END").unwrap();
    writer.finish().unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    let stdout = run_ok(&["--help"]);
    assert!(stdout.contains("inspect"));
    assert!(stdout.contains("replay"));
    assert!(stdout.contains("run"));
}

#[test]
fn test_missing_file() {
    let stderr = run_err(&["inspect", "info", "/nonexistent/session.log"]);
    assert!(stderr.contains("Error"), "{stderr}");
}

// ============================================================================
// Inspect
// ============================================================================

#[test]
fn test_inspect_info() {
    let (dir, _guard) = temp_workspace("cli_info");
    let path = record_fixture(&dir);

    let stdout = run_ok(&["inspect", "info", path.to_str().unwrap()]);
    assert!(stdout.contains("Start: 2017-06-15 13:45:07.250000"), "{stdout}");
    assert!(stdout.contains("inbound | 5 records"), "{stdout}");
    assert!(stdout.contains("outbound | 5 records"), "{stdout}");
    assert!(stdout.contains("Duration: 500ms"), "{stdout}");
}

#[test]
fn test_inspect_info_json() {
    let (dir, _guard) = temp_workspace("cli_json");
    let path = record_fixture(&dir);

    let stdout = run_ok(&["inspect", "info", path.to_str().unwrap(), "--json"]);
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["records"], 14);
    assert_eq!(doc["duration_us"], 500_000);
    assert_eq!(doc["truncated"], false);
    assert_eq!(doc["streams"][3]["name"], "side-channel");
}

#[test]
fn test_inspect_records_filtered() {
    let (dir, _guard) = temp_workspace("cli_records");
    let path = record_fixture(&dir);

    let stdout = run_ok(&[
        "inspect",
        "records",
        path.to_str().unwrap(),
        "--stream",
        "2",
        "--limit",
        "2",
    ]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].contains("4e41494f303101000000027070"), "{stdout}");
}

#[test]
fn test_inspect_frames() {
    let (dir, _guard) = temp_workspace("cli_frames");
    let path = record_fixture(&dir);

    let stdout = run_ok(&["inspect", "frames", path.to_str().unwrap()]);
    assert!(stdout.contains("Total frames: 10"), "{stdout}");
    // Four ticks per side.
    assert!(stdout.contains("Total distance 0.13m"), "{stdout}");
}

#[test]
fn test_inspect_side() {
    let (dir, _guard) = temp_workspace("cli_side");
    let path = record_fixture(&dir);
    let out = dir.join("side.bin");

    run_ok(&[
        "inspect",
        "side",
        path.to_str().unwrap(),
        out.to_str().unwrap(),
    ]);
    assert_eq!(fs::read(&out).unwrap(), b"side bytes");
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_replay_same_routine() {
    let (dir, _guard) = temp_workspace("cli_replay");
    let path = record_fixture(&dir);

    let stdout = run_ok(&["replay", path.to_str().unwrap(), "--duration", "0.3"]);
    assert!(stdout.contains("Commands checked: 5"), "{stdout}");
}

#[test]
fn test_replay_divergent_routine() {
    let (dir, _guard) = temp_workspace("cli_diverge");
    let path = record_fixture(&dir);

    let stderr = run_err(&["replay", path.to_str().unwrap(), "--duration", "0.5"]);
    assert!(stderr.contains("diverge"), "{stderr}");

    let stdout = run_ok(&[
        "replay",
        path.to_str().unwrap(),
        "--duration",
        "0.5",
        "--force",
    ]);
    assert!(stdout.contains("Divergences: 1"), "{stdout}");
}
