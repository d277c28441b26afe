//! Corruption recovery tests for questlog_cli.
//!
//! These tests verify the system can handle:
//! - Corrupted stats and catalog files
//! - Corrupted WAL files
//! - Partial writes

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("questlog"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_stats_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::write(data_dir.join("stats.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted stats");

    // Logging still works; the corrupt book degrades to defaults
    cli()
        .arg("log")
        .arg("floss")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged!"));
}

#[test]
fn test_corrupted_catalog_falls_back_to_starter() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::write(data_dir.join("habits.json"), "not even json")
        .expect("Failed to write corrupted catalog");

    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("QUEST BOARD"));
}

#[test]
fn test_partial_wal_line_ignored_during_recompute() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // A real log, then a partial line simulating a crash mid-write
    cli()
        .arg("log")
        .arg("pushups")
        .arg("--value")
        .arg("10")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    let wal_path = data_dir.join("wal/logs.wal");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    cli()
        .arg("recompute")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Replayed 1 logs"));
}

#[test]
fn test_corrupted_wal_lines_skipped_by_rollup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("log")
        .arg("floss")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    let wal_path = data_dir.join("wal/logs.wal");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .unwrap();
    writeln!(file, "{{ invalid json }}").unwrap();
    drop(file);

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 logs"));
}
