//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;

use assert_cmd::Command;
use capture_qa_test_support::SyntheticImageBuilder;
use predicates::prelude::*;
use tempfile::TempDir;

/// Workspace with a black and a white capture and no config files.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    SyntheticImageBuilder::black(8, 8)
        .image()
        .save(dir.path().join("black.png"))
        .unwrap();
    SyntheticImageBuilder::white(8, 8)
        .image()
        .save(dir.path().join("white.png"))
        .unwrap();
    dir
}

fn command(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("capture-qa").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .arg("--quiet");
    cmd
}

fn write_xdg(dir: &TempDir, content: &str) {
    let config_dir = dir.path().join("xdg").join("capture-qa");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), content).unwrap();
}

fn write_project(dir: &TempDir, content: &str) {
    fs::write(dir.path().join(".capture-qa.toml"), content).unwrap();
}

#[test]
fn test_defaults_without_config() {
    let dir = workspace();
    command(&dir).arg("black.png").assert().code(1);
}

#[test]
fn test_project_config_sets_format() {
    let dir = workspace();
    write_project(&dir, "[output]\nformat = 'json'\n");

    command(&dir)
        .arg("white.png")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_format_overrides_config() {
    let dir = workspace();
    write_project(&dir, "[output]\nformat = 'json'\n");

    command(&dir)
        .args(["--format", "jsonl", "white.png"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_disables_brightness() {
    let dir = workspace();
    write_project(&dir, "[brightness]\nenabled = false\n\n[blur]\nenabled = false\n");

    command(&dir).arg("black.png").assert().success();
}

#[test]
fn test_project_config_threshold() {
    let dir = workspace();
    write_project(&dir, "[brightness]\ndark_threshold = 0.0\n");

    // Nothing is below zero.
    command(&dir).arg("black.png").assert().success();
}

#[test]
fn test_cli_threshold_overrides_config() {
    let dir = workspace();
    write_project(&dir, "[brightness]\ndark_threshold = 0.0\n");

    command(&dir)
        .args(["--dark-threshold", "40", "black.png"])
        .assert()
        .code(1);
}

#[test]
fn test_project_overrides_xdg() {
    let dir = workspace();
    write_xdg(&dir, "[brightness]\ndark_threshold = 0.0\n");
    command(&dir).arg("black.png").assert().success();

    write_project(&dir, "[brightness]\ndark_threshold = 50.0\n");
    command(&dir).arg("black.png").assert().code(1);
}

#[test]
fn test_xdg_and_project_merge() {
    let dir = workspace();
    write_xdg(&dir, "[output]\nformat = 'json'\n");
    write_project(&dir, "[brightness]\ndark_threshold = 0.0\n");

    command(&dir)
        .arg("black.png")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_invalid_config_value_warns() {
    let dir = workspace();
    write_project(&dir, "[blur]\nbackend = 'tpu'\n");

    command(&dir)
        .arg("white.png")
        .assert()
        .success()
        .stderr(predicate::str::contains("blur.backend"));
}

#[test]
fn test_config_found_in_parent_directory() {
    let dir = workspace();
    write_project(&dir, "[brightness]\ndark_threshold = 0.0\n");
    let nested = dir.path().join("shots");
    fs::create_dir_all(&nested).unwrap();
    fs::copy(dir.path().join("black.png"), nested.join("black.png")).unwrap();

    command(&dir)
        .current_dir(&nested)
        .arg("black.png")
        .assert()
        .success();
}
