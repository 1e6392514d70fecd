//! Command-line argument parsing tests.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation warning

use assert_cmd::Command;
use capture_qa_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

fn isolated() -> (tempfile::TempDir, Command) {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("capture-qa").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path());
    (dir, cmd)
}

#[test]
fn test_help() {
    let (_dir, mut cmd) = isolated();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-brightness"))
        .stdout(predicate::str::contains("--dark-threshold"));
}

#[test]
fn test_missing_paths() {
    let (_dir, mut cmd) = isolated();
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_check_subcommand_missing_paths() {
    let (_dir, mut cmd) = isolated();
    cmd.arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No paths specified"));
}

#[test]
fn test_nonexistent_path_warns() {
    let (_dir, mut cmd) = isolated();
    cmd.arg("nope.png")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_format() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--format", "xml", "x.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'xml'"));
}

#[test]
fn test_dark_threshold_out_of_range() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--dark-threshold", "300", "x.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("300 is not in 0.0..=255.0"));
}

#[test]
fn test_dark_threshold_not_a_number() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--dark-threshold", "dim", "x.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'dim' is not a valid number"));
}

#[test]
fn test_negative_blur_threshold() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--blur-threshold=-1", "x.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a finite number >= 0"));
}

#[test]
fn test_unknown_backend() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["--backend", "tpu", "x.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tpu"));
}

#[test]
fn test_check_subcommand_runs() {
    let (dir, mut cmd) = isolated();
    SyntheticImageBuilder::white(8, 8)
        .image()
        .save(dir.path().join("white.png"))
        .unwrap();

    cmd.args(["check", "--quiet", "white.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"is_acceptable\":true"));
}

#[test]
fn test_device_cpu_report() {
    let (_dir, mut cmd) = isolated();
    cmd.args(["device", "--backend", "cpu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"backend\":\"cpu\""))
        .stdout(predicate::str::contains("\"preference\":\"cpu\""));
}

#[test]
fn test_device_auto_always_resolves() {
    let (_dir, mut cmd) = isolated();
    cmd.arg("device")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gpu_available\""));
}
