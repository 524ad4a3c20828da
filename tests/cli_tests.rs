//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the serve-loadgen binary
fn loadgen_cmd() -> Command {
    Command::cargo_bin("serve-loadgen").unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    loadgen_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve-loadgen"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("version"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    loadgen_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve-loadgen"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"))
        .stdout(predicate::str::contains("Target"));
}

#[test]
fn test_short_version_flag() {
    loadgen_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve-loadgen"));
}

#[test]
fn test_run_help_lists_overrides() {
    loadgen_cmd()
        .arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--plan"))
        .stdout(predicate::str::contains("--users"))
        .stdout(predicate::str::contains("--duration"))
        .stdout(predicate::str::contains("--create-resources"));
}

// ─────────────────────────────────────────────────────────────────
// Invalid Invocation Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_rejected() {
    loadgen_cmd()
        .arg("stampede")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stampede"));
}

#[test]
fn test_run_with_unknown_plan_fails() {
    loadgen_cmd()
        .arg("run")
        .arg("--plan")
        .arg("rush-hour")
        .arg("--duration")
        .arg("1")
        .assert()
        .failure();
}

#[test]
fn test_run_with_missing_config_file_fails() {
    loadgen_cmd()
        .arg("run")
        .arg("--config")
        .arg("/nonexistent/loadgen.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E100"));
}
