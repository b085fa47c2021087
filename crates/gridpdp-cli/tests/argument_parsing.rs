//! Argument parsing tests that need no policy files.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;

fn gridpdp() -> Command {
    Command::cargo_bin("gridpdp").unwrap()
}

#[test]
fn version_command_lists_algorithms() {
    gridpdp()
        .args(["--no-color", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deny-Overrides"))
        .stdout(predicate::str::contains("x500Name"));
}

#[test]
fn version_flag_shows_version() {
    gridpdp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridpdp"));
}

#[test]
fn help_flag_shows_usage() {
    gridpdp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn evaluate_requires_request() {
    gridpdp()
        .arg("evaluate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--request"));
}

#[test]
fn evaluate_rejects_unknown_mode() {
    gridpdp()
        .args(["evaluate", "--request", "r.json", "--mode", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn check_requires_policies() {
    gridpdp()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn config_show_rejects_unknown_format() {
    gridpdp()
        .args(["config", "show", "--format", "yaml"])
        .assert()
        .failure();
}

#[test]
fn evaluate_help_shows_options() {
    gridpdp()
        .args(["evaluate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--policy"))
        .stdout(predicate::str::contains("--explain"));
}
