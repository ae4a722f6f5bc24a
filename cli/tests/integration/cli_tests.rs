//! Integration tests for the CLI skeleton: help, version, global flags.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn attrsync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("attrsync"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // A set NO_COLOR counts as a supplied argument, which would turn the help
    // screen into a missing-subcommand error.
    attrsync()
        .env_remove("NO_COLOR")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Bulk-apply custom attributes"));
}

#[test]
fn test_no_color_accepts_conventional_values() {
    for value in ["1", "true", "yes"] {
        attrsync()
            .arg("version")
            .env("NO_COLOR", value)
            .assert()
            .success()
            .stdout(predicate::str::contains("attrsync "));
    }
}

#[test]
fn test_no_color_empty_value_is_accepted() {
    attrsync()
        .arg("version")
        .env("NO_COLOR", "")
        .assert()
        .success();
}

#[test]
fn test_cli_help_lists_commands() {
    attrsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_apply_help_flags_insecure_tls_default() {
    attrsync()
        .args(["apply", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--verify-tls"))
        .stdout(predicate::str::contains("Verification is OFF"));
}

#[test]
fn test_version_flag_shows_version() {
    attrsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("attrsync"));
}

#[test]
fn test_version_command_shows_version() {
    attrsync()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "attrsync ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = attrsync()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_subcommand_fails() {
    attrsync().arg("sync-all").assert().failure();
}
