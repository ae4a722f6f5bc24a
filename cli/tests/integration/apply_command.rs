//! Integration tests for `attrsync apply` failure paths.
//!
//! Every test here fails before a session is opened, or against a port
//! nothing listens on, so no vCenter is needed.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn attrsync(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("attrsync"));
    cmd.env("NO_COLOR", "1")
        .env("ATTRSYNC_CONFIG", dir.path().join("config.yaml"))
        .env_remove("ATTRSYNC_HOST")
        .env_remove("ATTRSYNC_USER")
        .env_remove("ATTRSYNC_PASSWORD");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write input");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_missing_identifier_column_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "machines.csv", "Name,Env\nweb01,prod\n");

    // The host is unroutable; reaching it would hang, not fail fast.
    attrsync(&dir)
        .args(["apply", "--file", &file, "--host", "203.0.113.1", "--user", "admin"])
        .env("ATTRSYNC_PASSWORD", "secret")
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no 'VM Name' column"))
        .stdout(predicate::str::contains("done").not())
        .stdout(predicate::str::contains("connecting").not());
}

#[test]
fn test_missing_host_is_reported() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "machines.csv", "VM Name,Env\nweb01,prod\n");

    attrsync(&dir)
        .args(["apply", "--file", &file, "--user", "admin", "--password", "x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no vCenter host"));
}

#[test]
fn test_non_interactive_without_password_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "machines.csv", "VM Name,Env\nweb01,prod\n");

    attrsync(&dir)
        .args(["apply", "--yes", "--file", &file, "--host", "vc01.lab", "--user", "admin"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ATTRSYNC_PASSWORD"));
}

#[test]
fn test_host_and_user_fall_back_to_config() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "machines.csv", "Name,Env\nweb01,prod\n");
    attrsync(&dir)
        .args(["config", "set", "connection.host", "vc01.lab"])
        .assert()
        .success();
    attrsync(&dir)
        .args(["config", "set", "connection.user", "admin"])
        .assert()
        .success();

    // Host and user resolve from config, so the run gets as far as loading.
    attrsync(&dir)
        .args(["apply", "--file", &file, "--password", "x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no 'VM Name' column"));
}

#[test]
fn test_connection_refused_json_error_code() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "machines.csv", "VM Name,Env\nweb01,prod\n");

    let output = attrsync(&dir)
        .args([
            "apply", "--json", "--file", &file, "--host", "127.0.0.1:1", "--user", "admin",
            "--password", "x",
        ])
        .timeout(std::time::Duration::from_secs(60))
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["code"], "CONNECTION_FAILED");
    assert!(v["message"].as_str().unwrap().contains("127.0.0.1:1"));
}

#[test]
fn test_invalid_refresh_policy_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    attrsync(&dir)
        .args(["apply", "--file", "x.csv", "--refresh", "hourly"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("per-row"));
}
