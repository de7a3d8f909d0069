//! CLI end-to-end tests for the synthgate binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn synthgate_cmd() -> Command {
    Command::cargo_bin("synthgate").unwrap()
}

/// Write a config pointing the database into `dir`.
fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("config.json");
    let db = dir.join("gate.db");
    let json = format!(
        r#"{{ "server": {{ "db_path": {db:?} }} {extra} }}"#,
        db = db.to_string_lossy()
    );
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn no_args_shows_help() {
    synthgate_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_command() {
    synthgate_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("synthgate"));
}

#[test]
fn generate_then_show_key() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("generate-api-key")
        .output()
        .unwrap();
    assert!(output.status.success());
    let key = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert_eq!(key.len(), 32);

    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .args(["show-api-key", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains(key.as_str()));

    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("show-api-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("...").and(predicate::str::contains(key.as_str()).not()));
}

#[test]
fn show_key_fails_when_none_stored() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("show-api-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key stored"));
}

#[test]
fn rate_limit_set_show_reset() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), r#", "gate": { "rate_limit_per_minute": 60 }"#);
    let run = |args: &[&str]| {
        let mut cmd = synthgate_cmd();
        cmd.arg("--config").arg(&config).arg("rate-limit").args(args);
        cmd
    };

    run(&[]).assert().success().stdout(predicate::str::contains("60/min (config)"));
    run(&["5"]).assert().success().stdout(predicate::str::contains("5/min"));
    run(&[]).assert().success().stdout(predicate::str::contains("5/min (stored"));
    run(&["--reset"]).assert().success();
    run(&[]).assert().success().stdout(predicate::str::contains("60/min (config)"));
    run(&["0"]).assert().failure();
}

#[test]
fn cleanup_on_fresh_database() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 rate windows and 0 audit entries"));
}

#[test]
fn cleanup_reports_removed_and_kept_windows() {
    use chrono::{Duration, Utc};
    use sg_db::queries::rate_limits;

    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    {
        let db = dir.path().join("gate.db");
        let pool = sg_db::pool::init_pool(&db.to_string_lossy()).unwrap();
        let conn = pool.get().unwrap();
        let now = Utc::now();
        rate_limits::upsert_increment(&conn, "ip_198.51.100.7", now - Duration::hours(48)).unwrap();
        rate_limits::upsert_increment(&conn, "ip_198.51.100.7", now).unwrap();
    }

    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Removed 1 rate windows and 0 audit entries (1 windows kept)",
        ));
}

#[test]
fn usage_for_unknown_client() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    synthgate_cmd()
        .arg("--config")
        .arg(&config)
        .args(["usage", "ip_203.0.113.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recorded windows"));
}

#[test]
fn validate_reports_settings_and_warnings() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), r#", "gate": { "on_store_failure": "fail_open" }"#);
    synthgate_cmd()
        .args(["validate"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("fail_open"));
}

#[test]
fn validate_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();
    synthgate_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure();
}
