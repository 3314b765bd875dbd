use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_config_flag_fails() {
    Command::cargo_bin("thermodog")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn test_nonexistent_config_file_fails() {
    Command::cargo_bin("thermodog")
        .unwrap()
        .args(["--config", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn test_malformed_config_file_fails() {
    let mut config_file = tempfile::NamedTempFile::new().unwrap();
    write!(config_file, "{{\"api_key\": ").unwrap();

    Command::cargo_bin("thermodog")
        .unwrap()
        .args(["--config"])
        .arg(config_file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_unexpected_argument_fails() {
    Command::cargo_bin("thermodog")
        .unwrap()
        .args(["--config", "/tmp/config.json", "extra"])
        .assert()
        .failure();
}
