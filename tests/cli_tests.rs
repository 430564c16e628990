//! Command line tests for coregate
//!
//! Only argument and configuration handling is exercised here; every case
//! fails before a request is sent.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn coregate() -> Command {
    let mut cmd = Command::cargo_bin("coregate").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    coregate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("conflicts"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_version() {
    coregate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_core_incompatible_requires_core() {
    coregate()
        .args(["conflicts", "--kind", "core-incompatible", "--project", "token"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--core is required"));
}

#[test]
fn test_abandoned_rejects_project_selection() {
    coregate()
        .args(["conflicts", "--kind", "abandoned", "--project", "token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting options"));
}

#[test]
fn test_unknown_kind_is_a_usage_error() {
    coregate()
        .args(["conflicts", "--kind", "outdated"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_core_constraint() {
    coregate()
        .args(["report", "--core", ">=banana"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("banana"));
}

#[test]
fn test_unknown_report_format() {
    coregate()
        .args(["report", "--core", "^11", "--format", "html"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_zero_concurrency_is_rejected() {
    coregate()
        .args([
            "conflicts",
            "--kind",
            "unsupported",
            "--project",
            "token",
            "--concurrency",
            "0",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("fetch.concurrency"));
}

#[test]
fn test_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[fetch]\nconcurrency = \"many\"\n").unwrap();

    coregate()
        .args(["conflicts", "--kind", "insecure", "--project", "token", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_missing_config_file() {
    coregate()
        .args([
            "conflicts",
            "--kind",
            "insecure",
            "--config",
            "/nonexistent/coregate.toml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_config_with_bad_source_url() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[sources]\nrelease_history_url = \"ftp://example.com/\"\n")
        .unwrap();

    coregate()
        .args(["report", "--core", "^11", "--project", "token", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sources.release_history_url"));
}
