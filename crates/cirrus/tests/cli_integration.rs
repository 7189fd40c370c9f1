//! CLI integration tests for the Cirrus command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected with appropriate messages
//! - Commands that need no cloud access behave end to end
//!
//! Every test points `CIRRUS_CONFIG_DIR` at a temp directory so the user's
//! real config and log directory are never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the cirrus binary, isolated in `dir`.
fn cirrus(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cirrus").unwrap();
    cmd.current_dir(dir.path())
        .env("CIRRUS_CONFIG_DIR", dir.path())
        .env_remove("AWS_BEARER_TOKEN_BEDROCK")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("GITHUB_TOKEN_ADMIN_READ");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cirrus"))
        .stdout(predicate::str::contains("cloud fleet"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cirrus"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("context"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("count"))
        .stdout(predicate::str::contains("types"))
        .stdout(predicate::str::contains("events"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("runners"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_list_help_shows_filters() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--types"))
        .stdout(predicate::str::contains("--name-prefix"))
        .stdout(predicate::str::contains("--tag"))
        .stdout(predicate::str::contains("--all"));
}

#[test]
fn test_events_help_shows_defaults() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["events", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-results"))
        .stdout(predicate::str::contains("50"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_flags_accepted() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args([
            "--verbose",
            "--json",
            "--profile",
            "ops",
            "--region",
            "us-west-2",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_global_flags_after_subcommand() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["list", "--region", "eu-west-1", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_no_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir).assert().failure();
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_run_requires_command() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["run", "i-0abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_ask_requires_question() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir).arg("ask").assert().failure();
}

#[test]
fn test_tag_without_value_rejected() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["list", "--tag", "env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tag"));
}

#[test]
fn test_max_results_must_be_number() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["events", "i-0abc", "--max-results", "lots"])
        .assert()
        .failure();
}

#[test]
fn test_set_secret_unknown_backend() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["config", "set-secret", "openai"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown backend"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            dir.path().to_string_lossy().to_string(),
        ));
}

#[test]
fn test_config_init_creates_once() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("[llm]"));

    cirrus(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_init_local() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["config", "init", "--local"])
        .assert()
        .success();
    assert!(dir.path().join("cirrus.toml").exists());
}

#[test]
fn test_config_show_reports_layers() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[github]\norg = \"acme\"\n",
    )
    .unwrap();

    cirrus(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org: acme"))
        .stdout(predicate::str::contains("no key"));
}

#[test]
fn test_invalid_config_file_is_a_warning() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cirrus.toml"), "[llm\nbackend = ").unwrap();

    cirrus(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings:"))
        .stdout(predicate::str::contains("Failed to load"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands Without Cloud Access
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_runners_without_token() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["runners", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "GITHUB_TOKEN_ADMIN_READ environment variable is not set.",
        ));
}

#[test]
fn test_runners_without_token_json() {
    let dir = TempDir::new().unwrap();
    cirrus(&dir)
        .args(["--json", "runners"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"unconfigured\""));
}

#[test]
fn test_list_with_missing_cli_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[aws]\ncli_path = \"/nonexistent/cirrus-test/aws\"\n",
    )
    .unwrap();

    cirrus(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to launch"));
}

#[cfg(unix)]
#[test]
fn test_count_with_fake_cli() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let script = dir.path().join("aws");
    std::fs::write(
        &script,
        r#"#!/bin/sh
printf '%s\n' '{"Reservations":[{"Instances":[{"InstanceId":"i-a","InstanceType":"t3.small","State":{"Name":"running"}},{"InstanceId":"i-b","InstanceType":"t3.small","State":{"Name":"running"}}]}]}'
"#,
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        format!("[aws]\ncli_path = \"{}\"\n", script.display()),
    )
    .unwrap();

    cirrus(&dir)
        .arg("count")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 running instance(s)"));

    cirrus(&dir)
        .args(["--json", "count", "--type", "t3.small"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"running\": 2"));
}
