//! Integration tests for the contactbook command line

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated HOME / XDG directories so tests never touch the real session.
struct TestEnv {
    temp_dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir().join("contactbook").join("session.toml")
    }

    fn store_key(&self, key: &str) {
        let path = self.session_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("apiKey = \"{}\"\n", key)).unwrap();
    }

    fn cmd(&self) -> AssertCommand {
        let mut cmd = AssertCommand::cargo_bin("contactbook").unwrap();
        cmd.env("HOME", self.temp_dir.path())
            .env("XDG_DATA_HOME", self.data_dir())
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env_remove("RUST_LOG");
        cmd
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_help_lists_subcommands() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_list_without_stored_key_fails() {
    let env = TestEnv::new();
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API key stored"));
}

#[test]
fn test_logout_removes_session_file() {
    let env = TestEnv::new();
    env.store_key("me@example.com");
    assert!(env.session_path().exists());

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged out successfully"));

    assert!(!env.session_path().exists());
}

#[test]
fn test_logout_without_session_is_noop() {
    let env = TestEnv::new();
    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No API key stored"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let env = TestEnv::new();
    env.store_key("me@example.com");
    env.cmd()
        .args(["--base-url", "ftp://example.com/", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid base_url"));
}

#[test]
fn test_explicit_config_file_is_used() {
    let env = TestEnv::new();
    env.store_key("me@example.com");
    let config_path = env.temp_dir.path().join("custom.toml");
    fs::write(&config_path, "base_url = \"not a url\"\n").unwrap();

    env.cmd()
        .args(["--config", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid base_url"));
}

#[test]
fn test_list_reports_unreachable_server() {
    let env = TestEnv::new();
    env.store_key("me@example.com");
    env.cmd()
        .args(["--base-url", "http://127.0.0.1:9/", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch contacts"));
}
