//! Test support utilities for si-vault integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own project dir and home dir. The home carries a
/// settings file selecting the file key backend, so no test touches the
/// OS secret store. Child processes get `.current_dir()` and `HOME`, so
/// tests can run in parallel.
pub struct Test {
    pub dir: TempDir,
    pub home: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        let settings = home.path().join(".si");
        std::fs::create_dir_all(&settings).expect("failed to create settings dir");
        std::fs::write(settings.join("settings.toml"), SETTINGS).expect("failed to write settings");
        Self { dir, home }
    }

    /// Environment after a successful `si-vault init`.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd();
        assert!(
            output.status.success(),
            "Failed to initialize vault: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Initialized environment with values set.
    pub fn with_values(values: &[(&str, &str)]) -> Self {
        let t = Self::init();
        for (k, v) in values {
            let output = t.set(k, v);
            assert!(
                output.status.success(),
                "Failed to set {}: {}",
                k,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// The vault envfile.
    pub fn env_path(&self) -> PathBuf {
        self.dir.path().join(".env")
    }

    pub fn env_contents(&self) -> String {
        std::fs::read_to_string(self.env_path()).unwrap_or_default()
    }

    pub fn write_env(&self, contents: &str) {
        std::fs::write(self.env_path(), contents).expect("failed to write .env");
    }

    pub fn key_path(&self) -> PathBuf {
        self.home.path().join(".si/vault/keys/age.key")
    }

    pub fn trust_path(&self) -> PathBuf {
        self.home.path().join(".si/vault/trust.json")
    }

    pub fn audit_path(&self) -> PathBuf {
        self.home.path().join(".si/vault/audit.log")
    }

    /// Recipient of the identity stored in the temp home.
    pub fn recipient(&self) -> String {
        let output = self.cmd().arg("keygen").output().expect("failed to run keygen");
        assert!(output.status.success());
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .find(|l| l.starts_with("age1"))
            .expect("keygen printed no recipient")
            .to_string()
    }
}
