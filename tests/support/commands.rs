//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// An `si-vault` command bound to this environment.
    ///
    /// HOME points at the temp home, the working directory at the project,
    /// and identity overrides from the outer environment are cleared.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("si-vault").expect("failed to find si-vault binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("NO_COLOR", "1");
        for var in [
            "SI_SETTINGS",
            "SI_VAULT_FILE",
            "SI_VAULT_IDENTITY",
            "SI_VAULT_PRIVATE_KEY",
            "SI_VAULT_IDENTITY_FILE",
            "SI_VAULT_ALLOW_SYMLINK_ENV_FILE",
            "SI_VAULT_ALLOW_INSECURE_KEY_FILE",
            "SI_VAULT_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.dir.path());
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run si-vault")
    }

    pub fn init_cmd(&self) -> Output {
        self.run(&["init"])
    }

    pub fn set(&self, key: &str, val: &str) -> Output {
        self.run(&["set", key, val])
    }

    pub fn set_plain(&self, key: &str, val: &str) -> Output {
        self.run(&["set", key, val, "--plain"])
    }

    pub fn get(&self, key: &str) -> Output {
        self.run(&["get", key, "--reveal"])
    }

    pub fn get_raw(&self, key: &str) -> Output {
        self.run(&["get", key])
    }

    pub fn unset(&self, key: &str) -> Output {
        self.run(&["unset", key])
    }

    pub fn list(&self) -> Output {
        self.run(&["list"])
    }

    pub fn list_json(&self) -> Output {
        self.run(&["list", "--json"])
    }

    pub fn encrypt(&self) -> Output {
        self.run(&["encrypt"])
    }

    pub fn decrypt(&self) -> Output {
        self.run(&["decrypt"])
    }

    pub fn check(&self) -> Output {
        self.run(&["check"])
    }
}
