//! Per-invocation state shared by command handlers.

use std::path::PathBuf;

use serde_json::Value;

use crate::core::audit::{self, AuditLog};
use crate::core::config::Settings;
use crate::core::domain::Identity;
use crate::core::store::{self, KeyConfig};
use crate::core::target::{resolve_target, Target};
use crate::core::trust::TrustStore;
use crate::core::vault::VaultFile;
use crate::error::Result;

/// Settings plus the global flags.
#[derive(Debug)]
pub struct Context {
    pub settings: Settings,
    pub cwd: PathBuf,
    /// `--file`, when given.
    pub file: Option<String>,
}

impl Context {
    pub fn load(file: Option<String>) -> Result<Self> {
        Ok(Self {
            settings: Settings::load()?,
            cwd: std::env::current_dir()?,
            file,
        })
    }

    pub fn target(&self) -> Result<Target> {
        resolve_target(&self.cwd, self.file.as_deref(), self.settings.vault.default_file())
    }

    pub fn open(&self) -> Result<VaultFile> {
        VaultFile::open(self.target()?)
    }

    pub fn open_or_empty(&self) -> Result<VaultFile> {
        VaultFile::open_or_empty(self.target()?)
    }

    pub fn key_config(&self) -> Result<KeyConfig> {
        self.settings.vault.key_config()
    }

    pub fn identity(&self) -> Result<Identity> {
        store::load_identity(&self.key_config()?)
    }

    pub fn trust_path(&self) -> Result<PathBuf> {
        self.settings.vault.trust_store_path()
    }

    /// Trust store key for `vault`: `(repo root, file)`.
    pub fn trust_key(vault: &VaultFile) -> (String, String) {
        let target = vault.target();
        (
            target.trust_root().display().to_string(),
            target.file.display().to_string(),
        )
    }

    /// Refuse to go on unless the file's recipients are trusted.
    pub fn verify_trust(&self, vault: &VaultFile) -> Result<()> {
        let store = TrustStore::load(&self.trust_path()?)?;
        let (root, file) = Self::trust_key(vault);
        store.verify(&root, &file, &vault.fingerprint())
    }

    /// Record an audit event for a mutating command. Failures are logged,
    /// never fatal.
    pub fn audit(&self, kind: &str, target: Option<&Target>, keys: &[String]) {
        let path = match self.settings.vault.audit_log_path() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "audit log path unavailable");
                return;
            }
        };
        let mut event = audit::event([("type", kind), ("actor", whoami::username().as_str())]);
        if let Some(target) = target {
            event.insert("file".into(), Value::from(target.file.display().to_string()));
        }
        if !keys.is_empty() {
            event.insert("keys".into(), Value::from(keys.to_vec()));
        }
        AuditLog::new(path).record(event);
    }
}
