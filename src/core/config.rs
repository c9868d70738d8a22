//! User settings.
//!
//! Settings are read from `$SI_SETTINGS` or `~/.si/settings.toml`. A missing
//! file means defaults; only the `[vault]` table is interpreted here, other
//! tables are ignored.
//!
//! ```toml
//! [vault]
//! file = ".env"
//! key_backend = "file"
//! key_file = "~/.si/vault/keys/age.key"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{ENV_SETTINGS, SETTINGS_DIR, SETTINGS_FILE};
use crate::core::files::{clean_path, expand_home};
use crate::core::store::{Backend, KeyConfig};
use crate::error::{ConfigError, Error, Result, StoreError};

const DEFAULT_KEY_FILE: &str = "vault/keys/age.key";
const DEFAULT_TRUST_STORE: &str = "vault/trust.json";
const DEFAULT_AUDIT_LOG: &str = "vault/audit.log";

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub vault: VaultSettings,
}

/// The `[vault]` table. Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Default envfile when `--file` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// `keyring` (default) or `file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<String>,
}

fn settings_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(SETTINGS_DIR))
        .ok_or_else(|| StoreError::NoHomeDir.into())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Settings file location: `$SI_SETTINGS`, else `~/.si/settings.toml`.
    pub fn path() -> Result<PathBuf> {
        match std::env::var(ENV_SETTINGS) {
            Ok(p) if !p.trim().is_empty() => expand_home(&p),
            _ => Ok(settings_home()?.join(SETTINGS_FILE)),
        }
    }

    /// Load from [`Settings::path`].
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed TOML, or the read error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::file(path, e)),
        };
        let settings: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

impl VaultSettings {
    /// Configured default envfile.
    pub fn default_file(&self) -> Option<&str> {
        non_blank(&self.file)
    }

    fn path_or(&self, value: &Option<String>, default: &str) -> Result<PathBuf> {
        match non_blank(value) {
            Some(p) => Ok(clean_path(&expand_home(p)?)),
            None => Ok(settings_home()?.join(default)),
        }
    }

    pub fn key_file_path(&self) -> Result<PathBuf> {
        self.path_or(&self.key_file, DEFAULT_KEY_FILE)
    }

    pub fn trust_store_path(&self) -> Result<PathBuf> {
        self.path_or(&self.trust_store, DEFAULT_TRUST_STORE)
    }

    pub fn audit_log_path(&self) -> Result<PathBuf> {
        self.path_or(&self.audit_log, DEFAULT_AUDIT_LOG)
    }

    /// Identity backend configuration.
    ///
    /// # Errors
    ///
    /// `StoreError::UnsupportedBackend` for an unknown backend name.
    pub fn key_config(&self) -> Result<KeyConfig> {
        let backend: Backend = non_blank(&self.key_backend).unwrap_or_default().parse()?;
        Ok(KeyConfig {
            backend,
            key_file: Some(self.key_file_path()?),
        })
    }
}
