//! Backend selection for identity storage.
//!
//! The backend is chosen explicitly through [`KeyConfig`], derived from
//! settings by the caller. Nothing here consults process-wide defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use super::keyring::{platform_service, Keyring};
use super::{Filesystem, Store};
use crate::core::files::clean_path;
use crate::error::{Error, Result, StoreError};

/// Where the identity lives when no environment override is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// OS secret store (Secret Service on Linux, Keychain on macOS).
    #[default]
    Keyring,
    /// Permission-checked key file.
    File,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Keyring => "keyring",
            Backend::File => "file",
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    /// Blank selects the default. `keychain` is accepted as an alias.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "keyring" | "keychain" => Ok(Backend::Keyring),
            "file" => Ok(Backend::File),
            other => Err(StoreError::UnsupportedBackend(other.to_string()).into()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity storage configuration passed to every load/ensure/rotate call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyConfig {
    pub backend: Backend,
    /// Key file for the file backend. The keyring backend also falls back
    /// to it for reads when the keyring has no entry.
    pub key_file: Option<PathBuf>,
}

impl KeyConfig {
    pub fn keyring() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File,
            key_file: Some(path.into()),
        }
    }

    /// Configured key file, cleaned. Blank paths count as unset.
    pub fn key_path(&self) -> Option<PathBuf> {
        self.key_file
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| clean_path(p))
    }

    /// Store for the selected backend.
    ///
    /// # Errors
    ///
    /// `StoreError::KeyFileRequired` when the file backend has no path.
    pub fn store(&self) -> Result<Box<dyn Store>> {
        debug!(backend = %self.backend, "selecting identity store");
        match self.backend {
            Backend::Keyring => Ok(Box::new(Keyring::new(platform_service()))),
            Backend::File => {
                let path = self.key_path().ok_or(StoreError::KeyFileRequired)?;
                Ok(Box::new(Filesystem::new(path)))
            }
        }
    }
}
