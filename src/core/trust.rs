//! Recipient trust store.
//!
//! Records, per `(repo_root, file)`, the fingerprint of the recipient set a
//! user last reviewed. A vault file whose header later names different
//! recipients no longer matches and must be re-accepted before it is
//! decrypted.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::TRUST_SCHEMA_VERSION;
use crate::core::files::{clean_path, read_scoped, write_atomic_mode, PRIVATE_FILE_MODE};
use crate::error::{ConfigError, Result};

/// One trusted vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEntry {
    pub repo_root: String,
    pub file: String,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trusted_at: String,
}

impl TrustEntry {
    pub fn new(repo_root: impl AsRef<Path>, file: impl AsRef<Path>, fingerprint: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.as_ref().display().to_string(),
            file: file.as_ref().display().to_string(),
            fingerprint: fingerprint.into(),
            trusted_at: String::new(),
        }
    }
}

/// Persisted trust entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustStore {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<TrustEntry>,
}

impl Default for TrustStore {
    fn default() -> Self {
        Self {
            schema_version: TRUST_SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

fn clean_key(value: &str) -> String {
    clean_path(Path::new(value.trim())).display().to_string()
}

impl TrustStore {
    /// Load the store at `path`.
    ///
    /// A blank path or a missing file yields an empty store. Older schema
    /// versions are upgraded in memory.
    ///
    /// # Errors
    ///
    /// Read failures other than not-found, and malformed JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Ok(Self::default());
        }
        let data = match read_scoped(path) {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        let mut store: TrustStore = serde_json::from_slice(&data).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        if store.schema_version < TRUST_SCHEMA_VERSION {
            debug!(from = store.schema_version, to = TRUST_SCHEMA_VERSION, "upgrading trust store schema");
            store.schema_version = TRUST_SCHEMA_VERSION;
        }
        Ok(store)
    }

    /// Entry for `(repo_root, file)`, compared after trimming and cleaning.
    pub fn find(&self, repo_root: &str, file: &str) -> Option<&TrustEntry> {
        let (root, file) = (clean_key(repo_root), clean_key(file));
        self.entries
            .iter()
            .find(|e| clean_key(&e.repo_root) == root && clean_key(&e.file) == file)
    }

    /// Insert or replace the entry for its `(repo_root, file)`.
    ///
    /// `trusted_at` is stamped with the current time when blank.
    pub fn upsert(&mut self, mut entry: TrustEntry) {
        entry.repo_root = clean_key(&entry.repo_root);
        entry.file = clean_key(&entry.file);
        entry.fingerprint = entry.fingerprint.trim().to_string();
        if entry.trusted_at.trim().is_empty() {
            entry.trusted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        }
        match self
            .entries
            .iter_mut()
            .find(|e| clean_key(&e.repo_root) == entry.repo_root && clean_key(&e.file) == entry.file)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the entry for `(repo_root, file)`. Returns whether one existed.
    pub fn delete(&mut self, repo_root: &str, file: &str) -> bool {
        let (root, file) = (clean_key(repo_root), clean_key(file));
        let before = self.entries.len();
        self.entries
            .retain(|e| !(clean_key(&e.repo_root) == root && clean_key(&e.file) == file));
        self.entries.len() != before
    }

    /// Check `fingerprint` against the trusted one for `(repo_root, file)`.
    ///
    /// # Errors
    ///
    /// `ConfigError::TrustNotEstablished` without an entry,
    /// `ConfigError::Untrusted` on mismatch.
    pub fn verify(&self, repo_root: &str, file: &str, fingerprint: &str) -> Result<()> {
        let entry = self.find(repo_root, file).ok_or_else(|| ConfigError::TrustNotEstablished {
            file: clean_key(file),
        })?;
        if entry.fingerprint.trim() != fingerprint {
            return Err(ConfigError::Untrusted {
                file: clean_key(file),
                trusted: entry.fingerprint.trim().to_string(),
                found: fingerprint.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Write the store as indented JSON with a trailing newline, mode 0600
    /// under a 0700 directory. A blank path is a no-op.
    pub fn save(&self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        let mut data = serde_json::to_vec_pretty(self).map_err(ConfigError::Serialize)?;
        data.push(b'\n');
        write_atomic_mode(path, &data, "trust-", PRIVATE_FILE_MODE)?;
        debug!(path = %path.display(), entries = self.entries.len(), "saved trust store");
        Ok(())
    }
}
