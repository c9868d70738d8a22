//! Operations over a vault envfile.
//!
//! The free functions ([`encrypt_dotenv_values`], [`decrypt_dotenv_values`],
//! [`scan_dotenv_encryption`], ...) work on an in-memory [`Dotenv`] and
//! never touch the filesystem. [`VaultFile`] ties a document to its
//! [`Target`] on disk and is what the CLI works with.

mod decrypt;
mod encrypt;
mod scan;

pub use decrypt::{decrypt_dotenv_keys, decrypt_dotenv_values, decrypt_env, DecryptDotenvResult, DecryptResult};
pub use encrypt::{encrypt_dotenv_values, encrypt_dotenv_values_with_recipients, EncryptResult};
pub use scan::{scan_dotenv_encryption, ScanEntry, ScanResult};

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::domain::{Entry, Identity};
use crate::core::dotenv::{normalize_value, render_value, Dotenv, SetOptions};
use crate::core::files::{read_scoped, write_atomic};
use crate::core::header;
use crate::core::recipient::fingerprint;
use crate::core::target::Target;
use crate::core::validation::validate_key;
use crate::error::{CipherError, ConfigError, Result};

/// Keys whose values are still plaintext.
///
/// Empty values are not reported. Intended for pre-commit checks.
///
/// # Errors
///
/// Invalid keys, malformed quoted values, or malformed ciphertext.
pub fn check_plaintext(doc: &Dotenv) -> Result<Vec<String>> {
    Ok(scan_dotenv_encryption(doc)?
        .plaintext_keys()
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// A vault envfile loaded from disk.
#[derive(Debug, Clone)]
pub struct VaultFile {
    target: Target,
    doc: Dotenv,
}

impl VaultFile {
    /// Read the envfile at `target`.
    ///
    /// # Errors
    ///
    /// Not-found when the file is missing, symlink policy violations, and
    /// non-UTF-8 content.
    pub fn open(target: Target) -> Result<Self> {
        let data = read_scoped(&target.file)?;
        let doc = Dotenv::from_bytes(&data)?;
        debug!(file = %target.file.display(), lines = doc.lines().len(), "opened vault file");
        Ok(Self { target, doc })
    }

    /// [`open`](Self::open), starting from an empty document when the file
    /// does not exist yet.
    pub fn open_or_empty(target: Target) -> Result<Self> {
        match Self::open(target.clone()) {
            Ok(vault) => Ok(vault),
            Err(e) if e.is_not_found() => Ok(Self {
                target,
                doc: Dotenv::default(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn doc(&self) -> &Dotenv {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Dotenv {
        &mut self.doc
    }

    /// Recipients declared anywhere in the file.
    pub fn recipients(&self) -> Vec<String> {
        header::parse_recipients(&self.doc)
    }

    /// Fingerprint of the declared recipient set.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.recipients())
    }

    /// Logical entries, last value wins.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        self.doc.entries()
    }

    /// Set `key`, encrypting to the declared recipients unless `plain`.
    ///
    /// Returns whether the document changed.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoRecipients` when encrypting a file without
    /// recipients, and key validation errors.
    pub fn set(&mut self, key: &str, value: &str, opts: &SetOptions, plain: bool) -> Result<bool> {
        let key = key.trim();
        validate_key(key)?;
        let rendered = if plain {
            render_value(value)
        } else {
            let recipients = self.recipients();
            if recipients.is_empty() {
                return Err(ConfigError::NoRecipients.into());
            }
            cipher::encrypt(value, &recipients)?
        };
        let changed = self.doc.set(key, &rendered, opts)?;
        debug!(key, encrypted = !plain, changed, "set value");
        Ok(changed)
    }

    /// Remove every assignment to `key`.
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        self.doc.unset(key)
    }

    /// Value of `key`, decrypted when it is ciphertext.
    ///
    /// Returns `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// `CipherError::IdentityRequired` for ciphertext without an identity,
    /// or decryption failures.
    pub fn get(&self, key: &str, identity: Option<&Identity>) -> Result<Option<Zeroizing<String>>> {
        let Some(raw) = self.doc.lookup(key) else {
            return Ok(None);
        };
        let value = normalize_value(&raw)?;
        if !cipher::is_encrypted(&value) {
            return Ok(Some(Zeroizing::new(value)));
        }
        let identity = identity.ok_or(CipherError::IdentityRequired("get"))?;
        Ok(Some(Zeroizing::new(cipher::decrypt(&value, identity.as_age())?)))
    }

    /// Write the document back atomically.
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.target.file, &self.doc.to_bytes())?;
        debug!(file = %self.target.file.display(), "saved vault file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::resolve_target;
    use tempfile::TempDir;

    fn target(dir: &TempDir) -> Target {
        resolve_target(dir.path(), Some(".env"), None).unwrap()
    }

    #[test]
    fn test_check_plaintext() {
        let doc = Dotenv::parse("A=1\nB=\nC=es2:\n");
        assert_eq!(check_plaintext(&doc).unwrap(), vec!["A"]);
    }

    #[test]
    fn test_open_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(VaultFile::open(target(&tmp)).unwrap_err().is_not_found());
        let vault = VaultFile::open_or_empty(target(&tmp)).unwrap();
        assert!(vault.doc().is_empty());
    }

    #[test]
    fn test_set_get_save() {
        let tmp = TempDir::new().unwrap();
        let identity = Identity::generate();
        let mut vault = VaultFile::open_or_empty(target(&tmp)).unwrap();
        header::ensure_header(vault.doc_mut(), &[identity.recipient()]);

        assert!(vault.set("TOKEN", "s3cret", &SetOptions::default(), false).unwrap());
        assert!(vault.set("PORT", "8080", &SetOptions::default(), true).unwrap());
        vault.save().unwrap();

        let reopened = VaultFile::open(target(&tmp)).unwrap();
        let raw = reopened.doc().lookup("TOKEN").unwrap();
        assert!(cipher::is_encrypted(&raw));
        assert_eq!(reopened.get("TOKEN", Some(&identity)).unwrap().unwrap().as_str(), "s3cret");
        assert_eq!(reopened.get("PORT", None).unwrap().unwrap().as_str(), "8080");
        assert!(reopened.get("MISSING", None).unwrap().is_none());
        assert!(reopened.get("TOKEN", None).is_err());
        assert_eq!(reopened.fingerprint(), fingerprint(&[identity.recipient()]));
    }

    #[test]
    fn test_set_without_recipients() {
        let tmp = TempDir::new().unwrap();
        let mut vault = VaultFile::open_or_empty(target(&tmp)).unwrap();
        let err = vault.set("A", "1", &SetOptions::default(), false).unwrap_err();
        assert!(err.to_string().contains("no recipients"));
    }
}
