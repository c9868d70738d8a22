//! Decryption of envfile values, in place or into a map.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::core::cipher;
use crate::core::domain::Identity;
use crate::core::dotenv::{normalize_value, render_value, Dotenv};
use crate::core::validation::validate_key;
use crate::error::{CipherError, Result};

/// Outcome of [`decrypt_dotenv_values`] / [`decrypt_dotenv_keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptDotenvResult {
    pub changed: bool,
    /// Keys decrypted, in document order.
    pub decrypted_keys: Vec<String>,
    /// Targeted assignments that were already plaintext.
    pub skipped_plain: usize,
    /// Number of requested keys with no assignment in the file.
    pub skipped_missing: usize,
    /// Requested keys with no assignment in the file, sorted.
    pub missing_keys: Vec<String>,
}

/// Values of a document with ciphertext decrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptResult {
    /// Last value per key.
    pub values: HashMap<String, String>,
    pub decrypted_keys: Vec<String>,
    pub plaintext_keys: Vec<String>,
}

/// Decrypt every encrypted value in place.
///
/// The vault header is left alone so the file can be encrypted again.
pub fn decrypt_dotenv_values(doc: &mut Dotenv, identity: Option<&Identity>) -> Result<DecryptDotenvResult> {
    decrypt_dotenv_keys(doc, identity, &[] as &[&str])
}

/// Decrypt the values of `keys` in place, or every value when `keys` has
/// no non-blank entry.
///
/// Plaintext is written back through [`render_value`], so the line
/// re-parses to the same value. `export`, spacing around `=`, and inline
/// comments are kept.
///
/// # Errors
///
/// * `CipherError::IdentityRequired` when an encrypted value is targeted
///   and `identity` is `None`
/// * `CipherError::DecryptionFailed` when the identity is not a recipient
pub fn decrypt_dotenv_keys<S: AsRef<str>>(
    doc: &mut Dotenv,
    identity: Option<&Identity>,
    keys: &[S],
) -> Result<DecryptDotenvResult> {
    let filter: BTreeSet<&str> = keys
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect();
    let mut found: BTreeSet<String> = BTreeSet::new();
    let mut result = DecryptDotenvResult::default();

    let assignments: Vec<_> = doc.assignments().collect();
    for (index, assign) in assignments {
        validate_key(&assign.key)?;
        if !filter.is_empty() {
            if !filter.contains(assign.key.as_str()) {
                continue;
            }
            found.insert(assign.key.clone());
        }

        let value = normalize_value(&assign.value_raw)?;
        if !cipher::is_encrypted(&value) {
            result.skipped_plain += 1;
            continue;
        }

        let identity = identity.ok_or(CipherError::IdentityRequired("decrypt"))?;
        let plain = zeroize::Zeroizing::new(cipher::decrypt(&value, identity.as_age())?);
        let line = assign.render_preserving(&render_value(&plain));
        if doc.replace_text(index, line) {
            result.changed = true;
        }
        trace!(key = %assign.key, "decrypted value");
        result.decrypted_keys.push(assign.key);
    }

    result.missing_keys = filter
        .iter()
        .filter(|k| !found.contains(**k))
        .map(|k| k.to_string())
        .collect();
    result.skipped_missing = result.missing_keys.len();

    debug!(
        decrypted = result.decrypted_keys.len(),
        skipped_plain = result.skipped_plain,
        missing = result.skipped_missing,
        "decrypted dotenv values"
    );
    Ok(result)
}

/// Decrypt every value into a map without touching the document.
///
/// # Errors
///
/// Same as [`decrypt_dotenv_keys`].
pub fn decrypt_env(doc: &Dotenv, identity: Option<&Identity>) -> Result<DecryptResult> {
    let mut result = DecryptResult::default();
    for (_, assign) in doc.assignments() {
        validate_key(&assign.key)?;
        let value = normalize_value(&assign.value_raw)?;
        if cipher::is_encrypted(&value) {
            let identity = identity.ok_or(CipherError::IdentityRequired("decrypt"))?;
            let plain = cipher::decrypt(&value, identity.as_age())?;
            result.values.insert(assign.key.clone(), plain);
            result.decrypted_keys.push(assign.key);
        } else {
            result.values.insert(assign.key.clone(), value);
            result.plaintext_keys.push(assign.key);
        }
    }
    Ok(result)
}
