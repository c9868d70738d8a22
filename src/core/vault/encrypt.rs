//! In-place encryption of envfile values.

use tracing::{debug, trace};

use crate::core::cipher::{self, Age, Cipher};
use crate::core::domain::Identity;
use crate::core::dotenv::{normalize_value, Dotenv};
use crate::core::header::parse_recipients;
use crate::core::validation::validate_key;
use crate::error::{CipherError, ConfigError, Result};

/// Outcome of [`encrypt_dotenv_values`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptResult {
    pub changed: bool,
    /// Keys whose plaintext was encrypted, in document order.
    pub encrypted_keys: Vec<String>,
    /// Keys whose ciphertext was re-encrypted to the current recipients.
    pub reencrypted_keys: Vec<String>,
    /// Already-encrypted assignments left untouched.
    pub skipped_encrypted: usize,
}

/// Encrypt every plaintext value to the recipients declared in the file.
///
/// With `reencrypt`, existing ciphertext is decrypted with `identity` and
/// encrypted again to the current recipient set. Only the right-hand side
/// of each affected line changes; `export`, spacing around `=`, and inline
/// comments are kept.
///
/// # Errors
///
/// * `ConfigError::NoRecipients` when the file declares none
/// * `CipherError::IdentityRequired` for `reencrypt` without an identity
/// * Validation errors for invalid keys or malformed quoted values
pub fn encrypt_dotenv_values(
    doc: &mut Dotenv,
    identity: Option<&Identity>,
    reencrypt: bool,
) -> Result<EncryptResult> {
    let recipients = parse_recipients(doc);
    encrypt_dotenv_values_with_recipients(doc, &recipients, identity, reencrypt)
}

/// [`encrypt_dotenv_values`] with recipients supplied by the caller instead
/// of read from the header.
pub fn encrypt_dotenv_values_with_recipients<S: AsRef<str>>(
    doc: &mut Dotenv,
    recipients: &[S],
    identity: Option<&Identity>,
    reencrypt: bool,
) -> Result<EncryptResult> {
    if recipients.iter().all(|r| r.as_ref().trim().is_empty()) {
        return Err(ConfigError::NoRecipients.into());
    }
    // Parse once; a bad recipient fails before any line is touched.
    let parsed = cipher::parse_recipients(recipients)?;

    let mut result = EncryptResult::default();
    let assignments: Vec<_> = doc.assignments().collect();
    for (index, assign) in assignments {
        validate_key(&assign.key)?;
        let value = normalize_value(&assign.value_raw)?;

        let reencrypting = cipher::is_encrypted(&value);
        let plaintext = if reencrypting {
            if !reencrypt {
                result.skipped_encrypted += 1;
                continue;
            }
            let identity = identity.ok_or(CipherError::IdentityRequired("reencrypt"))?;
            zeroize::Zeroizing::new(cipher::decrypt(&value, identity.as_age())?)
        } else {
            zeroize::Zeroizing::new(value)
        };

        let sealed = Age.encrypt(&plaintext, &parsed)?;
        let line = assign.render_preserving(&sealed);
        if doc.replace_text(index, line) {
            result.changed = true;
        }
        trace!(key = %assign.key, reencrypt = reencrypting, "encrypted value");
        if reencrypting {
            result.reencrypted_keys.push(assign.key);
        } else {
            result.encrypted_keys.push(assign.key);
        }
    }

    debug!(
        encrypted = result.encrypted_keys.len(),
        reencrypted = result.reencrypted_keys.len(),
        skipped = result.skipped_encrypted,
        "encrypted dotenv values"
    );
    Ok(result)
}
