//! Cryptographic operations.
//!
//! Values are encrypted to x25519 recipients with age and stored as
//! prefix-tagged base64 (see [`envelope`]). The [`Cipher`] trait keeps the
//! backend seam open; [`Age`] is the only implementation.

use ::age::x25519;

mod age;
pub mod envelope;

pub use self::age::Age;
pub use crate::core::recipient::{fingerprint, parse_recipient, parse_recipients};

/// Cryptographic backend trait.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt plaintext for multiple recipients.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails or no recipients are given.
    fn encrypt(&self, plaintext: &str, recipients: &[Self::Recipient]) -> crate::error::Result<String>;

    /// Decrypt a stored value using a private identity.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if the value is malformed or the key doesn't match.
    fn decrypt(&self, encrypted: &str, identity: &Self::Identity) -> crate::error::Result<String>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// Whether the trimmed value starts with a recognized ciphertext tag.
pub fn is_encrypted(value: &str) -> bool {
    envelope::Tag::detect(value).is_some()
}

/// Check a stored value decodes to an age stream without decrypting it.
///
/// The bare-tag empty marker is valid.
///
/// # Errors
///
/// Returns `CipherError::InvalidPayload` for undecodable or non-age payloads.
pub fn validate(ciphertext: &str) -> crate::error::Result<()> {
    match envelope::open(ciphertext)? {
        Some(raw) => envelope::check_stream(&raw),
        None => Ok(()),
    }
}

/// Encrypt plaintext to textual recipients (`age1...`). Blank entries are
/// skipped.
///
/// # Errors
///
/// `CipherError::NoRecipients` when nothing remains after skipping blanks,
/// `CipherError::InvalidRecipient` for a malformed recipient.
pub fn encrypt<S: AsRef<str>>(plaintext: &str, recipients: &[S]) -> crate::error::Result<String> {
    let parsed = parse_recipients(recipients)?;
    Age.encrypt(plaintext, &parsed)
}

/// Decrypt a stored value with an x25519 identity.
pub fn decrypt(ciphertext: &str, identity: &x25519::Identity) -> crate::error::Result<String> {
    Age.decrypt(ciphertext, identity)
}
