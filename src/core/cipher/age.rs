//! Age encryption backend.
//!
//! Encrypts to x25519 recipients with the binary age format and stores the
//! result through the prefix-tagged envelope.

use std::io::{Read, Write};

use ::age::x25519;
use tracing::trace;

use super::envelope;
use super::Cipher;
use crate::error::{CipherError, Result};

/// Age-based cryptographic backend using x25519 keys
pub struct Age;

impl Age {
    /// Encrypt to the raw binary age stream.
    pub fn encrypt_raw(&self, plaintext: &[u8], recipients: &[x25519::Recipient]) -> Result<Vec<u8>> {
        if recipients.is_empty() {
            return Err(CipherError::NoRecipients.into());
        }
        let encryptor =
            age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut raw = Vec::with_capacity(plaintext.len() + 256);
        let mut writer = encryptor
            .wrap_output(&mut raw)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        writer
            .write_all(plaintext)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        Ok(raw)
    }

    /// Decrypt a raw binary age stream.
    pub fn decrypt_raw(&self, raw: &[u8], identity: &x25519::Identity) -> Result<Vec<u8>> {
        let decryptor =
            age::Decryptor::new(raw).map_err(|e| CipherError::DecryptionFailed(e.to_string()))?;
        let mut reader = decryptor
            .decrypt(std::iter::once(identity as &dyn age::Identity))
            .map_err(|e| CipherError::DecryptionFailed(e.to_string()))?;
        let mut plain = Vec::new();
        reader
            .read_to_end(&mut plain)
            .map_err(|e| CipherError::DecryptionFailed(e.to_string()))?;
        Ok(plain)
    }
}

impl Cipher for Age {
    type Recipient = x25519::Recipient;
    type Identity = x25519::Identity;

    fn name(&self) -> &'static str {
        "age"
    }

    fn encrypt(&self, plaintext: &str, recipients: &[x25519::Recipient]) -> Result<String> {
        trace!(
            recipients = recipients.len(),
            plaintext_len = plaintext.len(),
            "encrypting"
        );
        if recipients.is_empty() {
            return Err(CipherError::NoRecipients.into());
        }
        if plaintext.is_empty() {
            return Ok(envelope::Tag::Compact.prefix().to_string());
        }
        let raw = self.encrypt_raw(plaintext.as_bytes(), recipients)?;
        let sealed = envelope::seal(&raw);
        trace!(ciphertext_len = sealed.len(), "encrypted");
        Ok(sealed)
    }

    fn decrypt(&self, encrypted: &str, identity: &x25519::Identity) -> Result<String> {
        trace!(ciphertext_len = encrypted.len(), "decrypting");
        let Some(raw) = envelope::open(encrypted)? else {
            return Ok(String::new());
        };
        let plain = self.decrypt_raw(&raw, identity)?;
        trace!(plaintext_len = plain.len(), "decrypted");
        String::from_utf8(plain)
            .map_err(|e| CipherError::DecryptionFailed(format!("UTF-8 error: {}", e)).into())
    }
}
