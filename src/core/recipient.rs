//! Recipient parsing and fingerprinting.

use std::collections::BTreeSet;

use ::age::x25519;
use sha2::{Digest, Sha256};

use crate::error::{CipherError, Result};

/// Parse a public key string into an age recipient.
///
/// # Errors
///
/// Returns `CipherError::InvalidRecipient` if the key format is invalid.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    let key = key.trim();
    key.parse::<x25519::Recipient>().map_err(|e: &str| {
        CipherError::InvalidRecipient {
            recipient: key.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Parse a list of recipients, skipping blank entries.
///
/// # Errors
///
/// `CipherError::NoRecipients` when every entry is blank.
pub fn parse_recipients<S: AsRef<str>>(recipients: &[S]) -> Result<Vec<x25519::Recipient>> {
    let parsed = recipients
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .map(parse_recipient)
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        return Err(CipherError::NoRecipients.into());
    }
    Ok(parsed)
}

/// Order-independent digest of a recipient set.
///
/// Entries are trimmed, blanks dropped, duplicates collapsed, and the
/// sorted result hashed as `r1\nr2\n...` with SHA-256. Returns lowercase hex.
pub fn fingerprint<S: AsRef<str>>(recipients: &[S]) -> String {
    let set: BTreeSet<&str> = recipients
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .collect();
    let mut hasher = Sha256::new();
    for r in set {
        hasher.update(r.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipient_valid() {
        let identity = x25519::Identity::generate();
        let pubkey = identity.to_public().to_string();
        let parsed = parse_recipient(&format!("  {}  ", pubkey)).unwrap();
        assert_eq!(parsed.to_string(), pubkey);
    }

    #[test]
    fn test_parse_recipient_invalid_echoes_value() {
        let err = parse_recipient("not-a-valid-key").unwrap_err();
        assert!(err.to_string().contains("not-a-valid-key"));
    }

    #[test]
    fn test_fingerprint_order_independent() {
        assert_eq!(fingerprint(&[" B ", "A", "A"]), fingerprint(&["A", "B"]));
        assert_eq!(fingerprint(&["A", "", "B"]), fingerprint(&["B", "A"]));
        assert_ne!(fingerprint(&["A"]), fingerprint(&["A", "B"]));
    }

    #[test]
    fn test_fingerprint_known_value() {
        let empty: [&str; 0] = [];
        // SHA-256 of the empty string.
        assert_eq!(
            fingerprint(&empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        // SHA-256 of "A\n".
        assert_eq!(
            fingerprint(&["A"]),
            "06f961b802bc46ee168555f066d28f4f0e9afdf3f88174c1ee6f9de004fc30a0"
        );
    }
}
