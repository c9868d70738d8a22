//! Prefix-tagged ciphertext envelope.
//!
//! A stored value is `<tag><base64>`. The current tag carries the age stream
//! with its fixed magic line and first stanza prefix stripped; the full-stream
//! tag carries the whole stream. A tag with no payload is the canonical
//! encoding of the empty string.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::core::constants::{PREFIX_V1, PREFIX_V2, PREFIX_V2_LEGACY};
use crate::error::{CipherError, Result};

/// First line of every age binary stream.
pub const AGE_MAGIC: &str = "age-encryption.org/v1\n";

/// Start of the first X25519 recipient stanza.
pub const X25519_STANZA: &str = "-> X25519 ";

/// Header MAC line marker.
pub const MAC_MARKER: &str = "\n--- ";

/// Recognized ciphertext tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `encrypted:si:v2:` with the compact payload.
    Compact,
    /// `es2:`, same payload as [`Tag::Compact`].
    LegacyCompact,
    /// `encrypted:si:v1:` with the full stream.
    Full,
}

impl Tag {
    /// Match order for decoding.
    pub const ALL: [Tag; 3] = [Tag::Compact, Tag::LegacyCompact, Tag::Full];

    pub fn prefix(&self) -> &'static str {
        match self {
            Tag::Compact => PREFIX_V2,
            Tag::LegacyCompact => PREFIX_V2_LEGACY,
            Tag::Full => PREFIX_V1,
        }
    }

    fn is_compact(&self) -> bool {
        matches!(self, Tag::Compact | Tag::LegacyCompact)
    }

    /// Tag of a (whitespace-trimmed) value.
    pub fn detect(value: &str) -> Option<Tag> {
        let value = value.trim();
        Tag::ALL.into_iter().find(|t| value.starts_with(t.prefix()))
    }
}

fn compact_prefix() -> String {
    format!("{}{}", AGE_MAGIC, X25519_STANZA)
}

/// Encode a raw age stream, stripping the fixed prefix when present.
pub fn seal(raw: &[u8]) -> String {
    let prefix = compact_prefix();
    match raw.strip_prefix(prefix.as_bytes()) {
        Some(rest) => format!("{}{}", PREFIX_V2, URL_SAFE_NO_PAD.encode(rest)),
        None => format!("{}{}", PREFIX_V1, URL_SAFE_NO_PAD.encode(raw)),
    }
}

/// Encode under an explicit tag and base64 engine.
pub fn seal_with<E: Engine>(raw: &[u8], tag: Tag, engine: &E) -> Result<String> {
    let body: &[u8] = if tag.is_compact() {
        raw.strip_prefix(compact_prefix().as_bytes())
            .ok_or_else(|| CipherError::InvalidPayload("stream has no compact prefix".into()))?
    } else {
        raw
    };
    Ok(format!("{}{}", tag.prefix(), engine.encode(body)))
}

/// Decode a stored value back to the full age stream.
///
/// Returns `Ok(None)` for the canonical empty marker (a bare tag).
///
/// # Errors
///
/// `CipherError::NotCiphertext` when no tag matches;
/// `CipherError::InvalidPayload` when no base64 alphabet accepts the payload.
pub fn open(ciphertext: &str) -> Result<Option<Vec<u8>>> {
    let ciphertext = ciphertext.trim();
    let tag = Tag::detect(ciphertext).ok_or_else(|| CipherError::NotCiphertext {
        expected: format!("{}, {}, or {}", PREFIX_V2, PREFIX_V2_LEGACY, PREFIX_V1),
    })?;
    let payload = ciphertext[tag.prefix().len()..].trim();
    if payload.is_empty() {
        return Ok(None);
    }
    let body = decode_any(payload)?;
    if !tag.is_compact() {
        return Ok(Some(body));
    }
    let prefix = compact_prefix();
    let mut raw = Vec::with_capacity(prefix.len() + body.len());
    raw.extend_from_slice(prefix.as_bytes());
    raw.extend_from_slice(&body);
    Ok(Some(raw))
}

/// Decode with url-safe unpadded, url-safe padded, standard unpadded, then
/// standard padded alphabets.
pub fn decode_any(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    let mut last = None;
    for attempt in [
        URL_SAFE_NO_PAD.decode(payload),
        URL_SAFE.decode(payload),
        STANDARD_NO_PAD.decode(payload),
        STANDARD.decode(payload),
    ] {
        match attempt {
            Ok(raw) => return Ok(raw),
            Err(e) => last = Some(e),
        }
    }
    let reason = last.map_or_else(|| "empty".to_string(), |e| e.to_string());
    Err(CipherError::InvalidPayload(reason).into())
}

/// Check a decoded stream looks like age: magic line and header MAC.
pub fn check_stream(raw: &[u8]) -> Result<()> {
    if !raw.starts_with(AGE_MAGIC.as_bytes()) {
        return Err(CipherError::InvalidPayload("not age format".into()).into());
    }
    if !raw
        .windows(MAC_MARKER.len())
        .any(|w| w == MAC_MARKER.as_bytes())
    {
        return Err(CipherError::InvalidPayload("missing age MAC stanza".into()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_stream() -> Vec<u8> {
        format!("{}{}abc\nxyz\n--- mac\nbody", AGE_MAGIC, X25519_STANZA).into_bytes()
    }

    #[test]
    fn test_seal_strips_compact_prefix() {
        let sealed = seal(&fake_stream());
        assert!(sealed.starts_with(PREFIX_V2));
        assert_eq!(open(&sealed).unwrap().unwrap(), fake_stream());
    }

    #[test]
    fn test_seal_falls_back_to_full_stream() {
        let raw = format!("{}-> scrypt abc\n--- mac\n", AGE_MAGIC).into_bytes();
        let sealed = seal(&raw);
        assert!(sealed.starts_with(PREFIX_V1));
        assert_eq!(open(&sealed).unwrap().unwrap(), raw);
    }

    #[test]
    fn test_open_accepts_every_alphabet() {
        let raw = fake_stream();
        for tag in Tag::ALL {
            for sealed in [
                seal_with(&raw, tag, &URL_SAFE_NO_PAD).unwrap(),
                seal_with(&raw, tag, &URL_SAFE).unwrap(),
                seal_with(&raw, tag, &STANDARD_NO_PAD).unwrap(),
                seal_with(&raw, tag, &STANDARD).unwrap(),
            ] {
                assert_eq!(open(&sealed).unwrap().unwrap(), raw, "{}", sealed);
            }
        }
    }

    #[test]
    fn test_bare_tag_is_empty() {
        for tag in Tag::ALL {
            assert_eq!(open(tag.prefix()).unwrap(), None);
            assert_eq!(open(&format!("  {}  ", tag.prefix())).unwrap(), None);
        }
    }

    #[test]
    fn test_open_rejects_untagged_and_garbage() {
        assert!(open("plain").is_err());
        let err = open("encrypted:si:v2:!!!not base64!!!").unwrap_err();
        assert!(err.to_string().contains("invalid ciphertext payload"));
    }

    #[test]
    fn test_check_stream() {
        assert!(check_stream(&fake_stream()).is_ok());
        assert!(check_stream(b"hello").is_err());
        assert!(check_stream(AGE_MAGIC.as_bytes()).is_err());
    }

    #[test]
    fn test_detect_trims() {
        assert_eq!(Tag::detect("  es2:abc"), Some(Tag::LegacyCompact));
        assert_eq!(Tag::detect("encrypted:si:v1:"), Some(Tag::Full));
        assert_eq!(Tag::detect("encrypted:si:v3:x"), None);
    }
}
