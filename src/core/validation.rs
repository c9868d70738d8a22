//! Input validation for vault operations.
//!
//! Conservative syntactic checks on env keys, env names, git paths and refs,
//! and secret-store attributes. Every check echoes the offending value.

use std::path::{Component, Path};

use crate::core::files::clean_path;
use crate::error::{Result, ValidationError};

const MAX_KEY_LEN: usize = 512;
const MAX_ENV_NAME_LEN: usize = 128;

/// Validate an environment variable key.
///
/// Keys must be non-empty, at most 512 bytes, printable, and contain no
/// `=`, NUL, line breaks, or whitespace. Non-ASCII printable code points
/// are accepted.
///
/// # Errors
///
/// Returns `ValidationError::InvalidKey` naming the first violation.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ValidationError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if key.is_empty() {
        return invalid("key is required");
    }
    if key.len() > MAX_KEY_LEN {
        return invalid("key is too long (max 512 bytes)");
    }
    for ch in key.chars() {
        match ch {
            '=' => return invalid("'=' is not allowed"),
            '\0' => return invalid("NUL is not allowed"),
            '\n' | '\r' => return invalid("line breaks are not allowed"),
            _ => {}
        }
        if ch.is_whitespace() {
            return invalid("whitespace is not allowed");
        }
        if !is_printable(ch) {
            return invalid("non-printable character is not allowed");
        }
    }
    Ok(())
}

/// Validate an environment name used to derive a file name (e.g. `prod`
/// in `.env.prod`).
pub fn validate_env_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ValidationError::InvalidEnvName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if name.is_empty() {
        return invalid("name is required");
    }
    if name.len() > MAX_ENV_NAME_LEN {
        return invalid("name is too long (max 128 bytes)");
    }
    if name == "." || name == ".." {
        return invalid("relative path names are not allowed");
    }
    for ch in name.chars() {
        if ch == '/' || ch == '\\' {
            return invalid("path separators are not allowed");
        }
        if ch.is_whitespace() {
            return invalid("whitespace is not allowed");
        }
        if ch.is_control() {
            return invalid("control characters are not allowed");
        }
    }
    Ok(())
}

/// Validate a repo-relative path passed to git.
pub fn validate_git_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ValidationError::InvalidGitPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if path.trim().is_empty() {
        return invalid("path is required");
    }
    if path.starts_with('-') {
        return invalid("leading '-' is not allowed");
    }
    if path.contains('\0') {
        return invalid("NUL is not allowed");
    }
    let cleaned = clean_path(Path::new(path));
    if cleaned.is_absolute() || cleaned.has_root() {
        return invalid("path must be repo-relative");
    }
    if cleaned == Path::new(".") {
        return invalid("path must name a file or directory");
    }
    if cleaned
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return invalid("path escapes the repository");
    }
    Ok(())
}

/// Validate a git ref name (branch, tag, or remote ref).
pub fn validate_git_ref(reference: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(ValidationError::InvalidGitRef {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if reference.is_empty() {
        return invalid("ref is required");
    }
    if reference.starts_with('-') {
        return invalid("leading '-' is not allowed");
    }
    if let Some(ch) = reference
        .chars()
        .find(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\\' | '~' | '^' | ':' | '?' | '*' | '['))
    {
        return invalid(&format!("character {:?} is not allowed", ch));
    }
    if reference.contains("..") {
        return invalid("'..' is not allowed");
    }
    if reference.contains("//") {
        return invalid("'//' is not allowed");
    }
    if reference.contains("@{") {
        return invalid("'@{' is not allowed");
    }
    if reference.starts_with('/') || reference.ends_with('/') {
        return invalid("leading or trailing '/' is not allowed");
    }
    if reference.ends_with('.') {
        return invalid("trailing '.' is not allowed");
    }
    Ok(())
}

/// Validate a secret-store attribute (service, account) before it is
/// placed on a command line. Returns the trimmed value.
pub fn validate_attribute(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    let invalid = |reason: &str| -> Result<String> {
        Err(ValidationError::InvalidAttribute {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };

    if trimmed.is_empty() {
        return invalid("value is required");
    }
    for ch in trimmed.chars() {
        if matches!(ch, '\0' | '\n' | '\r') {
            return invalid("contains forbidden character");
        }
        if ch.is_whitespace() {
            return invalid("whitespace is not allowed");
        }
        if !is_printable(ch) {
            return invalid("non-printable character is not allowed");
        }
    }
    Ok(trimmed.to_string())
}

/// Printable in the sense of "renders as a visible glyph or a plain space".
///
/// Rejects control characters, format characters that render invisibly
/// (zero-width joiners, bidi overrides, BOM), private-use code points, and
/// the BMP noncharacters.
///
/// This is an approximation of the Unicode general categories: it carries
/// no assigned-character table, so unassigned code points (category `Cn`)
/// count as printable. Keys using them still round-trip byte for byte.
pub(crate) fn is_printable(ch: char) -> bool {
    if ch == ' ' {
        return true;
    }
    if ch.is_control() || ch.is_whitespace() {
        return false;
    }
    let cp = ch as u32;
    !matches!(cp,
        0x00AD
        | 0x0600..=0x0605
        | 0x061C
        | 0x06DD
        | 0x070F
        | 0x180E
        | 0x200B..=0x200F
        | 0x202A..=0x202E
        | 0x2060..=0x2064
        | 0x2066..=0x206F
        | 0xFEFF
        | 0xFFF9..=0xFFFB
        | 0xE000..=0xF8FF
        | 0xFDD0..=0xFDEF
        | 0xFFFE..=0xFFFF
        | 0xE0001
        | 0xE0020..=0xE007F
        | 0xF0000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_classes() {
        assert!(is_printable('a'));
        assert!(is_printable(' '));
        assert!(is_printable('É'));
        assert!(!is_printable('\t'));
        assert!(!is_printable('\u{200B}'));
        assert!(!is_printable('\u{202E}'));
        assert!(!is_printable('\u{FEFF}'));
        assert!(!is_printable('\u{E000}'));
        assert!(!is_printable('\u{FDD0}'));
        // Unassigned code points are not tabulated and pass.
        assert!(is_printable('\u{0378}'));
    }

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("DATABASE_URL").is_ok());
        assert!(validate_key("api.key-1").is_ok());
        assert!(validate_key("_PRIVATE").is_ok());
        assert!(validate_key("CLÉ").is_ok());
        assert!(validate_key(&"K".repeat(512)).is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("A=B").is_err());
        assert!(validate_key("A B").is_err());
        assert!(validate_key("A\tB").is_err());
        assert!(validate_key("A\nB").is_err());
        assert!(validate_key("A\0B").is_err());
        assert!(validate_key(&"K".repeat(513)).is_err());
    }

    #[test]
    fn test_unicode_non_printable_keys_rejected() {
        assert!(validate_key("A\u{7f}B").is_err());
        assert!(validate_key("A\u{200B}B").is_err());
        assert!(validate_key("A\u{202E}B").is_err());
        assert!(validate_key("\u{FEFF}KEY").is_err());
        assert!(validate_key("A\u{00A0}B").is_err());
    }

    #[test]
    fn test_key_error_echoes_value() {
        let err = validate_key("BAD KEY").unwrap_err();
        assert!(err.to_string().contains("BAD KEY"));
    }

    #[test]
    fn test_env_names() {
        assert!(validate_env_name("prod").is_ok());
        assert!(validate_env_name("staging-eu.1").is_ok());
        assert!(validate_env_name("").is_err());
        assert!(validate_env_name("a/b").is_err());
        assert!(validate_env_name("a\\b").is_err());
        assert!(validate_env_name("a b").is_err());
        assert!(validate_env_name("a\u{1}").is_err());
        assert!(validate_env_name("..").is_err());
        assert!(validate_env_name(&"n".repeat(129)).is_err());
    }

    #[test]
    fn test_git_paths() {
        assert!(validate_git_path("vault").is_ok());
        assert!(validate_git_path("a/../b").is_ok());
        assert!(validate_git_path("./vault/.env").is_ok());
        assert!(validate_git_path("").is_err());
        assert!(validate_git_path("-rf").is_err());
        assert!(validate_git_path("/etc/passwd").is_err());
        assert!(validate_git_path("../outside").is_err());
        assert!(validate_git_path("a/../..").is_err());
        assert!(validate_git_path(".").is_err());
        assert!(validate_git_path("a\0b").is_err());
    }

    #[test]
    fn test_git_refs() {
        assert!(validate_git_ref("main").is_ok());
        assert!(validate_git_ref("feature/vault-v2").is_ok());
        assert!(validate_git_ref("refs/tags/v1.0").is_ok());
        for bad in [
            "", "-main", "a b", "a~1", "a^", "a:b", "a?", "a*", "a[", "a\\b", "a..b", "a//b",
            "a@{1}", "/main", "main/", "main.",
        ] {
            assert!(validate_git_ref(bad).is_err(), "expected {:?} to be rejected", bad);
        }
    }

    #[test]
    fn test_attributes() {
        assert_eq!(validate_attribute("service", " si-vault ").unwrap(), "si-vault");
        assert!(validate_attribute("service", "   ").is_err());
        assert!(validate_attribute("account", "a b").is_err());
        assert!(validate_attribute("account", "a\u{0}").is_err());
        assert!(validate_attribute("account", "a\u{200B}").is_err());
    }
}
