//! Value normalization and rendering.
//!
//! `normalize_value` turns the raw right-hand side of an assignment into its
//! plaintext; `render_value` picks the smallest representation that the
//! parser reads back to the same plaintext.

use crate::core::validation::is_printable;
use crate::error::{Result, ValidationError};

/// Decode a raw assignment value.
///
/// Single-quoted values are taken verbatim; double-quoted values are
/// unescaped (`\n`, `\t`, `\r`, `\"`, `\\`, `\xHH`, `\uHHHH`, `\UHHHHHHHH`,
/// octal, and the single-letter C escapes). Anything else is returned
/// trimmed.
///
/// # Errors
///
/// Returns `ValidationError::InvalidQuotedValue` for an unterminated quote
/// or a bad escape sequence.
pub fn normalize_value(raw: &str) -> Result<String> {
    let value = raw.trim();
    if let Some(rest) = value.strip_prefix('\'') {
        return match rest.strip_suffix('\'') {
            Some(inner) if !inner.contains('\'') => Ok(inner.to_string()),
            _ => Err(invalid_quoted(raw)),
        };
    }
    if value.starts_with('"') {
        return unquote(value).ok_or_else(|| invalid_quoted(raw));
    }
    Ok(value.to_string())
}

/// Render plaintext so that `normalize_value(render_value(p)) == p`.
pub fn render_value(plain: &str) -> String {
    if plain.is_empty() {
        return String::new();
    }
    if needs_quotes(plain) {
        quote(plain)
    } else {
        plain.to_string()
    }
}

fn needs_quotes(plain: &str) -> bool {
    let first = plain.chars().next();
    let last = plain.chars().last();
    if matches!(first, Some('#' | '\'' | '"')) {
        return true;
    }
    if first.is_some_and(char::is_whitespace) || last.is_some_and(char::is_whitespace) {
        return true;
    }
    if plain.contains(['\r', '\n']) {
        return true;
    }
    if plain.contains(" #") || plain.contains("\t#") {
        return true;
    }
    plain.chars().any(|c| !is_printable(c))
}

fn quote(plain: &str) -> String {
    let mut out = String::with_capacity(plain.len() + 2);
    out.push('"');
    for ch in plain.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == ' ' || is_printable(c) => out.push(c),
            c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) <= 0xFFFF => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Strict double-quoted literal decoding. Returns `None` on any malformed
/// input, including trailing bytes after the closing quote.
fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    let mut bytes: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\n' => return None,
            '\\' => {
                let esc = chars.next()?;
                match esc {
                    'a' => bytes.push(0x07),
                    'b' => bytes.push(0x08),
                    'f' => bytes.push(0x0c),
                    'n' => bytes.push(b'\n'),
                    'r' => bytes.push(b'\r'),
                    't' => bytes.push(b'\t'),
                    'v' => bytes.push(0x0b),
                    '\\' => bytes.push(b'\\'),
                    '"' => bytes.push(b'"'),
                    '\'' => bytes.push(b'\''),
                    'x' => bytes.push(take_hex(&mut chars, 2)? as u8),
                    'u' => push_char(&mut bytes, char::from_u32(take_hex(&mut chars, 4)?)?),
                    'U' => push_char(&mut bytes, char::from_u32(take_hex(&mut chars, 8)?)?),
                    '0'..='7' => {
                        let mut n = esc.to_digit(8)?;
                        for _ in 0..2 {
                            n = n * 8 + chars.next()?.to_digit(8)?;
                        }
                        if n > 0xFF {
                            return None;
                        }
                        bytes.push(n as u8);
                    }
                    _ => return None,
                }
            }
            c => push_char(&mut bytes, c),
        }
    }

    String::from_utf8(bytes).ok()
}

fn take_hex(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
    let mut n = 0u32;
    for _ in 0..digits {
        n = n * 16 + chars.next()?.to_digit(16)?;
    }
    Some(n)
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn invalid_quoted(raw: &str) -> crate::error::Error {
    ValidationError::InvalidQuotedValue(raw.trim().to_string()).into()
}
