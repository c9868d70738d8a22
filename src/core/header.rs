//! Vault header directives.
//!
//! The header is a block of comment lines at the top of an envfile:
//!
//! ```text
//! # si-vault:v1
//! # si-vault:recipient age1...
//! # si-vault:recipient age1...
//!
//! ```
//!
//! Directives are recognized only on comment lines, and the keyword must be
//! followed by whitespace, so `# si-vault:recipient-count 3` is an ordinary
//! comment.

use tracing::debug;

use crate::core::constants::{HEADER_VERSION, HEADER_VERSION_LINE, RECIPIENT_DIRECTIVE, RECIPIENT_LINE_PREFIX};
use crate::core::dotenv::{Dotenv, RawLine};

/// Header block found at the top of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub has_version: bool,
    /// Recipients in file order, duplicates dropped.
    pub recipients: Vec<String>,
    /// Index one past the block, including its trailing blank line.
    pub end: usize,
}

impl Header {
    /// Walk the leading directive lines of `doc`.
    pub fn parse(doc: &Dotenv) -> Self {
        let mut header = Header::default();
        for line in doc.lines() {
            if line.is_blank() {
                if header.is_present() {
                    header.end += 1;
                }
                break;
            }
            if is_version_line(&line.text) {
                header.has_version = true;
            } else if let Some(r) = parse_recipient_line(&line.text) {
                if !header.recipients.iter().any(|x| x == r) {
                    header.recipients.push(r.to_string());
                }
            } else {
                break;
            }
            header.end += 1;
        }
        header
    }

    pub fn is_present(&self) -> bool {
        self.has_version || !self.recipients.is_empty()
    }
}

/// Body of a comment line, or `None` for non-comments.
fn comment_body(line: &str) -> Option<&str> {
    line.trim().strip_prefix('#').map(str::trim)
}

/// `# si-vault:v1`, with any spacing around the `#`.
pub fn is_version_line(line: &str) -> bool {
    comment_body(line) == Some(HEADER_VERSION)
}

/// Recipient carried by a `# si-vault:recipient <r>` line.
pub fn parse_recipient_line(line: &str) -> Option<&str> {
    let rest = comment_body(line)?.strip_prefix(RECIPIENT_DIRECTIVE)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let recipient = rest.trim();
    (!recipient.is_empty()).then_some(recipient)
}

/// Either header directive.
pub fn is_header_line(line: &str) -> bool {
    is_version_line(line) || parse_recipient_line(line).is_some()
}

/// Whether the document starts with a header block.
pub fn has_header(doc: &Dotenv) -> bool {
    Header::parse(doc).is_present()
}

/// Recipients declared in the top header block.
pub fn list_recipients(doc: &Dotenv) -> Vec<String> {
    Header::parse(doc).recipients
}

/// Every recipient directive anywhere in the file, in order, deduplicated.
pub fn parse_recipients(doc: &Dotenv) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in doc.lines() {
        if let Some(r) = parse_recipient_line(&line.text) {
            if !out.iter().any(|x| x == r) {
                out.push(r.to_string());
            }
        }
    }
    out
}

fn normalize_recipients<S: AsRef<str>>(recipients: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in recipients {
        let r = r.as_ref().trim();
        if !r.is_empty() && !out.iter().any(|x| x == r) {
            out.push(r.to_string());
        }
    }
    out
}

/// Make sure the header declares every recipient in `recipients`.
///
/// An existing block only gains the missing recipient lines (after its
/// last recipient), a version line if absent, and a separating blank line.
/// Without a block, a fresh one is prepended. Returns whether anything
/// was added.
pub fn ensure_header<S: AsRef<str>>(doc: &mut Dotenv, recipients: &[S]) -> bool {
    let wanted = normalize_recipients(recipients);
    if wanted.is_empty() {
        return false;
    }
    let nl = doc.default_nl();
    let header = Header::parse(doc);

    if !header.is_present() {
        let mut block = vec![RawLine::new(HEADER_VERSION_LINE, nl)];
        block.extend(
            wanted
                .iter()
                .map(|r| RawLine::new(format!("{}{}", RECIPIENT_LINE_PREFIX, r), nl)),
        );
        block.push(RawLine::new("", nl));
        let lines = doc.lines_mut();
        block.append(lines);
        *lines = block;
        debug!(recipients = wanted.len(), "prepended vault header");
        return true;
    }

    let mut changed = false;
    let block = &doc.lines()[..header.end];
    let mut insert_at = block
        .iter()
        .rposition(|l| parse_recipient_line(&l.text).is_some())
        .or_else(|| block.iter().rposition(|l| is_version_line(&l.text)))
        .map_or(0, |i| i + 1);

    for r in wanted.iter().filter(|r| !header.recipients.contains(r)) {
        if insert_at > 0 {
            doc.ensure_line_has_nl(insert_at - 1);
        }
        doc.lines_mut()
            .insert(insert_at, RawLine::new(format!("{}{}", RECIPIENT_LINE_PREFIX, r), nl));
        insert_at += 1;
        changed = true;
    }

    if !header.has_version {
        doc.lines_mut()
            .insert(0, RawLine::new(HEADER_VERSION_LINE, nl));
        changed = true;
    }

    let directives_end = doc
        .lines()
        .iter()
        .position(|l| !is_header_line(&l.text))
        .unwrap_or(doc.lines().len());
    if directives_end >= doc.lines().len() {
        doc.ensure_appendable();
        doc.lines_mut().push(RawLine::new("", nl));
        changed = true;
    } else if !doc.lines()[directives_end].is_blank() {
        doc.ensure_line_has_nl(directives_end - 1);
        doc.lines_mut()
            .insert(directives_end, RawLine::new("", nl));
        changed = true;
    }

    if changed {
        debug!(recipients = wanted.len(), "updated vault header");
    }
    changed
}

/// Drop every recipient line naming `recipient`. Returns whether any line
/// was removed.
pub fn remove_recipient(doc: &mut Dotenv, recipient: &str) -> bool {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return false;
    }
    let lines = doc.lines_mut();
    let before = lines.len();
    lines.retain(|l| parse_recipient_line(&l.text) != Some(recipient));
    before != lines.len()
}
