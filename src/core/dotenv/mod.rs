//! Line-preserving envfile model.
//!
//! A [`Dotenv`] is an ordered list of [`RawLine`]s. Serializing an
//! unmodified document reproduces the input byte for byte; edits replace,
//! insert, or remove whole lines and never touch the rest of the file.

pub mod value;

use tracing::trace;

use crate::core::constants::DIVIDER_WIDTH;
use crate::core::domain::Entry;
use crate::core::validation::validate_key;
use crate::error::{Result, ValidationError};

pub use value::{normalize_value, render_value};

/// Line terminator recorded for a [`RawLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
    /// Final line without a terminator.
    None,
}

impl Newline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
            Newline::None => "",
        }
    }
}

/// One physical line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub nl: Newline,
}

impl RawLine {
    pub fn new(text: impl Into<String>, nl: Newline) -> Self {
        Self {
            text: text.into(),
            nl,
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Options for [`Dotenv::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Target section, matched case-insensitively against `# [name]`.
    pub section: Option<String>,
}

impl SetOptions {
    pub fn section(name: impl Into<String>) -> Self {
        Self {
            section: Some(name.into()),
        }
    }
}

/// A parsed envfile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dotenv {
    lines: Vec<RawLine>,
    default_nl: Newline,
}

impl Dotenv {
    /// Parse envfile text. Never fails: unrecognized lines are kept as-is.
    pub fn parse(input: &str) -> Self {
        let lines = split_lines(input);
        let default_nl = lines
            .iter()
            .map(|l| l.nl)
            .find(|nl| *nl != Newline::None)
            .unwrap_or_default();
        trace!(lines = lines.len(), "parsed dotenv");
        Self { lines, default_nl }
    }

    /// Parse raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotUtf8` naming the first offending line.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match std::str::from_utf8(data) {
            Ok(text) => Ok(Self::parse(text)),
            Err(e) => {
                let line = data[..e.valid_up_to()]
                    .iter()
                    .filter(|b| **b == b'\n')
                    .count()
                    + 1;
                Err(ValidationError::NotUtf8 { line }.into())
            }
        }
    }

    pub(crate) fn from_lines(lines: Vec<RawLine>, default_nl: Newline) -> Self {
        Self { lines, default_nl }
    }

    /// Serialize back to text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.text.len() + 2).sum());
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.nl.as_str());
        }
        out
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.render().into_bytes()
    }

    pub fn lines(&self) -> &[RawLine] {
        &self.lines
    }

    pub fn default_nl(&self) -> Newline {
        self.default_nl
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn lines_mut(&mut self) -> &mut Vec<RawLine> {
        &mut self.lines
    }

    /// Replace the text of line `index`, returning whether it differed.
    pub(crate) fn replace_text(&mut self, index: usize, text: String) -> bool {
        match self.lines.get_mut(index) {
            Some(line) if line.text != text => {
                line.text = text;
                true
            }
            _ => false,
        }
    }

    /// Every assignment line with its index, in file order.
    pub fn assignments(&self) -> impl Iterator<Item = (usize, Assignment)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| parse_assignment(&line.text).map(|a| (i, a)))
    }

    /// Raw value of the last assignment to `key`, whitespace-trimmed.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.assignments()
            .filter(|(_, a)| a.key == key)
            .last()
            .map(|(_, a)| a.value_raw.trim().to_string())
    }

    /// Set `key` to the raw `value`.
    ///
    /// Without a section, the last existing occurrence is rewritten in
    /// place (keeping `export`, spacing around `=`, and the inline comment)
    /// or a canonical `KEY=value` line is appended. With a section, the
    /// update or insertion is confined to that section, which is scaffolded
    /// at the end of the file if missing.
    ///
    /// Returns whether the document changed.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidKey` for an invalid key.
    pub fn set(&mut self, key: &str, value: &str, opts: &SetOptions) -> Result<bool> {
        let key = key.trim();
        validate_key(key)?;

        if let Some(section) = opts.section.as_deref().and_then(normalize_section) {
            return Ok(self.set_in_section(key, value, &section));
        }

        let existing = self.assignments().filter(|(_, a)| a.key == key).last();
        if let Some((index, assign)) = existing {
            let line = assign.render_preserving(value);
            return Ok(self.replace_text(index, line));
        }

        self.ensure_appendable();
        self.lines
            .push(RawLine::new(render_assignment("", false, key, value, ""), self.default_nl));
        Ok(true)
    }

    /// Remove every assignment to `key`. Returns whether anything was removed.
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        let key = key.trim();
        validate_key(key)?;
        let before = self.lines.len();
        self.lines
            .retain(|line| parse_assignment(&line.text).map_or(true, |a| a.key != key));
        Ok(self.lines.len() != before)
    }

    /// Logical entries: first-occurrence order, last value wins.
    ///
    /// # Errors
    ///
    /// Fails on an invalid key or a malformed quoted value.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let mut order: Vec<String> = Vec::new();
        let mut values: std::collections::HashMap<String, String> = std::collections::HashMap::new();
        for (_, assign) in self.assignments() {
            validate_key(&assign.key)?;
            let value = normalize_value(&assign.value_raw)?;
            if values.insert(assign.key.clone(), value).is_none() {
                order.push(assign.key);
            }
        }
        Ok(order
            .into_iter()
            .filter_map(|key| values.remove(&key).map(|v| Entry::new(key, v)))
            .collect())
    }

    /// Distinct assignment keys in first-occurrence order.
    pub fn keys(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.assignments()
            .filter_map(|(_, a)| seen.insert(a.key.clone()).then_some(a.key))
            .collect()
    }

    fn set_in_section(&mut self, key: &str, value: &str, section: &str) -> bool {
        let Some((start, end)) = find_section_range(&self.lines, section) else {
            self.append_section(section, &[render_assignment("", false, key, value, "")]);
            return true;
        };

        let existing = (start + 1..end)
            .filter_map(|i| parse_assignment(&self.lines[i].text).map(|a| (i, a)))
            .filter(|(_, a)| a.key == key)
            .last();
        if let Some((index, assign)) = existing {
            let line = assign.render_preserving(value);
            return self.replace_text(index, line);
        }

        let mut insert_at = end;
        while insert_at > start + 1 && self.lines[insert_at - 1].is_blank() {
            insert_at -= 1;
        }
        self.ensure_line_has_nl(insert_at - 1);
        self.lines.insert(
            insert_at,
            RawLine::new(render_assignment("", false, key, value, ""), self.default_nl),
        );
        true
    }

    pub(crate) fn append_section(&mut self, section: &str, payload: &[String]) {
        self.ensure_appendable();
        if self.lines.iter().any(|l| !l.is_blank()) {
            self.lines.push(RawLine::new("", self.default_nl));
        }
        self.lines.push(RawLine::new(divider_line(), self.default_nl));
        self.lines
            .push(RawLine::new(section_header(section), self.default_nl));
        for line in payload {
            self.lines.push(RawLine::new(
                line.trim_end_matches(['\r', '\n']),
                self.default_nl,
            ));
        }
    }

    pub(crate) fn ensure_appendable(&mut self) {
        if let Some(last) = self.lines.len().checked_sub(1) {
            self.ensure_line_has_nl(last);
        }
    }

    pub(crate) fn ensure_line_has_nl(&mut self, index: usize) {
        let nl = self.default_nl;
        if let Some(line) = self.lines.get_mut(index) {
            if line.nl == Newline::None {
                line.nl = nl;
            }
        }
    }
}

impl std::fmt::Display for Dotenv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn split_lines(input: &str) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        match rest.find('\n') {
            Some(idx) => {
                let line = &rest[..idx];
                let (text, nl) = match line.strip_suffix('\r') {
                    Some(text) => (text, Newline::CrLf),
                    None => (line, Newline::Lf),
                };
                out.push(RawLine::new(text, nl));
                rest = &rest[idx + 1..];
            }
            None => {
                out.push(RawLine::new(rest, Newline::None));
                break;
            }
        }
    }
    out
}

/// Decomposition of a `KEY=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Whitespace before the key (or `export`).
    pub leading: String,
    pub export: bool,
    /// Everything left of `=`, verbatim.
    pub left_raw: String,
    pub key: String,
    /// Right-hand side up to the inline comment, including any quotes and
    /// the whitespace after `=`.
    pub value_raw: String,
    /// Whitespace between `=` and the value.
    pub value_ws: String,
    /// Inline comment tail including its leading whitespace.
    pub comment: String,
}

impl Assignment {
    /// Render this line with a new raw value, keeping its layout.
    pub fn render_preserving(&self, value: &str) -> String {
        if self.left_raw.trim().is_empty() {
            return render_assignment(&self.leading, self.export, &self.key, value, &self.comment);
        }
        format!(
            "{}={}{}{}",
            self.left_raw,
            self.value_ws,
            value.trim(),
            self.comment
        )
    }
}

/// Parse one line as an assignment. Blank lines, comments, lines without
/// `=`, and lines with an empty key yield `None`.
pub fn parse_assignment(line: &str) -> Option<Assignment> {
    if line.trim().is_empty() {
        return None;
    }
    let trimmed_left = line.trim_start_matches([' ', '\t']);
    if trimmed_left.starts_with('#') {
        return None;
    }
    let (left, right) = line.split_once('=')?;

    let leading = &left[..left.len() - left.trim_start_matches([' ', '\t']).len()];
    let mut key_part = left.trim();
    let mut export = false;
    if key_part.starts_with("export ") || key_part.starts_with("export\t") {
        export = true;
        key_part = key_part["export".len()..].trim();
    }
    if key_part.is_empty() {
        return None;
    }

    let (value_raw, comment) = split_value_and_comment(right);
    let value_ws = &value_raw[..value_raw.len() - value_raw.trim_start_matches([' ', '\t']).len()];
    Some(Assignment {
        leading: leading.to_string(),
        export,
        left_raw: left.to_string(),
        key: key_part.to_string(),
        value_raw: value_raw.to_string(),
        value_ws: value_ws.to_string(),
        comment: comment.to_string(),
    })
}

/// Split a right-hand side into `(value, comment)`.
///
/// Quoted values end at their closing quote; an unquoted `#` only starts a
/// comment when preceded by whitespace, and that whitespace belongs to the
/// comment.
pub(crate) fn split_value_and_comment(right: &str) -> (&str, &str) {
    let bytes = right.as_bytes();
    let is_ws = |b: u8| b == b' ' || b == b'\t';

    let start = bytes.iter().position(|b| !is_ws(*b)).unwrap_or(bytes.len());
    if start >= bytes.len() {
        return (right, "");
    }

    let comment_after = |end: usize| {
        let rest = &bytes[end + 1..];
        let ws = rest.iter().take_while(|b| is_ws(**b)).count();
        if rest.get(ws) == Some(&b'#') {
            right.split_at(end + 1)
        } else {
            (right, "")
        }
    };

    match bytes[start] {
        b'#' => ("", right),
        b'\'' => match bytes[start + 1..].iter().position(|b| *b == b'\'') {
            Some(off) => comment_after(start + 1 + off),
            None => (right, ""),
        },
        b'"' => {
            let mut escaped = false;
            let mut end = None;
            for (i, b) in bytes.iter().enumerate().skip(start + 1) {
                if escaped {
                    escaped = false;
                } else if *b == b'\\' {
                    escaped = true;
                } else if *b == b'"' {
                    end = Some(i);
                    break;
                }
            }
            match end {
                Some(end) => comment_after(end),
                None => (right, ""),
            }
        }
        _ => {
            for i in start + 1..bytes.len() {
                if bytes[i] == b'#' && is_ws(bytes[i - 1]) {
                    let mut cstart = i - 1;
                    while cstart > start && is_ws(bytes[cstart - 1]) {
                        cstart -= 1;
                    }
                    return right.split_at(cstart);
                }
            }
            (right, "")
        }
    }
}

/// Canonical `[export ]KEY=value[comment]` rendering.
pub(crate) fn render_assignment(
    leading: &str,
    export: bool,
    key: &str,
    value: &str,
    comment: &str,
) -> String {
    let key = key.trim();
    if key.is_empty() {
        return leading.trim_end_matches([' ', '\t']).to_string();
    }
    let mut out = String::with_capacity(leading.len() + key.len() + value.len() + comment.len() + 8);
    out.push_str(leading);
    if export {
        out.push_str("export ");
    }
    out.push_str(key);
    out.push('=');
    out.push_str(value.trim());
    out.push_str(comment);
    out
}

fn normalize_section(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

fn section_header(name: &str) -> String {
    format!("# [{}]", name.trim().to_lowercase())
}

/// `# ` followed by the canonical run of dashes.
pub(crate) fn divider_line() -> String {
    format!("# {}", "-".repeat(DIVIDER_WIDTH))
}

/// A comment whose body is at least ten dashes.
pub(crate) fn is_divider_line(line: &str) -> bool {
    let Some(body) = line.trim().strip_prefix('#') else {
        return false;
    };
    let body = body.trim();
    body.len() >= 10 && body.bytes().all(|b| b == b'-')
}

/// Lowercased section name if `line` is a `# [name]` header.
pub(crate) fn section_header_name(line: &str) -> Option<String> {
    let body = line.trim().strip_prefix('#')?.trim();
    let inner = body.strip_prefix('[')?.strip_suffix(']')?;
    normalize_section(inner)
}

/// Half-open range `(header_index, end)` of a section. The end stops
/// before the divider that belongs to the following section.
fn find_section_range(lines: &[RawLine], section: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| section_header_name(&l.text).as_deref() == Some(section))?;

    let mut end = lines.len();
    if let Some(next) = (start + 1..lines.len()).find(|i| section_header_name(&lines[*i].text).is_some()) {
        end = next;
        let mut j = next;
        while j > 0 && lines[j - 1].is_blank() {
            j -= 1;
        }
        if j > 0 && is_divider_line(&lines[j - 1].text) {
            end = j - 1;
        }
    }
    Some((start, end))
}
