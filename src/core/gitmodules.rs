//! `.gitmodules` editing.
//!
//! A vault repository mounted as a submodule shows up as dirty whenever its
//! envfiles are decrypted in place. Setting `ignore = dirty` on that
//! submodule silences it.

use std::path::Path;

use tracing::debug;

use crate::core::dotenv::{Dotenv, RawLine};
use crate::core::files::{clean_path, read_scoped, write_atomic};
use crate::core::validation::validate_git_path;
use crate::error::{Result, ValidationError};

const IGNORE_DIRTY: &str = "ignore = dirty";

/// `key = value` on a `.gitmodules` line, key lowercased.
fn parse_kv(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_ascii_lowercase(), value.trim()))
}

fn is_section_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('[') && trimmed.ends_with(']')
}

/// Set `ignore = dirty` on the submodule whose `path` is `rel_path`.
///
/// Inserts the line after `url = ` (or after `path = ` when there is no
/// url) using the section's indentation, or rewrites an existing `ignore`
/// line. The file is written only when it changes.
///
/// Returns whether `.gitmodules` was modified.
///
/// # Errors
///
/// `ValidationError::InvalidGitPath` for a path that is blank or leaves
/// the repository, or any error reading or writing `.gitmodules`.
pub fn ensure_ignore_dirty(repo_root: &Path, rel_path: &str) -> Result<bool> {
    let rel = rel_path.trim();
    if repo_root.as_os_str().is_empty() {
        return Err(ValidationError::InvalidSubmodule("repo root required".into()).into());
    }
    validate_git_path(rel)?;
    let wanted = clean_path(Path::new(rel));
    let path = repo_root.join(".gitmodules");
    let mut doc = Dotenv::from_bytes(&read_scoped(&path)?)?;

    if !set_ignore_dirty(&mut doc, &wanted) {
        return Ok(false);
    }
    write_atomic(&path, &doc.to_bytes())?;
    debug!(path = %path.display(), submodule = %wanted.display(), "set ignore = dirty");
    Ok(true)
}

fn set_ignore_dirty(doc: &mut Dotenv, wanted: &Path) -> bool {
    let lines = doc.lines();
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_section_header(&l.text))
        .map(|(i, _)| i)
        .collect();

    for (n, &start) in headers.iter().enumerate() {
        let end = headers.get(n + 1).copied().unwrap_or(lines.len());
        let mut path_idx = None;
        let mut url_idx = None;
        let mut ignore_idx = None;
        let mut indent = "\t".to_string();

        for (i, line) in lines.iter().enumerate().take(end).skip(start + 1) {
            let text = line.text.as_str();
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            let body = text.trim_start_matches([' ', '\t']);
            if body.len() != text.len() {
                indent = text[..text.len() - body.len()].to_string();
            }
            match parse_kv(trimmed) {
                Some((key, value)) if key == "path" && clean_path(Path::new(value)).as_path() == wanted => {
                    path_idx = Some(i)
                }
                Some((key, _)) if key == "url" => url_idx = Some(i),
                Some((key, _)) if key == "ignore" => ignore_idx = Some(i),
                _ => {}
            }
        }

        let Some(path_idx) = path_idx else {
            continue;
        };

        if let Some(i) = ignore_idx {
            if matches!(parse_kv(lines[i].text.trim()), Some((_, "dirty"))) {
                return false;
            }
            let text = format!("{}{}", indent, IGNORE_DIRTY);
            return doc.replace_text(i, text);
        }

        let after = url_idx.unwrap_or(path_idx);
        let nl = doc.default_nl();
        doc.ensure_line_has_nl(after);
        doc.lines_mut()
            .insert(after + 1, RawLine::new(format!("{}{}", indent, IGNORE_DIRTY), nl));
        return true;
    }
    false
}
