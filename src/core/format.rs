//! Canonical vault envfile formatting.

use tracing::debug;

use crate::core::constants::{HEADER_VERSION_LINE, RECIPIENT_LINE_PREFIX};
use crate::core::dotenv::{
    is_divider_line, parse_assignment, render_assignment, section_header_name, Dotenv, RawLine,
};
use crate::core::header::{is_header_line, parse_recipients};
use crate::error::{ConfigError, Result};

/// Rewrite a vault envfile into canonical form.
///
/// The output starts with the version line, one line per recipient, and a
/// blank line. In the body, assignments become `KEY=value` with inline
/// comments as ` # text`, comment lines become `# text`, runs of blank
/// lines collapse to one, and section headers get a blank line above them
/// unless a divider sits there. Section headers, dividers, and unknown lines
/// keep their text.
///
/// Returns the formatted document and whether it differs from the input.
///
/// # Errors
///
/// Returns `ConfigError::NoRecipients` when the file declares none.
pub fn format_vault_dotenv(input: &Dotenv) -> Result<(Dotenv, bool)> {
    let recipients = parse_recipients(input);
    if recipients.is_empty() {
        return Err(ConfigError::NoRecipients.into());
    }
    let nl = input.default_nl();
    let mut out: Vec<RawLine> = Vec::with_capacity(input.lines().len() + recipients.len() + 2);

    out.push(RawLine::new(HEADER_VERSION_LINE, nl));
    for r in &recipients {
        out.push(RawLine::new(format!("{}{}", RECIPIENT_LINE_PREFIX, r), nl));
    }
    out.push(RawLine::new("", nl));

    let body = input
        .lines()
        .iter()
        .filter(|l| !is_header_line(&l.text))
        .skip_while(|l| l.is_blank());

    let last_is_blank = |out: &[RawLine]| out.last().map_or(true, RawLine::is_blank);
    let mut pending_blank = false;
    for line in body {
        let text = line.text.as_str();
        if line.is_blank() {
            pending_blank = true;
            continue;
        }

        if section_header_name(text).is_some() {
            if let Some(last) = out.last() {
                if !last.is_blank() && !is_divider_line(&last.text) {
                    out.push(RawLine::new("", nl));
                }
            }
            out.push(RawLine::new(text, nl));
            pending_blank = false;
            continue;
        }

        if pending_blank {
            if !last_is_blank(&out) {
                out.push(RawLine::new("", nl));
            }
            pending_blank = false;
        }

        if is_divider_line(text) {
            out.push(RawLine::new(text, nl));
        } else if let Some(assign) = parse_assignment(text) {
            let comment = normalize_inline_comment(&assign.comment);
            out.push(RawLine::new(
                render_assignment("", assign.export, &assign.key, assign.value_raw.trim(), &comment),
                nl,
            ));
        } else if text.trim_start().starts_with('#') {
            out.push(RawLine::new(normalize_comment_line(text), nl));
        } else {
            out.push(RawLine::new(text, nl));
        }
    }

    if let Some(last) = out.last_mut() {
        last.nl = nl;
    }

    let formatted = Dotenv::from_lines(out, nl);
    let changed = formatted.render() != input.render();
    debug!(changed, recipients = recipients.len(), "formatted vault dotenv");
    Ok((formatted, changed))
}

fn normalize_comment_line(line: &str) -> String {
    let trimmed = line.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if body.is_empty() {
        "#".to_string()
    } else {
        format!("# {}", body)
    }
}

fn normalize_inline_comment(comment: &str) -> String {
    let trimmed = comment.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(" # {}", body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(input: &str) -> (String, bool) {
        let (doc, changed) = format_vault_dotenv(&Dotenv::parse(input)).unwrap();
        (doc.render(), changed)
    }

    #[test]
    fn test_requires_recipients() {
        let err = format_vault_dotenv(&Dotenv::parse("A=1\n")).unwrap_err();
        assert!(err.to_string().contains("no recipients"));
    }

    #[test]
    fn test_normalizes_body() {
        let input = "# si-vault:recipient r1\nA = 1   #  note\n\n\n\n#comment\nexport  B= two\n";
        let (out, changed) = fmt(input);
        assert!(changed);
        assert_eq!(
            out,
            "# si-vault:v1\n# si-vault:recipient r1\n\nA=1 # note\n\n# comment\nexport B=two\n"
        );
    }

    #[test]
    fn test_canonical_input_is_stable() {
        let divider = format!("# {}", "-".repeat(78));
        let input = format!(
            "# si-vault:v1\n# si-vault:recipient r1\n\nA=1\n\n{divider}\n# [stripe]\nKEY=x # c\n"
        );
        let (out, changed) = fmt(&input);
        assert!(!changed);
        assert_eq!(out, input);
        let (again, changed) = fmt(&out);
        assert!(!changed);
        assert_eq!(again, out);
    }

    #[test]
    fn test_section_header_gets_blank_unless_divider() {
        let (out, _) = fmt("# si-vault:recipient r\nA=1\n# [db]\nB=2\n");
        assert_eq!(out, "# si-vault:v1\n# si-vault:recipient r\n\nA=1\n\n# [db]\nB=2\n");
    }

    #[test]
    fn test_keeps_section_and_divider_text() {
        let (out, _) = fmt("# si-vault:recipient r\n#   ----------\n#[DB]\nweird line\n");
        assert_eq!(out, "# si-vault:v1\n# si-vault:recipient r\n\n#   ----------\n#[DB]\nweird line\n");
    }

    #[test]
    fn test_adds_trailing_newline_and_keeps_crlf() {
        let (out, _) = fmt("# si-vault:recipient r\r\nA=1");
        assert_eq!(out, "# si-vault:v1\r\n# si-vault:recipient r\r\n\r\nA=1\r\n");
    }

    #[test]
    fn test_comment_normalization() {
        assert_eq!(normalize_comment_line("#"), "#");
        assert_eq!(normalize_comment_line("   #    spaced   "), "# spaced");
        assert_eq!(normalize_comment_line("##double"), "# #double");
        assert_eq!(normalize_inline_comment("   #   x  "), " # x");
        assert_eq!(normalize_inline_comment("  # "), "");
    }
}
