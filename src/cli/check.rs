//! Format and check commands.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::format::format_vault_dotenv;
use crate::core::vault::{check_plaintext, scan_dotenv_encryption};
use crate::error::{Result, ValidationError};

/// Rewrite the file in canonical layout, or with `check` report whether it
/// already is.
pub fn fmt(ctx: &Context, check: bool) -> Result<()> {
    let mut vault = ctx.open()?;
    let (formatted, changed) = format_vault_dotenv(vault.doc())?;
    let shown = vault.target().display_path();

    if !changed {
        output::dimmed(&format!("{} already formatted", shown));
        return Ok(());
    }
    if check {
        return Err(ValidationError::NotFormatted { file: shown }.into());
    }
    *vault.doc_mut() = formatted;
    vault.save()?;
    ctx.audit("fmt", Some(vault.target()), &[]);
    output::success(&format!("formatted {}", output::path(shown)));
    Ok(())
}

/// Fail when any value is plaintext or any ciphertext is malformed.
pub fn execute(ctx: &Context) -> Result<()> {
    let vault = ctx.open()?;
    let shown = vault.target().display_path();
    let plaintext = check_plaintext(vault.doc())?;
    if !plaintext.is_empty() {
        return Err(ValidationError::PlaintextValues {
            file: shown,
            keys: plaintext.join(", "),
        }
        .into());
    }
    let scan = scan_dotenv_encryption(vault.doc())?;
    output::success(&format!(
        "{}: {} encrypted, {} empty",
        shown,
        scan.encrypted_keys().len(),
        scan.empty_keys().len()
    ));
    Ok(())
}
