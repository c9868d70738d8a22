//! Recipient management commands.
//!
//! Changing recipients from here also moves the trust entry to the new set:
//! the caller made the change, so there is nothing left to review.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::header;
use crate::core::recipient::parse_recipient;
use crate::core::trust::{TrustEntry, TrustStore};
use crate::core::vault::VaultFile;
use crate::error::Result;

pub fn list(ctx: &Context) -> Result<()> {
    let vault = ctx.open()?;
    let recipients = vault.recipients();
    if recipients.is_empty() {
        output::dimmed("no recipients");
        return Ok(());
    }
    output::header(&format!("{} recipients", recipients.len()));
    for r in &recipients {
        output::list_item(r);
    }
    output::kv("fingerprint:", vault.fingerprint());
    Ok(())
}

fn retrust(ctx: &Context, vault: &VaultFile) -> Result<()> {
    let path = ctx.trust_path()?;
    let mut store = TrustStore::load(&path)?;
    let (root, file) = Context::trust_key(vault);
    store.upsert(TrustEntry::new(root, file, vault.fingerprint()));
    store.save(&path)
}

pub fn add(ctx: &Context, recipient: &str) -> Result<()> {
    let recipient = recipient.trim();
    parse_recipient(recipient)?;

    let mut vault = ctx.open_or_empty()?;
    if !header::ensure_header(vault.doc_mut(), &[recipient]) {
        output::dimmed("recipient already present");
        return Ok(());
    }
    vault.save()?;
    retrust(ctx, &vault)?;
    ctx.audit("recipients_add", Some(vault.target()), &[]);

    output::success(&format!("added recipient {}", recipient));
    output::hint(&format!(
        "run {} so existing values can be read by it",
        output::cmd("si-vault encrypt --reencrypt")
    ));
    Ok(())
}

pub fn remove(ctx: &Context, recipient: &str) -> Result<()> {
    let mut vault = ctx.open()?;
    if !header::remove_recipient(vault.doc_mut(), recipient) {
        output::dimmed("recipient not present");
        return Ok(());
    }
    vault.save()?;
    retrust(ctx, &vault)?;
    ctx.audit("recipients_remove", Some(vault.target()), &[]);

    output::success(&format!("removed recipient {}", recipient.trim()));
    output::hint(&format!(
        "run {} to revoke its access to existing values",
        output::cmd("si-vault encrypt --reencrypt")
    ));
    Ok(())
}
