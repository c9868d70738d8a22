//! Trust commands.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::trust::{TrustEntry, TrustStore};
use crate::error::Result;

pub fn status(ctx: &Context) -> Result<()> {
    let vault = ctx.open()?;
    let store = TrustStore::load(&ctx.trust_path()?)?;
    let (root, file) = Context::trust_key(&vault);
    let current = vault.fingerprint();

    output::kv("file:       ", &file);
    output::kv("repo root:  ", &root);
    output::kv("fingerprint:", &current);
    match store.find(&root, &file) {
        None => output::warn("not trusted"),
        Some(entry) if entry.fingerprint == current => {
            output::success(&format!("trusted since {}", entry.trusted_at));
        }
        Some(entry) => {
            output::warn(&format!("recipients changed (trusted {})", entry.fingerprint));
            output::hint(&format!("review, then run {}", output::cmd("si-vault trust accept")));
        }
    }
    Ok(())
}

/// Trust the file's current recipient set.
pub fn accept(ctx: &Context) -> Result<()> {
    let vault = ctx.open()?;
    let path = ctx.trust_path()?;
    let mut store = TrustStore::load(&path)?;
    let (root, file) = Context::trust_key(&vault);

    output::header("recipients");
    for r in vault.recipients() {
        output::list_item(&r);
    }
    store.upsert(TrustEntry::new(&root, &file, vault.fingerprint()));
    store.save(&path)?;
    ctx.audit("trust_accept", Some(vault.target()), &[]);
    output::success(&format!("trusted {}", output::path(vault.target().display_path())));
    Ok(())
}

pub fn forget(ctx: &Context) -> Result<()> {
    let target = ctx.target()?;
    let path = ctx.trust_path()?;
    let mut store = TrustStore::load(&path)?;
    let root = target.trust_root().display().to_string();
    let file = target.file.display().to_string();

    if !store.delete(&root, &file) {
        output::dimmed("no trust entry");
        return Ok(());
    }
    store.save(&path)?;
    ctx.audit("trust_forget", Some(&target), &[]);
    output::success(&format!("forgot trust for {}", output::path(target.display_path())));
    Ok(())
}
