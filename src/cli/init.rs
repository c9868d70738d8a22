//! Init command.
//!
//! Makes sure an identity exists, then declares it as a recipient of the
//! vault file. The resulting recipient set is trusted, since the caller
//! just chose it.

use tracing::info;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::header;
use crate::core::store;
use crate::core::trust::{TrustEntry, TrustStore};
use crate::error::Result;

pub fn execute(ctx: &Context) -> Result<()> {
    let (identity, created) = store::ensure_identity(&ctx.key_config()?)?;
    if created {
        output::success(&format!("generated identity ({})", identity.source()));
    }
    let recipient = identity.recipient();

    let mut vault = ctx.open_or_empty()?;
    let changed = header::ensure_header(vault.doc_mut(), &[recipient.as_str()]);
    if changed {
        vault.save()?;
        info!(file = %vault.target().file.display(), "vault header written");
    }

    let trust_path = ctx.trust_path()?;
    let mut trust = TrustStore::load(&trust_path)?;
    let (root, file) = Context::trust_key(&vault);
    trust.upsert(TrustEntry::new(root, file, vault.fingerprint()));
    trust.save(&trust_path)?;

    if changed {
        ctx.audit("init", Some(vault.target()), &[]);
        output::success(&format!("initialized {}", output::path(vault.target().display_path())));
    } else {
        output::dimmed("already initialized");
    }
    output::kv("recipient:", &recipient);
    output::kv("file:     ", vault.target().file.display());
    Ok(())
}
