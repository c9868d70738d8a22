//! Keygen command.

use std::io::{self, IsTerminal};

use dialoguer::Confirm;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::store;
use crate::error::{Result, ValidationError};

/// Create the identity if missing, or replace it with `rotate`.
///
/// Rotation asks first unless `yes`; without a terminal it requires `yes`.
pub fn execute(ctx: &Context, rotate: bool, yes: bool) -> Result<()> {
    let cfg = ctx.key_config()?;

    if !rotate {
        let (identity, created) = store::ensure_identity(&cfg)?;
        if created {
            ctx.audit("keygen", None, &[]);
            output::success(&format!("generated identity ({})", identity.source()));
        } else {
            output::dimmed(&format!("identity exists ({})", identity.source()));
        }
        output::data(&identity.recipient());
        return Ok(());
    }

    if !yes {
        if !io::stdin().is_terminal() {
            return Err(ValidationError::ConfirmationRequired("identity rotation").into());
        }
        output::warn(&format!("rotating replaces the {} identity", cfg.backend));
        output::warn("values encrypted only to the old key become unreadable");
        let confirmed = Confirm::new()
            .with_prompt("Rotate identity?")
            .default(false)
            .interact()?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    let identity = store::rotate_identity(&cfg)?;
    ctx.audit("keygen_rotate", None, &[]);
    output::success(&format!("rotated identity ({})", identity.source()));
    output::data(&identity.recipient());
    output::hint(&format!(
        "add the new recipient with {} and re-encrypt",
        output::cmd("si-vault recipients add")
    ));
    Ok(())
}
