//! Encrypt and decrypt commands.

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::dotenv::render_value;
use crate::core::vault::{decrypt_dotenv_keys, decrypt_env, encrypt_dotenv_values};
use crate::error::{ConfigError, Result};

/// Encrypt plaintext values in place.
///
/// An identity is only needed for `--reencrypt`.
pub fn encrypt(ctx: &Context, reencrypt: bool) -> Result<()> {
    let mut vault = ctx.open()?;
    let identity = if reencrypt {
        ctx.verify_trust(&vault)?;
        Some(ctx.identity()?)
    } else {
        None
    };

    let result = encrypt_dotenv_values(vault.doc_mut(), identity.as_ref(), reencrypt)?;
    if !result.changed {
        output::dimmed("nothing to encrypt");
        return Ok(());
    }
    vault.save()?;

    let mut keys = result.encrypted_keys.clone();
    keys.extend(result.reencrypted_keys.iter().cloned());
    ctx.audit("encrypt", Some(vault.target()), &keys);

    output::success(&format!(
        "encrypted {} values in {}",
        result.encrypted_keys.len(),
        output::path(vault.target().display_path())
    ));
    if !result.reencrypted_keys.is_empty() {
        output::kv("re-encrypted:", result.reencrypted_keys.len());
    }
    Ok(())
}

/// Decrypt values to stdout as `KEY=value` lines, or in place.
///
/// Refuses when the file's recipients differ from the trusted set.
pub fn decrypt(ctx: &Context, keys: &[String], in_place: bool) -> Result<()> {
    let mut vault = ctx.open()?;
    ctx.verify_trust(&vault)?;
    let identity = ctx.identity()?;

    if in_place {
        let result = decrypt_dotenv_keys(vault.doc_mut(), Some(&identity), keys)?;
        for key in &result.missing_keys {
            output::warn(&format!("{} not found", key));
        }
        if result.changed {
            vault.save()?;
            ctx.audit("decrypt", Some(vault.target()), &result.decrypted_keys);
            output::success(&format!("decrypted {} values", result.decrypted_keys.len()));
            output::hint(&format!("run {} before committing", output::cmd("si-vault encrypt")));
        } else {
            output::dimmed("nothing to decrypt");
        }
        return Ok(());
    }

    let result = decrypt_env(vault.doc(), Some(&identity))?;
    let order = vault.doc().keys();
    let wanted: Vec<&str> = if keys.is_empty() {
        order.iter().map(String::as_str).collect()
    } else {
        keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty()).collect()
    };
    for key in wanted {
        let Some(value) = result.values.get(key) else {
            return Err(ConfigError::KeyNotFound(key.to_string()).into());
        };
        output::data(&format!("{}={}", key, render_value(value)));
    }
    Ok(())
}
