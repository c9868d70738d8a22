//! Value commands (set, unset, get, list).

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;
use zeroize::Zeroizing;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::dotenv::{normalize_value, SetOptions};
use crate::core::header;
use crate::core::vault::scan_dotenv_encryption;
use crate::error::{ConfigError, Result};

/// Value from the argument, piped stdin, or a hidden prompt.
fn read_value(key: &str, value: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(value) = value {
        return Ok(Zeroizing::new(value));
    }
    if !io::stdin().is_terminal() {
        let mut input = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut input)?;
        let trimmed = input.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }
    let value = Password::new()
        .with_prompt(format!("Value for {}", output::key(key)))
        .allow_empty_password(true)
        .interact()?;
    Ok(Zeroizing::new(value))
}

/// Set a value, encrypting it when the file declares recipients.
///
/// Encrypting requires the file's recipients to be trusted, so a rewritten
/// header cannot redirect new values to someone else's key.
pub fn set(ctx: &Context, key: &str, value: Option<String>, section: Option<String>, plain: bool) -> Result<()> {
    let value = read_value(key, value)?;
    let mut vault = ctx.open_or_empty()?;
    let plain = plain || !header::has_header(vault.doc());
    let opts = SetOptions { section };
    if !plain {
        ctx.verify_trust(&vault)?;
    }

    if !vault.set(key, &value, &opts, plain)? {
        output::dimmed(&format!("{} unchanged", key));
        return Ok(());
    }
    vault.save()?;
    ctx.audit("set", Some(vault.target()), &[key.to_string()]);

    let how = if plain { "plaintext" } else { "encrypted" };
    output::success(&format!("set {} ({})", output::key(key), how));
    Ok(())
}

pub fn unset(ctx: &Context, key: &str) -> Result<()> {
    let mut vault = ctx.open()?;
    if !vault.unset(key)? {
        output::dimmed(&format!("{} not set", key));
        return Ok(());
    }
    vault.save()?;
    ctx.audit("unset", Some(vault.target()), &[key.to_string()]);
    output::success(&format!("removed {}", output::key(key)));
    Ok(())
}

/// Print a value. Ciphertext is printed as stored unless `reveal`.
pub fn get(ctx: &Context, key: &str, reveal: bool) -> Result<()> {
    let vault = ctx.open()?;
    let Some(raw) = vault.doc().lookup(key) else {
        return Err(ConfigError::KeyNotFound(key.to_string()).into());
    };
    if !reveal {
        output::data(&normalize_value(&raw)?);
        return Ok(());
    }

    ctx.verify_trust(&vault)?;
    let identity = ctx.identity()?;
    if let Some(value) = vault.get(key, Some(&identity))? {
        output::data(&value);
    }
    Ok(())
}

/// List keys with their classification.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let vault = ctx.open()?;
    let scan = scan_dotenv_encryption(vault.doc())?;

    if json {
        let out = serde_json::json!({
            "file": vault.target().file.display().to_string(),
            "count": scan.entries.len(),
            "entries": &scan.entries,
        });
        output::data(&serde_json::to_string_pretty(&out).map_err(ConfigError::Serialize)?);
        return Ok(());
    }

    if scan.entries.is_empty() {
        output::dimmed("no keys");
        return Ok(());
    }
    output::section(&format!(
        "{} ({} keys)",
        vault.target().display_path(),
        scan.entries.len()
    ));
    for entry in &scan.entries {
        output::list_item(&format!("{:<32} {}", entry.key, entry.class));
    }
    Ok(())
}
