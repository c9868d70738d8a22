//! Identity storage.
//!
//! An identity is resolved in this order:
//!
//! 1. `SI_VAULT_IDENTITY`, then `SI_VAULT_PRIVATE_KEY` (inline secret)
//! 2. `SI_VAULT_IDENTITY_FILE` (path, `~` expanded)
//! 3. The configured backend ([`Keyring`] or [`Filesystem`])
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait
//! 2. Add a [`Backend`] variant and select it in [`KeyConfig::store`]

use tracing::{debug, info};

use crate::core::constants::{ENV_IDENTITY, ENV_IDENTITY_FILE};
use crate::core::domain::{Identity, IdentitySource};
use crate::core::files::expand_home;
use crate::error::Result;

mod backend;
mod fs;
pub mod keyring;

pub use backend::{Backend, KeyConfig};
pub use fs::{ensure_secure_key_file, Filesystem};
pub use keyring::{platform_service, Keyring, SecretService, SecretTool, SecurityCli, Unsupported};

/// Identity storage trait.
pub trait Store {
    /// Load the stored identity.
    ///
    /// # Errors
    ///
    /// Returns an error of kind `NotFound` when nothing is stored, and
    /// `Invalid` when the stored value does not parse.
    fn load(&self) -> Result<Identity>;

    /// Store `identity`, replacing any previous one.
    fn save(&self, identity: &Identity) -> Result<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Identity from the environment overrides, if any is set.
///
/// # Errors
///
/// An inline value that does not parse fails as invalid; it never falls
/// through to the next source.
pub fn load_from_env() -> Result<Option<Identity>> {
    for var in ENV_IDENTITY {
        let Ok(value) = std::env::var(var) else {
            continue;
        };
        let value = zeroize::Zeroizing::new(value);
        if value.trim().is_empty() {
            continue;
        }
        debug!(var, "using identity from environment");
        let source = IdentitySource::Env {
            var: (*var).to_string(),
        };
        return Identity::parse(&value, source).map(Some);
    }

    if let Ok(raw) = std::env::var(ENV_IDENTITY_FILE) {
        if !raw.trim().is_empty() {
            let path = expand_home(&raw)?;
            debug!(path = %path.display(), "using identity file from environment");
            let source = IdentitySource::EnvFile { path: path.clone() };
            return fs::read_identity_file(&path, source).map(Some);
        }
    }

    Ok(None)
}

/// Load the identity.
///
/// With the keyring backend, a missing keyring entry falls back to the
/// configured key file when that file exists.
///
/// # Errors
///
/// Kind `NotFound` when no source has an identity; `Invalid` for a value
/// that fails to parse or a key file that fails the permission check.
pub fn load_identity(cfg: &KeyConfig) -> Result<Identity> {
    if let Some(identity) = load_from_env()? {
        return Ok(identity);
    }

    let store = cfg.store()?;
    match store.load() {
        Err(e) if e.is_not_found() && cfg.backend == Backend::Keyring => {
            match cfg.key_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "keyring empty, using key file");
                    Filesystem::new(path).load()
                }
                None => Err(e),
            }
        }
        other => other,
    }
}

/// Load the identity, generating and storing one only when none exists.
///
/// Returns the identity and whether it was created. An identity that
/// exists but cannot be read is an error, never a reason to generate.
pub fn ensure_identity(cfg: &KeyConfig) -> Result<(Identity, bool)> {
    match load_identity(cfg) {
        Ok(identity) => Ok((identity, false)),
        Err(e) if e.is_not_found() => {
            let store = cfg.store()?;
            let identity = generate_into(store.as_ref())?;
            Ok((identity, true))
        }
        Err(e) => Err(e),
    }
}

/// [`ensure_identity`] against an explicit store, ignoring the environment.
pub fn ensure_in(store: &dyn Store) -> Result<(Identity, bool)> {
    match store.load() {
        Ok(identity) => Ok((identity, false)),
        Err(e) if e.is_not_found() => Ok((generate_into(store)?, true)),
        Err(e) => Err(e),
    }
}

/// Generate a new identity and store it, replacing the previous one.
pub fn rotate_identity(cfg: &KeyConfig) -> Result<Identity> {
    let store = cfg.store()?;
    generate_into(store.as_ref())
}

fn generate_into(store: &dyn Store) -> Result<Identity> {
    let identity = Identity::generate();
    store.save(&identity)?;
    info!(backend = store.name(), recipient = %identity.recipient(), "generated vault identity");
    // Re-read so the returned identity carries its stored source.
    store.load()
}
