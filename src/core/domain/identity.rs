//! Identity type.
//!
//! Wraps an age private key together with where it was loaded from.

use std::fmt;
use std::path::PathBuf;

use age::secrecy::ExposeSecret;
use age::x25519;
use zeroize::Zeroizing;

use crate::error::{Result, StoreError};

/// Where an identity came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Inline in an environment variable.
    Env { var: String },
    /// File named by `SI_VAULT_IDENTITY_FILE`.
    EnvFile { path: PathBuf },
    /// OS secret store entry.
    Keyring { service: String, account: String },
    /// Configured key file.
    File { path: PathBuf },
    /// Freshly generated, not yet stored.
    Generated,
}

impl IdentitySource {
    /// Short label used in error messages.
    pub fn label(&self) -> String {
        match self {
            IdentitySource::Env { var } => var.clone(),
            IdentitySource::EnvFile { path } | IdentitySource::File { path } => {
                path.display().to_string()
            }
            IdentitySource::Keyring { .. } => "keyring".to_string(),
            IdentitySource::Generated => "generated".to_string(),
        }
    }
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentitySource::Env { var } => write!(f, "env ({})", var),
            IdentitySource::EnvFile { path } => write!(f, "env file ({})", path.display()),
            IdentitySource::Keyring { service, account } => {
                write!(f, "keyring ({}/{})", service, account)
            }
            IdentitySource::File { path } => write!(f, "file ({})", path.display()),
            IdentitySource::Generated => f.write_str("generated"),
        }
    }
}

/// A private key identity for decrypting vault values
pub struct Identity {
    inner: x25519::Identity,
    source: IdentitySource,
}

impl Identity {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        Self::from_parts(x25519::Identity::generate(), IdentitySource::Generated)
    }

    /// Parse a serialized identity (`AGE-SECRET-KEY-1...`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` naming the source when the text
    /// is not a valid x25519 identity.
    pub fn parse(secret: &str, source: IdentitySource) -> Result<Self> {
        let inner = secret
            .trim()
            .parse::<x25519::Identity>()
            .map_err(|e: &str| StoreError::InvalidIdentity {
                source_name: source.label(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_parts(inner, source))
    }

    pub fn from_parts(inner: x25519::Identity, source: IdentitySource) -> Self {
        Self { inner, source }
    }

    /// Public recipient (`age1...`) derived from this identity.
    pub fn recipient(&self) -> String {
        self.inner.to_public().to_string()
    }

    /// Reference to the inner age identity for decryption
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }

    pub fn source(&self) -> &IdentitySource {
        &self.source
    }

    /// Same key, relabeled after it has been stored somewhere.
    pub fn with_source(self, source: IdentitySource) -> Self {
        Self {
            inner: self.inner,
            source,
        }
    }

    /// Serialized secret, wiped on drop.
    pub(crate) fn secret(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string().expose_secret().to_string())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("source", &self.source)
            .field("recipient", &self.recipient())
            .finish()
    }
}
