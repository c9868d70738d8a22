//! Filesystem-based identity storage.
//!
//! The key file holds one `AGE-SECRET-KEY-` line. Reads require the file
//! to be a regular file with no group/other permission bits; writes go
//! through a 0600 temp file under a 0700 directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::Store;
use crate::core::constants::{ENV_ALLOW_INSECURE_KEY_FILE, IDENTITY_PREFIX};
use crate::core::domain::{Identity, IdentitySource};
use crate::core::files::{self, clean_path, PRIVATE_FILE_MODE};
use crate::error::{Error, Result, StoreError, ValidationError};

/// Identity stored in a key file.
pub struct Filesystem {
    path: PathBuf,
}

impl Filesystem {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: clean_path(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for Filesystem {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self) -> Result<Identity> {
        read_identity_file(
            &self.path,
            IdentitySource::File {
                path: self.path.clone(),
            },
        )
    }

    fn save(&self, identity: &Identity) -> Result<()> {
        let secret = identity.secret();
        let mut contents = Zeroizing::new(Vec::with_capacity(secret.len() + 1));
        contents.extend_from_slice(secret.as_bytes());
        contents.push(b'\n');
        files::write_atomic_mode(&self.path, &contents, "age-identity-", PRIVATE_FILE_MODE)?;
        debug!(path = %self.path.display(), "identity saved");
        Ok(())
    }
}

/// Load the first identity line from a key file.
///
/// # Errors
///
/// * `StoreError::NotFound` when the file does not exist
/// * `ValidationError::KeyFileSymlink` / `InsecurePermissions` from the
///   permission check
/// * `StoreError::InvalidIdentity` when no line parses
pub(crate) fn read_identity_file(path: &Path, source: IdentitySource) -> Result<Identity> {
    let path = clean_path(path);
    debug!(path = %path.display(), "loading identity file");

    ensure_secure_key_file(&path)?;

    let contents = match fs::read_to_string(&path) {
        Ok(s) => Zeroizing::new(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.display().to_string()).into());
        }
        Err(e) => return Err(Error::file(&path, e)),
    };

    let line = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .find(|l| l.starts_with(IDENTITY_PREFIX))
        .ok_or_else(|| StoreError::InvalidIdentity {
            source_name: path.display().to_string(),
            reason: format!("no {} line found", IDENTITY_PREFIX),
        })?;

    Identity::parse(line, source)
}

/// Refuse symlinked or group/other-accessible key files.
///
/// Skipped, with a warning, when `SI_VAULT_ALLOW_INSECURE_KEY_FILE` is
/// truthy. A missing file is reported as not found.
pub fn ensure_secure_key_file(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.display().to_string()).into());
        }
        Err(e) => return Err(Error::file(path, e)),
    };

    if files::is_truthy_env(ENV_ALLOW_INSECURE_KEY_FILE) {
        warn!(path = %path.display(), "key file permission checks disabled");
        return Ok(());
    }

    if meta.file_type().is_symlink() {
        return Err(ValidationError::KeyFileSymlink {
            path: path.display().to_string(),
        }
        .into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            return Err(ValidationError::InsecurePermissions {
                path: path.display().to_string(),
                actual: format!("{:04o}", mode),
            }
            .into());
        }
    }

    Ok(())
}
