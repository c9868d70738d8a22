//! Vault file target resolution.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::core::files::{clean_path, expand_home};
use crate::error::{ConfigError, Result};

/// A resolved vault envfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Absolute, cleaned path of the envfile.
    pub file: PathBuf,
    /// Enclosing git work tree, when there is one.
    pub repo_root: Option<PathBuf>,
    /// Whether the file was named explicitly rather than taken from settings.
    pub explicit: bool,
}

impl Target {
    /// Repository root used as the trust-store key; `.` outside a repo.
    pub fn trust_root(&self) -> PathBuf {
        self.repo_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// The file relative to the repo root, or the absolute path outside one.
    pub fn display_path(&self) -> String {
        self.repo_root
            .as_deref()
            .and_then(|root| self.file.strip_prefix(root).ok())
            .unwrap_or(&self.file)
            .display()
            .to_string()
    }
}

/// Resolve the envfile from an explicit path or the configured default.
///
/// Relative paths are taken from `cwd`; `~` expands to the home directory.
/// The repo root is looked up from the file's directory and is absent when
/// that directory is not inside a git work tree.
///
/// # Errors
///
/// `ConfigError::NotConfigured` when neither path is given.
pub fn resolve_target(cwd: &Path, file: Option<&str>, default_file: Option<&str>) -> Result<Target> {
    let explicit = file.map(str::trim).filter(|f| !f.is_empty());
    let fallback = default_file.map(str::trim).filter(|f| !f.is_empty());
    let (raw, is_explicit) = match (explicit, fallback) {
        (Some(f), _) => (f, true),
        (None, Some(f)) => (f, false),
        (None, None) => return Err(ConfigError::NotConfigured.into()),
    };

    let expanded = expand_home(raw)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    let file = clean_path(&absolute);

    let dir = file.parent().unwrap_or(cwd);
    let search = if dir.is_dir() { dir } else { cwd };
    let repo_root = git_root(search).ok();

    debug!(file = %file.display(), repo_root = ?repo_root, explicit = is_explicit, "resolved vault target");
    Ok(Target {
        file,
        repo_root,
        explicit: is_explicit,
    })
}

/// Top of the git work tree containing `dir`.
///
/// # Errors
///
/// `ConfigError::Git` when git is not installed or `dir` is not inside a
/// work tree.
pub fn git_root(dir: &Path) -> Result<PathBuf> {
    if which::which("git").is_err() {
        return Err(ConfigError::Git("git not found in PATH".to_string()).into());
    }
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(ConfigError::Git(format!(
            "git root not found for {} (run inside a git repo)",
            dir.display()
        ))
        .into());
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        return Err(ConfigError::Git("git root not found".to_string()).into());
    }
    Ok(clean_path(Path::new(&root)))
}
