//! Secure file I/O.
//!
//! Envfile reads go through the file's parent directory and refuse symlinks
//! unless `SI_VAULT_ALLOW_SYMLINK_ENV_FILE` is truthy. Writes land in a
//! same-directory temp file that is renamed over the destination, so a
//! reader never observes a partial file.

use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::core::constants::ENV_ALLOW_SYMLINK;
use crate::error::{Error, Result, StoreError, ValidationError};

/// Mode for newly created envfiles.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode for directories created to hold vault state.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Mode for identity files, trust stores, and audit logs.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Whether an environment variable holds a truthy token
/// (`1`, `true`, `yes`, `on`; case-insensitive, whitespace-trimmed).
pub fn is_truthy_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Lexically clean a path: drop `.` components, fold `name/..`, and keep
/// leading `..` on relative paths. An empty result becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    let path = path.trim();
    if path == "~" {
        return dirs::home_dir().ok_or_else(|| StoreError::NoHomeDir.into());
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Read a vault envfile.
///
/// The parent directory is resolved first and the base name is opened
/// beneath it; the opened handle must be the same regular file that was
/// inspected. A symlink at `path` is refused unless the override is set,
/// in which case its (non-directory) target is read instead.
///
/// # Errors
///
/// Returns `ValidationError::SymlinkRefused` for a symlink without the
/// override, or `Error::File` wrapping the underlying I/O error.
pub fn read_scoped(path: &Path) -> Result<Vec<u8>> {
    let path = clean_path(path);
    let meta = fs::symlink_metadata(&path).map_err(|e| Error::file(&path, e))?;
    if meta.file_type().is_symlink() {
        if !is_truthy_env(ENV_ALLOW_SYMLINK) {
            return Err(ValidationError::SymlinkRefused {
                action: "read",
                path: path.display().to_string(),
            }
            .into());
        }
        let resolved = resolve_symlink(&path)?;
        warn!(path = %path.display(), target = %resolved.display(), "reading vault env file through symlink");
        return read_beneath_parent(&resolved);
    }
    read_beneath_parent(&path)
}

fn read_beneath_parent(path: &Path) -> Result<Vec<u8>> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::file(path, invalid_input("path has no file name")))?;
    let parent = parent_dir(path);
    let root = fs::canonicalize(parent).map_err(|e| Error::file(parent, e))?;
    let scoped = root.join(name);

    let before = fs::symlink_metadata(&scoped).map_err(|e| Error::file(&scoped, e))?;
    if before.file_type().is_symlink() {
        return Err(ValidationError::SymlinkRefused {
            action: "read",
            path: scoped.display().to_string(),
        }
        .into());
    }

    let mut file = fs::File::open(&scoped).map_err(|e| Error::file(&scoped, e))?;
    let opened = file.metadata().map_err(|e| Error::file(&scoped, e))?;
    if !same_file(&before, &opened) {
        return Err(Error::file(
            &scoped,
            std::io::Error::new(std::io::ErrorKind::Other, "file changed while opening"),
        ));
    }

    let mut data = Vec::with_capacity(opened.len() as usize);
    file.read_to_end(&mut data)
        .map_err(|e| Error::file(&scoped, e))?;
    debug!(path = %scoped.display(), bytes = data.len(), "read scoped");
    Ok(data)
}

#[cfg(unix)]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    a.len() == b.len() && a.is_file() == b.is_file()
}

/// Resolve where a write to `path` should land, applying the symlink policy.
///
/// A missing path is written as-is. A symlink is refused unless the
/// override is truthy; with it, the resolved non-directory target is used.
pub fn resolve_write_target(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(Error::file(path, e)),
        Ok(meta) if meta.file_type().is_symlink() => {
            if !is_truthy_env(ENV_ALLOW_SYMLINK) {
                return Err(ValidationError::SymlinkRefused {
                    action: "write",
                    path: path.display().to_string(),
                }
                .into());
            }
            let resolved = resolve_symlink(path)?;
            warn!(path = %path.display(), target = %resolved.display(), "writing vault env file through symlink");
            Ok(resolved)
        }
        Ok(_) => Ok(path.to_path_buf()),
    }
}

fn resolve_symlink(path: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(path).map_err(|e| Error::file(path, e))?;
    let meta = fs::metadata(&resolved).map_err(|e| Error::file(&resolved, e))?;
    if meta.is_dir() {
        return Err(ValidationError::SymlinkToDirectory(resolved.display().to_string()).into());
    }
    Ok(clean_path(&resolved))
}

/// Atomically replace a vault envfile.
///
/// Keeps the existing file's permission bits (0644 for a new file) and
/// creates a missing parent directory with mode 0700.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let path = clean_path(path);
    let target = resolve_write_target(&path)?;
    let mode = existing_mode(&target).unwrap_or(DEFAULT_FILE_MODE);
    write_atomic_mode(&target, contents, ".env.tmp-", mode)
}

/// Atomically write `contents` to `path` with an explicit mode, using a
/// temp file named `<prefix>*` in the same directory.
///
/// No symlink policy is applied: the rename replaces whatever entry sits
/// at `path`.
pub fn write_atomic_mode(path: &Path, contents: &[u8], prefix: &str, mode: u32) -> Result<()> {
    let dir = parent_dir(path);
    create_private_dir(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile_in(dir)
        .map_err(|e| Error::file(dir, e))?;
    set_mode(tmp.path(), mode)?;
    tmp.write_all(contents)
        .map_err(|e| Error::file(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::file(tmp.path(), e))?;
    // Re-apply in case the umask interfered.
    set_mode(tmp.path(), mode)?;
    tmp.persist(path)
        .map_err(|e| Error::file(path, e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), mode = format!("{:o}", mode), "wrote atomically");
    Ok(())
}

/// Create `dir` (and parents) with mode 0700 if missing.
pub fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_DIR_MODE);
    }
    builder.create(dir).map_err(|e| Error::file(dir, e))
}

/// Permission bits of an existing file.
pub fn existing_mode(path: &Path) -> Option<u32> {
    let meta = fs::metadata(path).ok()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        None
    }
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| Error::file(path, e))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn invalid_input(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string())
}
