//! Error types.
//!
//! Every failure belongs to one of three kinds (see [`ErrorKind`]) so callers
//! can branch on *not found* vs *invalid* vs *I/O* without matching messages.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of every [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected absence: missing identity, keyring entry, trust entry.
    NotFound,
    /// Validation, parse, or permission failure.
    Invalid,
    /// Filesystem, subprocess, or OS secret-store transport failure.
    Io,
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach a path to an I/O error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Invalid,
            Error::Cipher(e) => e.kind(),
            Error::Store(e) => e.kind(),
            Error::Config(e) => e.kind(),
            Error::Prompt(_) => ErrorKind::Io,
            Error::File { source, .. } | Error::Io(source) => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Io
                }
            }
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::NotFound`.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Input and file-policy validation failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid env key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid env name {name:?}: {reason}")]
    InvalidEnvName { name: String, reason: String },

    #[error("invalid git path {path:?}: {reason}")]
    InvalidGitPath { path: String, reason: String },

    #[error("invalid git ref {reference:?}: {reason}")]
    InvalidGitRef { reference: String, reason: String },

    #[error("invalid {name} {value:?}: {reason}")]
    InvalidAttribute {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid quoted value: {0}")]
    InvalidQuotedValue(String),

    #[error("vault env file is not valid UTF-8 (line {line})")]
    NotUtf8 { line: usize },

    #[error("refusing to {action} vault env file through symlink: {path} (set SI_VAULT_ALLOW_SYMLINK_ENV_FILE=1 to override)")]
    SymlinkRefused { action: &'static str, path: String },

    #[error("vault env symlink resolves to directory: {0}")]
    SymlinkToDirectory(String),

    #[error("insecure key file ({path}): symlinks are not allowed (set SI_VAULT_ALLOW_INSECURE_KEY_FILE=1 to override)")]
    KeyFileSymlink { path: String },

    #[error("insecure key file permissions ({path}): expected 0600, got {actual} (chmod 600 {path})")]
    InsecurePermissions { path: String, actual: String },

    #[error("invalid submodule path: {0}")]
    InvalidSubmodule(String),

    #[error("plaintext values in {file}: {keys}")]
    PlaintextValues { file: String, keys: String },

    #[error("{file} is not canonically formatted")]
    NotFormatted { file: String },

    #[error("{0} needs confirmation (pass --yes)")]
    ConfirmationRequired(&'static str),
}

/// Ciphertext codec failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("no recipients configured (missing \"# si-vault:recipient \" header lines)")]
    NoRecipients,

    #[error("invalid recipient {recipient:?}: {reason}")]
    InvalidRecipient { recipient: String, reason: String },

    #[error("value is not {expected} ciphertext")]
    NotCiphertext { expected: String },

    #[error("invalid ciphertext payload: {0}")]
    InvalidPayload(String),

    #[error("{0} requires a vault identity (set SI_VAULT_IDENTITY or configure vault.key_backend)")]
    IdentityRequired(&'static str),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

impl CipherError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Invalid
    }
}

/// Identity backend failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("vault identity not found: {0}")]
    NotFound(String),

    #[error("{source_name} identity invalid: {reason}")]
    InvalidIdentity { source_name: String, reason: String },

    #[error("unsupported key backend {0:?} (expected keyring or file)")]
    UnsupportedBackend(String),

    #[error("vault.key_file required for file backend")]
    KeyFileRequired,

    #[error("secure store not supported on this platform: {0}")]
    NotSupported(&'static str),

    #[error("{program} failed: {message}")]
    Command { program: String, message: String },

    #[error("unable to determine home directory")]
    NoHomeDir,
}

impl StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidIdentity { .. }
            | StoreError::UnsupportedBackend(_)
            | StoreError::KeyFileRequired => ErrorKind::Invalid,
            StoreError::NotSupported(_) | StoreError::Command { .. } | StoreError::NoHomeDir => {
                ErrorKind::Io
            }
        }
    }
}

/// Settings, target resolution, and persisted-state errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("vault env file not configured (pass --file or set vault.file)")]
    NotConfigured,

    #[error("no recipients found (expected \"# si-vault:recipient \" lines)")]
    NoRecipients,

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("git: {0}")]
    Git(String),

    #[error("key {0} not found")]
    KeyNotFound(String),

    #[error("vault trust not established for {file} (run `si-vault trust accept` after reviewing its recipients)")]
    TrustNotEstablished { file: String },

    #[error("recipients changed for {file}: trusted {trusted}, found {found} (run `si-vault trust accept` after review)")]
    Untrusted {
        file: String,
        trusted: String,
        found: String,
    },
}

impl ConfigError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Git(_) => ErrorKind::Io,
            ConfigError::KeyNotFound(_) | ConfigError::TrustNotEstablished { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Invalid,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
