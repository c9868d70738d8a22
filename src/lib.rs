//! si-vault - encrypted dotenv files with inline recipients.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface (thin caller of core)
//! └── core/             # Library
//!     ├── dotenv/       # Lossless line-model parser, value normalize/render
//!     ├── format        # Canonical vault file formatter
//!     ├── validation    # Key, env-name, git path/ref, attribute checks
//!     ├── files         # Scoped reads, atomic writes, symlink policy
//!     ├── cipher/       # Age-backed ciphertext codec
//!     ├── recipient     # Recipient parsing and fingerprints
//!     ├── header        # `# si-vault:` header directives
//!     ├── domain/       # Identity, entries
//!     ├── store/        # Identity backends (env, file, OS secret store)
//!     ├── vault/        # Encrypt, decrypt, scan over a document
//!     ├── trust         # Recipient-fingerprint trust store
//!     ├── audit         # Append-only JSON-lines audit log
//!     ├── target        # Envfile/repo-root resolution
//!     ├── gitmodules    # `.gitmodules` ignore=dirty helper
//!     └── config        # settings.toml
//! ```
//!
//! Secrets live in the same `KEY=value` file as plain configuration. Values
//! are encrypted to the recipients declared at the top of the file:
//!
//! ```text
//! # si-vault:v1
//! # si-vault:recipient age1...
//!
//! DATABASE_URL=encrypted:si:v2:...
//! LOG_LEVEL=info
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::dotenv::{Dotenv, SetOptions};
pub use crate::core::domain::{Identity, IdentitySource};
pub use crate::error::{Error, ErrorKind, Result};
