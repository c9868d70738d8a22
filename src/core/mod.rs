//! Core library components.
//!
//! Everything the vault does to a document, a key, or a file on disk lives
//! here; the CLI only wires these together.

pub mod audit;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod dotenv;
pub mod files;
pub mod format;
pub mod gitmodules;
pub mod header;
pub mod recipient;
pub mod store;
pub mod target;
pub mod trust;
pub mod validation;
pub mod vault;
