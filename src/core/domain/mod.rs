//! Domain types.

pub mod entry;
pub mod identity;

pub use entry::{Classification, Entry};
pub use identity::{Identity, IdentitySource};
