//! Entry type.
//!
//! A logical key/value projection of one assignment line.

/// How a value is stored in the envfile.
///
/// Empty values are kept distinct from plaintext: they legitimately carry
/// no ciphertext payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Encrypted,
    Plaintext,
    Empty,
}

impl Classification {
    /// Classify a normalized value.
    pub fn of(value: &str) -> Self {
        if value.trim().is_empty() {
            Classification::Empty
        } else if crate::core::cipher::is_encrypted(value) {
            Classification::Encrypted
        } else {
            Classification::Plaintext
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Encrypted => "encrypted",
            Classification::Plaintext => "plaintext",
            Classification::Empty => "empty",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key with its normalized value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: String,
    encrypted: bool,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let encrypted = crate::core::cipher::is_encrypted(&value);
        Self {
            key: key.into(),
            value,
            encrypted,
        }
    }

    /// Entry's key name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Normalized value (ciphertext when encrypted)
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the value carries a recognized ciphertext prefix
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}
