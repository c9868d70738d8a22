//! Classification of envfile values without decrypting.

use serde::Serialize;
use tracing::debug;

use crate::core::cipher;
use crate::core::domain::Classification;
use crate::core::dotenv::{normalize_value, Dotenv};
use crate::core::validation::validate_key;
use crate::error::Result;

/// One classified assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub key: String,
    /// Zero-based line index.
    pub line: usize,
    pub class: Classification,
}

/// Per-assignment classification of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub entries: Vec<ScanEntry>,
}

impl ScanResult {
    fn keys(&self, class: Classification) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.class == class)
            .map(|e| e.key.as_str())
            .collect()
    }

    pub fn encrypted_keys(&self) -> Vec<&str> {
        self.keys(Classification::Encrypted)
    }

    pub fn plaintext_keys(&self) -> Vec<&str> {
        self.keys(Classification::Plaintext)
    }

    pub fn empty_keys(&self) -> Vec<&str> {
        self.keys(Classification::Empty)
    }
}

/// Classify every assignment as encrypted, plaintext, or empty.
///
/// Encrypted values have their envelope checked, so a value carrying a
/// ciphertext tag over a payload that is not an age stream fails here.
///
/// # Errors
///
/// Invalid keys, malformed quoted values, or malformed ciphertext.
pub fn scan_dotenv_encryption(doc: &Dotenv) -> Result<ScanResult> {
    let mut result = ScanResult::default();
    for (line, assign) in doc.assignments() {
        validate_key(&assign.key)?;
        let value = normalize_value(&assign.value_raw)?;
        let class = Classification::of(&value);
        if class == Classification::Encrypted {
            cipher::validate(&value)?;
        }
        result.entries.push(ScanEntry {
            key: assign.key,
            line,
            class,
        });
    }
    debug!(entries = result.entries.len(), "scanned dotenv");
    Ok(result)
}
