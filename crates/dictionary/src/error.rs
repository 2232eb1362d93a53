use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid alignment pair: {0:?}")]
    InvalidAlignment(String),

    #[error("corrupt {table} table: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// The two table dumps were not written from the same build, or their
    /// contents no longer match the recorded fingerprint.
    #[error("dictionary fingerprint mismatch: expected {expected:08x}, found {found:08x}")]
    FingerprintMismatch { expected: u32, found: u32 },
}

impl DictionaryError {
    pub(crate) fn corrupt(table: &'static str, reason: impl Into<String>) -> Self {
        DictionaryError::Corrupt {
            table,
            reason: reason.into(),
        }
    }
}
