use thiserror::Error;

use crate::frame::Field;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown target token {0:?}")]
    UnknownToken(String),

    #[error("unknown alignment {0:?}")]
    UnknownAlignment(String),

    #[error("invalid score {0:?}")]
    InvalidScore(String),

    #[error("invalid alignment field {0:?}")]
    InvalidAlignment(String),

    #[error("malformed integer: {0}")]
    MalformedInteger(#[from] vbyte::Error),

    /// A decoded code has no entry in the reverse table: the buffer was
    /// written with a different dictionary.
    #[error("dictionary mismatch: {table} code {code} is not in the dictionary")]
    DictionaryMismatch { table: &'static str, code: u32 },

    #[error("truncated record: stream ends inside {field}")]
    TruncatedRecord { field: Field },

    #[error("expected delimiter after {field}, found {found}")]
    MissingDelimiter { field: Field, found: u32 },

    #[error("{field} symbol {value} does not fit in a byte")]
    ByteOutOfRange { field: Field, value: u32 },

    #[error("dictionary has no forward tables; it can only decode")]
    ReadOnlyDictionary,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least {expected} ' ||| ' separated fields, found {found}")]
    MissingField { expected: usize, found: usize },

    #[error("empty source phrase")]
    EmptySource,
}
