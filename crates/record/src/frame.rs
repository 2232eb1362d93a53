//! Record framing.
//!
//! One record is six fields, each closed by the delimiter symbol `0`:
//!
//! ```text
//! [tokenCode]* 0                  target phrase, codes >= 1
//! [scoreBits]{N} 0                N = num_scores + num_lex_scores, raw f32 bits
//! alignCode 0                     exactly one alignment code
//! len [byte]{len} 0               counts
//! len [byte]{len} 0               sparse score
//! len [byte]{len} 0               property
//! ```
//!
//! Score bits and byte fields may legitimately contain `0`; they are read by
//! count, never by scanning for the delimiter. Records for the same lookup key
//! are concatenated with no separator.

use std::fmt;

/// Symbol closing every field.
pub const DELIMITER: u32 = 0;

/// Number of delimiters in one record.
pub const FIELDS: usize = 6;

/// The six fields of a record, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TargetPhrase,
    Scores,
    Alignment,
    Counts,
    SparseScore,
    Property,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::TargetPhrase => "target phrase",
            Field::Scores => "scores",
            Field::Alignment => "alignment",
            Field::Counts => "counts",
            Field::SparseScore => "sparse score",
            Field::Property => "property",
        };
        f.write_str(name)
    }
}
