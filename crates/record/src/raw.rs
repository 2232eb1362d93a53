use dictionary::{AlignmentVector, Dictionary, DictionaryBuilder, DictionaryError};

use crate::error::{CodecError, ParseError};

/// Field separator of a text phrase-table line.
pub const FIELD_SEPARATOR: &str = "|||";

/// Minimum number of fields: source, target, scores, alignment.
const REQUIRED_FIELDS: usize = 4;

/// One phrase-table entry before encoding.
///
/// `source_phrase` is the lookup key and is not part of the encoded record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub source_phrase: String,
    pub target_phrase: Vec<String>,
    pub prob: Vec<String>,
    pub word_align: String,
    pub counts: Vec<u8>,
    pub sparse_score: Vec<u8>,
    pub property: Vec<u8>,
}

impl RawRecord {
    /// Parses a line of the form
    /// `source ||| target ||| scores ||| alignment [||| counts [||| sparse [||| property]]]`.
    ///
    /// Fields are trimmed. Trailing optional fields default to empty; extra
    /// separators beyond the seventh field stay inside `property`.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line
            .splitn(7, FIELD_SEPARATOR)
            .map(str::trim)
            .collect();
        if fields.len() < REQUIRED_FIELDS {
            return Err(ParseError::MissingField {
                expected: REQUIRED_FIELDS,
                found: fields.len(),
            });
        }
        if fields[0].is_empty() {
            return Err(ParseError::EmptySource);
        }

        let bytes = |i: usize| fields.get(i).map(|f| f.as_bytes().to_vec()).unwrap_or_default();

        Ok(Self {
            source_phrase: fields[0].to_string(),
            target_phrase: fields[1].split_whitespace().map(String::from).collect(),
            prob: fields[2].split_whitespace().map(String::from).collect(),
            word_align: fields[3].to_string(),
            counts: bytes(4),
            sparse_score: bytes(5),
            property: bytes(6),
        })
    }

    /// Parses every score. Values are read as `f64` and narrowed, so
    /// out-of-range literals become infinities instead of errors.
    pub fn scores(&self) -> Result<Vec<f32>, CodecError> {
        self.prob
            .iter()
            .map(|s| {
                s.parse::<f64>()
                    .map(|v| v as f32)
                    .map_err(|_| CodecError::InvalidScore(s.clone()))
            })
            .collect()
    }

    pub fn alignment(&self) -> Result<AlignmentVector, CodecError> {
        AlignmentVector::parse(&self.word_align)
            .map_err(|_| CodecError::InvalidAlignment(self.word_align.clone()))
    }

    /// Renders the record back into a text line.
    pub fn to_line(&self) -> String {
        format!(
            "{} ||| {} ||| {} ||| {} ||| {} ||| {} ||| {}",
            self.source_phrase,
            self.target_phrase.join(" "),
            self.prob.join(" "),
            self.word_align,
            String::from_utf8_lossy(&self.counts),
            String::from_utf8_lossy(&self.sparse_score),
            String::from_utf8_lossy(&self.property),
        )
    }
}

/// Builds a dictionary from a corpus of records in one pass.
pub fn build_dictionary<'a, I>(records: I) -> Result<Dictionary, DictionaryError>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut builder = DictionaryBuilder::new();
    let mut target = String::new();
    for record in records {
        target.clear();
        for (i, token) in record.target_phrase.iter().enumerate() {
            if i > 0 {
                target.push(' ');
            }
            target.push_str(token);
        }
        builder.add_line(&record.source_phrase, &target, &record.word_align)?;
    }
    builder.build()
}

/// Splits records into runs sharing the same source phrase, preserving order.
pub fn group_by_source(records: &[RawRecord]) -> impl Iterator<Item = &[RawRecord]> {
    records.chunk_by(|a, b| a.source_phrase == b.source_phrase)
}
