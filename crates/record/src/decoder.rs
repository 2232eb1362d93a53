use dictionary::{AlignmentVector, Dictionary};

use crate::error::CodecError;
use crate::frame::{Field, DELIMITER};
use crate::pool::{Pooled, RecordPool, Recycle};
use crate::raw::RawRecord;

/// A record reconstructed from a packed buffer.
///
/// Target tokens stay as dictionary codes; resolve them with
/// [`Dictionary::words`] or [`DecodedRecord::target_text`]. Every code in a
/// record returned by [`Decoder`] is known to resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRecord {
    pub target_phrase: Vec<u32>,
    pub prob: Vec<f32>,
    pub alignment: AlignmentVector,
    pub counts: Vec<u8>,
    pub sparse_score: Vec<u8>,
    pub property: Vec<u8>,
}

impl DecodedRecord {
    pub fn target_text(&self, dict: &Dictionary) -> Result<String, CodecError> {
        let words = self.words(dict)?;
        Ok(words.join(" "))
    }

    pub fn words<'d>(&self, dict: &'d Dictionary) -> Result<Vec<&'d str>, CodecError> {
        self.target_phrase
            .iter()
            .map(|&code| {
                dict.token(code).ok_or(CodecError::DictionaryMismatch {
                    table: "target phrase",
                    code,
                })
            })
            .collect()
    }

    /// Checks that this record is the encoding of `raw`: same tokens, same
    /// score bits, same alignment and identical byte fields.
    pub fn matches(&self, raw: &RawRecord, dict: &Dictionary) -> Result<bool, CodecError> {
        let words = self.words(dict)?;
        if words.len() != raw.target_phrase.len()
            || words.iter().zip(&raw.target_phrase).any(|(a, b)| *a != b.as_str())
        {
            return Ok(false);
        }
        let scores = raw.scores()?;
        if scores.len() != self.prob.len()
            || scores
                .iter()
                .zip(&self.prob)
                .any(|(a, b)| a.to_bits() != b.to_bits())
        {
            return Ok(false);
        }
        Ok(self.alignment == raw.alignment()?
            && self.counts == raw.counts
            && self.sparse_score == raw.sparse_score
            && self.property == raw.property)
    }

    /// Renders the record as a text line keyed by `source_phrase`.
    pub fn to_line(&self, source_phrase: &str, dict: &Dictionary) -> Result<String, CodecError> {
        let scores: Vec<String> = self.prob.iter().map(|p| p.to_string()).collect();
        Ok(format!(
            "{} ||| {} ||| {} ||| {} ||| {} ||| {} ||| {}",
            source_phrase,
            self.target_text(dict)?,
            scores.join(" "),
            self.alignment,
            String::from_utf8_lossy(&self.counts),
            String::from_utf8_lossy(&self.sparse_score),
            String::from_utf8_lossy(&self.property),
        ))
    }
}

impl Recycle for DecodedRecord {
    fn reset(&mut self) {
        self.target_phrase.clear();
        self.prob.clear();
        self.alignment.clear();
        self.counts.clear();
        self.sparse_score.clear();
        self.property.clear();
    }
}

/// Read cursor over a decoded symbol stream.
struct Symbols<'a> {
    stream: &'a [u32],
    pos: usize,
}

impl<'a> Symbols<'a> {
    fn new(stream: &'a [u32]) -> Self {
        Self { stream, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.stream.len()
    }

    fn remaining(&self) -> usize {
        self.stream.len().saturating_sub(self.pos)
    }

    fn next(&mut self, field: Field) -> Result<u32, CodecError> {
        let symbol = *self
            .stream
            .get(self.pos)
            .ok_or(CodecError::TruncatedRecord { field })?;
        self.pos += 1;
        Ok(symbol)
    }

    fn expect_delimiter(&mut self, field: Field) -> Result<(), CodecError> {
        match self.next(field)? {
            DELIMITER => Ok(()),
            found => Err(CodecError::MissingDelimiter { field, found }),
        }
    }

    /// Reads a length-prefixed byte field and its delimiter.
    fn bytes_into(&mut self, field: Field, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let len = self.next(field)? as usize;
        out.reserve(len.min(self.remaining()));
        for _ in 0..len {
            let value = self.next(field)?;
            let byte = u8::try_from(value).map_err(|_| CodecError::ByteOutOfRange { field, value })?;
            out.push(byte);
        }
        self.expect_delimiter(field)
    }
}

/// Reconstructs records from packed buffers.
///
/// The number of scores per record is not stored in the buffer; it must be
/// given as `num_scores + num_lex_scores` exactly as the table was built.
///
/// ```rust
/// use record::{Decoder, Encoder, RawRecord, RecordPool, build_dictionary};
///
/// let raw = RawRecord::parse_line("das ||| the ||| 0.5 ||| 0-0").unwrap();
/// let dict = build_dictionary([&raw]).unwrap();
/// let buf = Encoder::new(&dict).encode(&raw).unwrap();
///
/// let pool = RecordPool::new();
/// let records = Decoder::new(&dict, 1, 0).decode(&buf, &pool).unwrap();
/// assert_eq!(records[0].target_text(&dict).unwrap(), "the");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'d> {
    dict: &'d Dictionary,
    score_count: usize,
}

impl<'d> Decoder<'d> {
    pub fn new(dict: &'d Dictionary, num_scores: usize, num_lex_scores: usize) -> Self {
        Self {
            dict,
            score_count: num_scores + num_lex_scores,
        }
    }

    /// Decodes every record in `buf`. An empty buffer yields no records.
    ///
    /// # Errors
    ///
    /// - [`CodecError::MalformedInteger`] if the byte stream ends mid-symbol.
    /// - [`CodecError::DictionaryMismatch`] if a code does not resolve.
    /// - [`CodecError::TruncatedRecord`] if the stream ends before the last
    ///   record's sixth delimiter.
    /// - [`CodecError::MissingDelimiter`] / [`CodecError::ByteOutOfRange`] if
    ///   the framing is inconsistent, e.g. a wrong score count.
    pub fn decode<'p>(
        &self,
        buf: &[u8],
        pool: &'p RecordPool,
    ) -> Result<Vec<Pooled<'p, DecodedRecord>>, CodecError> {
        let mut out = Vec::new();
        self.decode_into(buf, pool, &mut out)?;
        Ok(out)
    }

    /// Appends the records in `buf` to `out`, returning how many were added.
    ///
    /// On error, records already appended stay in `out` and must be
    /// discarded by the caller. Pooled objects are returned to `pool` on
    /// every path.
    pub fn decode_into<'p>(
        &self,
        buf: &[u8],
        pool: &'p RecordPool,
        out: &mut Vec<Pooled<'p, DecodedRecord>>,
    ) -> Result<usize, CodecError> {
        let mut stream = pool.acquire_stream();
        vbyte::decode_into(buf, &mut stream)?;

        let mut symbols = Symbols::new(&stream);
        let before = out.len();
        while !symbols.is_empty() {
            let mut record = pool.acquire_record();
            self.decode_record(&mut symbols, &mut record)?;
            out.push(record);
        }
        Ok(out.len() - before)
    }

    /// Runs the six-field automaton once, consuming exactly one record.
    fn decode_record(
        &self,
        symbols: &mut Symbols<'_>,
        record: &mut DecodedRecord,
    ) -> Result<(), CodecError> {
        let mut state = Field::TargetPhrase;
        loop {
            state = match state {
                Field::TargetPhrase => {
                    loop {
                        let code = symbols.next(Field::TargetPhrase)?;
                        if code == DELIMITER {
                            break;
                        }
                        if self.dict.token(code).is_none() {
                            return Err(CodecError::DictionaryMismatch {
                                table: "target phrase",
                                code,
                            });
                        }
                        record.target_phrase.push(code);
                    }
                    Field::Scores
                }
                Field::Scores => {
                    record.prob.reserve(self.score_count);
                    for _ in 0..self.score_count {
                        let bits = symbols.next(Field::Scores)?;
                        record.prob.push(f32::from_bits(bits));
                    }
                    symbols.expect_delimiter(Field::Scores)?;
                    Field::Alignment
                }
                Field::Alignment => {
                    let code = symbols.next(Field::Alignment)?;
                    let alignment =
                        self.dict
                            .alignment(code)
                            .ok_or(CodecError::DictionaryMismatch {
                                table: "alignment",
                                code,
                            })?;
                    record.alignment.copy_from(alignment);
                    symbols.expect_delimiter(Field::Alignment)?;
                    Field::Counts
                }
                Field::Counts => {
                    symbols.bytes_into(Field::Counts, &mut record.counts)?;
                    Field::SparseScore
                }
                Field::SparseScore => {
                    symbols.bytes_into(Field::SparseScore, &mut record.sparse_score)?;
                    Field::Property
                }
                Field::Property => {
                    symbols.bytes_into(Field::Property, &mut record.property)?;
                    return Ok(());
                }
            };
        }
    }
}
