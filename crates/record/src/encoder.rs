use dictionary::Dictionary;

use crate::error::CodecError;
use crate::frame::DELIMITER;
use crate::raw::RawRecord;

/// Turns raw records into packed buffers using a frozen dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'d> {
    dict: &'d Dictionary,
}

impl<'d> Encoder<'d> {
    pub fn new(dict: &'d Dictionary) -> Self {
        Self { dict }
    }

    /// Appends the symbol stream of one record to `out`.
    ///
    /// On error `out` is truncated back to its length on entry, so a failed
    /// record leaves nothing behind.
    pub fn symbols(&self, record: &RawRecord, out: &mut Vec<u32>) -> Result<(), CodecError> {
        let start = out.len();
        let result = self.push_symbols(record, out);
        if result.is_err() {
            out.truncate(start);
        }
        result
    }

    fn push_symbols(&self, record: &RawRecord, out: &mut Vec<u32>) -> Result<(), CodecError> {
        if !self.dict.can_encode() {
            return Err(CodecError::ReadOnlyDictionary);
        }

        for token in &record.target_phrase {
            let code = self
                .dict
                .token_code(token)
                .ok_or_else(|| CodecError::UnknownToken(token.clone()))?;
            out.push(code);
        }
        out.push(DELIMITER);

        for score in record.scores()? {
            out.push(score.to_bits());
        }
        out.push(DELIMITER);

        let alignment = record.alignment()?;
        let code = self
            .dict
            .alignment_code(&alignment)
            .ok_or_else(|| CodecError::UnknownAlignment(record.word_align.clone()))?;
        out.push(code);
        out.push(DELIMITER);

        for bytes in [&record.counts, &record.sparse_score, &record.property] {
            out.push(bytes.len() as u32);
            out.extend(bytes.iter().map(|&b| b as u32));
            out.push(DELIMITER);
        }

        Ok(())
    }

    /// Encodes one record into a packed buffer.
    pub fn encode(&self, record: &RawRecord) -> Result<Vec<u8>, CodecError> {
        let mut symbols = Vec::new();
        self.symbols(record, &mut symbols)?;
        Ok(vbyte::encode_all(&symbols))
    }

    /// Encodes records sharing one lookup key into a single buffer, in order.
    /// Fails on the first record that cannot be encoded.
    pub fn encode_group(&self, records: &[RawRecord]) -> Result<Vec<u8>, CodecError> {
        let mut symbols = Vec::new();
        for record in records {
            self.symbols(record, &mut symbols)?;
        }
        Ok(vbyte::encode_all(&symbols))
    }
}
