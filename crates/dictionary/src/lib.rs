//! # Dictionary
//!
//! Frequency-ranked code tables for the two recurring value kinds of a
//! phrase table: target-phrase tokens and word-alignment vectors.
//!
//! Each table is a bijection between values and dense codes `1..=len`. Codes
//! are handed out by descending frequency, so the most common values get the
//! smallest numbers and the shortest variable-byte encodings. Code `0` is
//! never assigned; record framing uses it as the field delimiter.
//!
//! A [`Dictionary`] is built once by [`DictionaryBuilder`], saved, and then
//! loaded read-only by every process that decodes. Encoder and decoder must
//! use the same snapshot; [`Dictionary::fingerprint`] identifies it.
//!
//! ## On-disk layout
//!
//! A dictionary directory holds two independent table dumps:
//!
//! ```text
//! target_phrases.dict   code -> UTF-8 token        magic "PTD1"
//! alignments.dict       code -> alignment bytes    magic "PTA1"
//! ```
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ DATA SECTION (entries in ascending code order)│
//! │                                               │
//! │ code (u32) | value_len (u32) | value bytes    │
//! │                                               │
//! ├───────────────────────────────────────────────┤
//! │ FOOTER (always last 16 bytes)                 │
//! │                                               │
//! │ count | fingerprint | data_crc | magic (u32)  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.

mod alignment;
mod builder;
mod error;
mod format;
mod reader;
mod table;
mod writer;

use std::path::Path;

use crc32fast::Hasher as Crc32;
use tracing::{debug, info};

pub use alignment::AlignmentVector;
pub use builder::DictionaryBuilder;
pub use error::DictionaryError;
pub use format::{ALIGNMENT_FILE, ALIGNMENT_MAGIC, FOOTER_BYTES, TOKEN_FILE, TOKEN_MAGIC};
pub use reader::{parse_table, read_table};
pub use table::{CodeTable, TableValue};
pub use writer::write_table;

/// The frozen token and alignment tables shared by encoder and decoder.
#[derive(Debug, Clone)]
pub struct Dictionary {
    tokens: CodeTable<String>,
    alignments: CodeTable<AlignmentVector>,
    fingerprint: u32,
}

impl Dictionary {
    /// Assembles a dictionary from two ranked tables and computes its
    /// fingerprint.
    pub fn from_tables(tokens: CodeTable<String>, alignments: CodeTable<AlignmentVector>) -> Self {
        let fingerprint = fingerprint(&tokens, &alignments);
        Self {
            tokens,
            alignments,
            fingerprint,
        }
    }

    pub fn tokens(&self) -> &CodeTable<String> {
        &self.tokens
    }

    pub fn alignments(&self) -> &CodeTable<AlignmentVector> {
        &self.alignments
    }

    /// CRC-32 over both tables in code order. Two dictionaries with the same
    /// fingerprint assign the same codes.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn token_code(&self, token: &str) -> Option<u32> {
        self.tokens.code_of_str(token)
    }

    pub fn alignment_code(&self, alignment: &AlignmentVector) -> Option<u32> {
        self.alignments.code(alignment)
    }

    pub fn token(&self, code: u32) -> Option<&str> {
        self.tokens.value(code).map(String::as_str)
    }

    pub fn alignment(&self, code: u32) -> Option<&AlignmentVector> {
        self.alignments.value(code)
    }

    /// Resolves a sequence of token codes. `None` if any code is unknown.
    pub fn words(&self, codes: &[u32]) -> Option<Vec<&str>> {
        codes.iter().map(|&c| self.token(c)).collect()
    }

    /// Resolves token codes and joins them with single spaces.
    pub fn target_text(&self, codes: &[u32]) -> Option<String> {
        self.words(codes).map(|w| w.join(" "))
    }

    /// `true` while both forward maps are present.
    pub fn can_encode(&self) -> bool {
        self.tokens.can_encode() && self.alignments.can_encode()
    }

    /// Drops both forward maps, keeping only what decoding needs.
    pub fn into_decode_only(mut self) -> Self {
        self.tokens.drop_forward();
        self.alignments.drop_forward();
        self
    }

    /// Writes both tables into `dir`, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), DictionaryError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        write_table(&dir.join(TOKEN_FILE), &self.tokens, TOKEN_MAGIC, self.fingerprint)?;
        write_table(
            &dir.join(ALIGNMENT_FILE),
            &self.alignments,
            ALIGNMENT_MAGIC,
            self.fingerprint,
        )?;

        info!(
            dir = %dir.display(),
            tokens = self.tokens.len(),
            alignments = self.alignments.len(),
            "saved dictionary"
        );
        Ok(())
    }

    /// Loads both tables from `dir`, rebuilding forward and reverse maps.
    ///
    /// # Errors
    ///
    /// Any I/O error or corrupt table aborts the load; there is no partial
    /// dictionary. [`DictionaryError::FingerprintMismatch`] if the two tables
    /// come from different builds or their contents do not match the
    /// recorded fingerprint.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, DictionaryError> {
        let dir = dir.as_ref();

        let (tokens, token_fp) = read_table::<String>(&dir.join(TOKEN_FILE), TOKEN_MAGIC)?;
        let (alignments, align_fp) =
            read_table::<AlignmentVector>(&dir.join(ALIGNMENT_FILE), ALIGNMENT_MAGIC)?;

        if token_fp != align_fp {
            return Err(DictionaryError::FingerprintMismatch {
                expected: token_fp,
                found: align_fp,
            });
        }

        let dict = Self::from_tables(tokens, alignments);
        if dict.fingerprint != token_fp {
            return Err(DictionaryError::FingerprintMismatch {
                expected: token_fp,
                found: dict.fingerprint,
            });
        }

        debug!(dir = %dir.display(), fingerprint = %format!("{:08x}", dict.fingerprint), "loaded dictionary");
        Ok(dict)
    }
}

fn fingerprint(tokens: &CodeTable<String>, alignments: &CodeTable<AlignmentVector>) -> u32 {
    let mut hasher = Crc32::new();
    hash_table(&mut hasher, tokens);
    hash_table(&mut hasher, alignments);
    hasher.finalize()
}

fn hash_table<V: TableValue>(hasher: &mut Crc32, table: &CodeTable<V>) {
    hasher.update(&(table.len() as u32).to_le_bytes());
    for (_, value) in table.iter() {
        let bytes = value.as_bytes();
        hasher.update(&(bytes.len() as u32).to_le_bytes());
        hasher.update(bytes);
    }
}
