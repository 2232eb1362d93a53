use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, info};

use crate::alignment::AlignmentVector;
use crate::error::DictionaryError;
use crate::table::{CodeTable, TableValue};
use crate::Dictionary;

/// Occurrence counter that remembers the order values were first seen.
#[derive(Debug)]
struct FrequencyCounter<V> {
    slots: HashMap<V, usize>,
    entries: Vec<(V, u64)>,
}

impl<V: Clone + Eq + Hash> FrequencyCounter<V> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn bump(&mut self, value: V) {
        match self.slots.get(&value) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.slots.insert(value.clone(), self.entries.len());
                self.entries.push((value, 1));
            }
        }
    }

    /// Values by descending count. The sort is stable over first-encounter
    /// order, so equally frequent values keep the order they appeared in.
    fn into_ranked(self) -> Vec<V> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(v, _)| v).collect()
    }

    fn distinct(&self) -> usize {
        self.entries.len()
    }
}

impl FrequencyCounter<String> {
    fn bump_str(&mut self, token: &str) {
        match self.slots.get(token) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => self.bump(token.to_string()),
        }
    }
}

/// Single-pass frequency counter over phrase-table lines.
///
/// Feed every line with [`add`](DictionaryBuilder::add) (or
/// [`add_line`](DictionaryBuilder::add_line) to also track source phrases),
/// then call [`build`](DictionaryBuilder::build). The most frequent token and
/// alignment get code 1, so common symbols cost a single byte once
/// variable-byte encoded.
///
/// ```rust
/// use dictionary::DictionaryBuilder;
///
/// let mut b = DictionaryBuilder::new();
/// b.add("the cat", "0-0 1-1").unwrap();
/// b.add("the dog", "0-0 1-1").unwrap();
/// let dict = b.build().unwrap();
/// assert_eq!(dict.token_code("the"), Some(1));
/// ```
#[derive(Debug)]
pub struct DictionaryBuilder {
    tokens: FrequencyCounter<String>,
    alignments: FrequencyCounter<AlignmentVector>,
    lines: u64,
    unique_sources: u64,
    prev_source: Option<String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self {
            tokens: FrequencyCounter::new(),
            alignments: FrequencyCounter::new(),
            lines: 0,
            unique_sources: 0,
            prev_source: None,
        }
    }

    /// Counts the tokens of `target_phrase` and its alignment vector.
    ///
    /// # Errors
    ///
    /// [`DictionaryError::InvalidAlignment`] if `word_align` cannot be parsed.
    /// Nothing is counted for a line that fails.
    pub fn add(&mut self, target_phrase: &str, word_align: &str) -> Result<(), DictionaryError> {
        let alignment = AlignmentVector::parse(word_align)?;
        for token in target_phrase.split_whitespace() {
            self.tokens.bump_str(token);
        }
        self.alignments.bump(alignment);
        self.lines += 1;
        Ok(())
    }

    /// Like [`add`](DictionaryBuilder::add), and also counts runs of equal
    /// consecutive source phrases (one lookup key each).
    pub fn add_line(
        &mut self,
        source_phrase: &str,
        target_phrase: &str,
        word_align: &str,
    ) -> Result<(), DictionaryError> {
        self.add(target_phrase, word_align)?;
        if self.prev_source.as_deref() != Some(source_phrase) {
            self.unique_sources += 1;
            self.prev_source = Some(source_phrase.to_string());
        }
        Ok(())
    }

    /// Number of lines counted so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Number of distinct consecutive source phrases seen by
    /// [`add_line`](DictionaryBuilder::add_line).
    pub fn unique_sources(&self) -> u64 {
        self.unique_sources
    }

    /// Ranks both counters and assigns codes. The counters are consumed.
    pub fn build(self) -> Result<Dictionary, DictionaryError> {
        debug!(
            distinct_tokens = self.tokens.distinct(),
            distinct_alignments = self.alignments.distinct(),
            "ranking dictionary entries"
        );

        let tokens = rank(self.tokens)?;
        let alignments = rank(self.alignments)?;
        let dict = Dictionary::from_tables(tokens, alignments);

        info!(
            lines = self.lines,
            unique_sources = self.unique_sources,
            tokens = dict.tokens().len(),
            alignments = dict.alignments().len(),
            fingerprint = %format!("{:08x}", dict.fingerprint()),
            "built dictionary"
        );
        Ok(dict)
    }
}

impl Default for DictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn rank<V: TableValue>(counter: FrequencyCounter<V>) -> Result<CodeTable<V>, DictionaryError> {
    CodeTable::from_ranked(counter.into_ranked())
}
