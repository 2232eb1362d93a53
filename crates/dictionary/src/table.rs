use std::collections::HashMap;
use std::hash::Hash;

use crate::alignment::AlignmentVector;
use crate::error::DictionaryError;

/// A value that can live in a [`CodeTable`] and be dumped to disk.
pub trait TableValue: Clone + Eq + Hash {
    /// Table name used in error messages and logs.
    const TABLE: &'static str;

    fn as_bytes(&self) -> &[u8];

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, DictionaryError>;
}

impl TableValue for String {
    const TABLE: &'static str = "target phrase";

    fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, DictionaryError> {
        String::from_utf8(bytes)
            .map_err(|e| DictionaryError::corrupt(Self::TABLE, format!("invalid utf-8: {}", e)))
    }
}

impl TableValue for AlignmentVector {
    const TABLE: &'static str = "alignment";

    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, DictionaryError> {
        Ok(AlignmentVector::from_positions(bytes))
    }
}

/// Bijective map between values and dense codes `1..=len`.
///
/// The reverse direction is a plain vector indexed by `code - 1`, which is
/// all the decoder needs. The forward map is only required for encoding and
/// can be dropped with [`drop_forward`](CodeTable::drop_forward).
///
/// Code `0` is never assigned: it is the record field delimiter.
#[derive(Debug, Clone)]
pub struct CodeTable<V> {
    forward: Option<HashMap<V, u32>>,
    reverse: Vec<V>,
}

impl<V: TableValue> CodeTable<V> {
    /// Builds a table from values already in code order: the first value gets
    /// code 1.
    ///
    /// # Errors
    ///
    /// [`DictionaryError::Corrupt`] if a value appears twice.
    pub fn from_ranked(values: Vec<V>) -> Result<Self, DictionaryError> {
        let mut forward = HashMap::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            if forward.insert(value.clone(), i as u32 + 1).is_some() {
                return Err(DictionaryError::corrupt(
                    V::TABLE,
                    format!("value at code {} appears twice", i + 1),
                ));
            }
        }
        Ok(Self {
            forward: Some(forward),
            reverse: values,
        })
    }

    /// Returns the code for `value`, or `None` if it is absent or the forward
    /// map was dropped.
    pub fn code(&self, value: &V) -> Option<u32> {
        self.forward.as_ref().and_then(|f| f.get(value).copied())
    }

    /// Reverse lookup. Code 0 and codes past the end return `None`.
    pub fn value(&self, code: u32) -> Option<&V> {
        let idx = (code as usize).checked_sub(1)?;
        self.reverse.get(idx)
    }

    /// `true` while the forward map is available, i.e. the table can encode.
    pub fn can_encode(&self) -> bool {
        self.forward.is_some()
    }

    /// Frees the forward map. Reverse lookups keep working.
    pub fn drop_forward(&mut self) {
        self.forward = None;
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Iterates `(code, value)` in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &V)> {
        self.reverse
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32 + 1, v))
    }
}

impl CodeTable<String> {
    /// Token lookup without allocating a `String` key.
    pub fn code_of_str(&self, token: &str) -> Option<u32> {
        self.forward.as_ref().and_then(|f| f.get(token).copied())
    }
}

impl<V> Default for CodeTable<V> {
    fn default() -> Self {
        Self {
            forward: Some(HashMap::new()),
            reverse: Vec::new(),
        }
    }
}
