use std::fmt;

use crate::error::DictionaryError;

/// Word alignment of one phrase pair, stored as a flat list of positions.
///
/// `"0-0 1-2"` is kept as `[0, 0, 1, 2]`: source and target positions
/// alternate. Two vectors are the same dictionary key iff their positions are
/// equal element-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlignmentVector(Vec<u8>);

impl AlignmentVector {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses the whitespace-separated `source-target` pairs of an alignment
    /// field. An empty field yields an empty vector.
    ///
    /// # Errors
    ///
    /// [`DictionaryError::InvalidAlignment`] if a pair has no `-`, a position
    /// is not a number, or a position does not fit in a byte.
    pub fn parse(field: &str) -> Result<Self, DictionaryError> {
        let mut positions = Vec::new();
        for pair in field.split_whitespace() {
            let (src, tgt) = pair
                .split_once('-')
                .ok_or_else(|| DictionaryError::InvalidAlignment(pair.to_string()))?;
            for part in [src, tgt] {
                let pos = part
                    .parse::<u8>()
                    .map_err(|_| DictionaryError::InvalidAlignment(pair.to_string()))?;
                positions.push(pos);
            }
        }
        Ok(Self(positions))
    }

    pub fn from_positions(positions: Vec<u8>) -> Self {
        Self(positions)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(source, target)` position pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.0.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    /// Replaces the contents with `other`, keeping this vector's allocation.
    pub fn copy_from(&mut self, other: &AlignmentVector) {
        self.0.clear();
        self.0.extend_from_slice(&other.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for AlignmentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (src, tgt)) in self.pairs().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}-{}", src, tgt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parse_pairs() {
        let a = AlignmentVector::parse("0-0 1-1 2-0").unwrap();
        assert_eq!(a.as_slice(), &[0, 0, 1, 1, 2, 0]);
        assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 0), (1, 1), (2, 0)]);
    }

    #[test]
    fn parse_empty_field() {
        let a = AlignmentVector::parse("  ").unwrap();
        assert!(a.is_empty());
        assert_eq!(a.to_string(), "");
    }

    #[test]
    fn display_roundtrip() {
        let a = AlignmentVector::parse("3-1  0-2").unwrap();
        assert_eq!(a.to_string(), "3-1 0-2");
        assert_eq!(AlignmentVector::parse(&a.to_string()).unwrap(), a);
    }

    #[test_case("0"; "missing dash")]
    #[test_case("a-1"; "not a number")]
    #[test_case("0-256"; "position too large")]
    #[test_case("0--1"; "negative position")]
    fn parse_rejects(field: &str) {
        assert!(matches!(
            AlignmentVector::parse(field),
            Err(DictionaryError::InvalidAlignment(_))
        ));
    }

    #[test]
    fn equal_by_value() {
        let a = AlignmentVector::parse("0-0 1-1").unwrap();
        let b = AlignmentVector::from_positions(vec![0, 0, 1, 1]);
        assert_eq!(a, b);
    }
}
