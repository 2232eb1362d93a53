//! # Record
//!
//! Binary codec for phrase-table entries.
//!
//! A [`RawRecord`] is lowered to a sequence of `u32` symbols: target tokens and
//! the alignment become [`Dictionary`] codes, scores become their `f32` bit
//! patterns, and the three opaque byte fields are copied byte-per-symbol
//! behind a length. Each of the six fields is closed by a `0` symbol (see
//! [`frame`]). The symbol stream is then variable-byte encoded, giving the
//! packed buffer stored under a lookup key. Several records for one key are
//! simply concatenated.
//!
//! [`Decoder`] reverses this, drawing its records and scratch buffers from a
//! per-thread [`RecordPool`].
//!
//! ## Example
//! ```rust
//! use record::{build_dictionary, Decoder, Encoder, RawRecord, RecordPool};
//!
//! let lines = [
//!     "das haus ||| the house ||| 0.5 0.25 ||| 0-0 1-1",
//!     "das haus ||| the home ||| 0.4 0.125 ||| 0-0 1-1",
//! ];
//! let records: Vec<RawRecord> = lines
//!     .iter()
//!     .map(|l| RawRecord::parse_line(l).unwrap())
//!     .collect();
//! let dict = build_dictionary(&records).unwrap();
//!
//! let packed = Encoder::new(&dict).encode_group(&records).unwrap();
//!
//! let pool = RecordPool::new();
//! let decoded = Decoder::new(&dict, 2, 0).decode(&packed, &pool).unwrap();
//! assert_eq!(decoded.len(), 2);
//! assert_eq!(decoded[1].target_text(&dict).unwrap(), "the home");
//! ```

mod decoder;
mod encoder;
mod error;
pub mod frame;
mod pool;
mod raw;

pub use dictionary::{AlignmentVector, Dictionary};

pub use decoder::{DecodedRecord, Decoder};
pub use encoder::Encoder;
pub use error::{CodecError, ParseError};
pub use pool::{Pooled, RecordPool, Recycle, DEFAULT_POOL_LIMIT};
pub use raw::{build_dictionary, group_by_source, RawRecord, FIELD_SEPARATOR};

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<RawRecord> {
        [
            "das haus ||| the house ||| 0.5 0.25 ||| 0-0 1-1 ||| 10 4 ||| dense=1 ||| {{Tree x}}",
            "das haus ||| the home ||| 0.3 0 ||| 0-0 1-1 ||| 3 4",
            "das haus ||| house ||| 0.2 0.1 ||| 1-0",
            "der hund ||| the dog ||| 1 1 ||| 0-0 1-1",
        ]
        .iter()
        .map(|l| RawRecord::parse_line(l).unwrap())
        .collect()
    }

    #[test]
    fn single_line_scenario() {
        let raw = RawRecord {
            source_phrase: "die katze".into(),
            target_phrase: vec!["the".into(), "cat".into()],
            prob: vec!["0.5".into(), "0.25".into()],
            word_align: "0-0 1-1".into(),
            counts: b"2".to_vec(),
            sparse_score: Vec::new(),
            property: Vec::new(),
        };
        let dict = build_dictionary([&raw]).unwrap();
        let buf = Encoder::new(&dict).encode(&raw).unwrap();

        let pool = RecordPool::new();
        let recs = Decoder::new(&dict, 2, 0).decode(&buf, &pool).unwrap();
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];

        assert_eq!(rec.words(&dict).unwrap(), vec!["the", "cat"]);
        assert_eq!(rec.prob[0].to_bits(), 0.5f32.to_bits());
        assert_eq!(rec.prob[1].to_bits(), 0.25f32.to_bits());
        assert_eq!(rec.alignment.pairs().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
        assert_eq!(rec.counts, vec![0x32]);
        assert!(rec.sparse_score.is_empty());
        assert!(rec.property.is_empty());
    }

    #[test]
    fn groups_decode_in_order() {
        let records = corpus();
        let dict = build_dictionary(&records).unwrap();
        let enc = Encoder::new(&dict);
        let dec = Decoder::new(&dict, 2, 0);
        let pool = RecordPool::new();

        let groups: Vec<&[RawRecord]> = group_by_source(&records).collect();
        assert_eq!(groups.len(), 2);

        for group in groups {
            let buf = enc.encode_group(group).unwrap();
            let decoded = dec.decode(&buf, &pool).unwrap();
            assert_eq!(decoded.len(), group.len());
            for (d, r) in decoded.iter().zip(group) {
                assert!(d.matches(r, &dict).unwrap(), "{:?} != {:?}", d, r);
            }
        }
    }

    #[test]
    fn zero_bytes_in_opaque_fields_roundtrip() {
        let mut raw = corpus().remove(0);
        raw.counts = vec![0, 1, 0];
        raw.sparse_score = vec![0];
        raw.property = vec![255, 0, 0, 7];
        let dict = build_dictionary([&raw]).unwrap();
        let buf = Encoder::new(&dict).encode_group(&[raw.clone(), raw.clone()]).unwrap();

        let pool = RecordPool::new();
        let decoded = Decoder::new(&dict, 2, 0).decode(&buf, &pool).unwrap();
        assert_eq!(decoded.len(), 2);
        for d in &decoded {
            assert_eq!(d.counts, raw.counts);
            assert_eq!(d.sparse_score, raw.sparse_score);
            assert_eq!(d.property, raw.property);
        }
    }

    #[test]
    fn foreign_dictionary_is_detected() {
        let records = corpus();
        let dict = build_dictionary(&records).unwrap();
        let buf = Encoder::new(&dict).encode(&records[3]).unwrap();

        let small = build_dictionary(&records[2..3]).unwrap();
        let pool = RecordPool::new();
        let err = Decoder::new(&small, 2, 0).decode(&buf, &pool).unwrap_err();
        assert!(matches!(err, CodecError::DictionaryMismatch { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const WORDS: &[&str] = &["the", "a", "house", "cat", "of", "green", "ist", "."];

    fn arb_record() -> impl Strategy<Value = RawRecord> {
        (
            proptest::collection::vec(proptest::sample::select(WORDS), 0..6),
            proptest::collection::vec(any::<f32>().prop_filter("finite", |f| f.is_finite()), 3),
            proptest::collection::vec((0u8..8, 0u8..8), 0..4),
            proptest::collection::vec(any::<u8>(), 0..8),
            proptest::collection::vec(any::<u8>(), 0..8),
            proptest::collection::vec(any::<u8>(), 0..8),
        )
            .prop_map(|(words, scores, align, counts, sparse_score, property)| RawRecord {
                source_phrase: "key".into(),
                target_phrase: words.iter().map(|w| w.to_string()).collect(),
                prob: scores.iter().map(|s| format!("{:e}", s)).collect(),
                word_align: align
                    .iter()
                    .map(|(s, t)| format!("{}-{}", s, t))
                    .collect::<Vec<_>>()
                    .join(" "),
                counts,
                sparse_score,
                property,
            })
    }

    proptest! {
        #[test]
        fn group_roundtrip(records in proptest::collection::vec(arb_record(), 1..5)) {
            let dict = build_dictionary(&records).unwrap();
            let buf = Encoder::new(&dict).encode_group(&records).unwrap();

            let pool = RecordPool::new();
            let decoded = Decoder::new(&dict, 3, 0).decode(&buf, &pool).unwrap();
            prop_assert_eq!(decoded.len(), records.len());
            for (d, r) in decoded.iter().zip(&records) {
                prop_assert!(d.matches(r, &dict).unwrap());
            }
        }
    }
}
