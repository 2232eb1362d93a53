//! # VByte
//!
//! Self-delimiting variable-byte encoding for unsigned 32-bit symbols.
//!
//! Each value is split into 7-bit groups, least-significant group first. Every
//! byte except the last carries the continuation flag (`0x80`) in its high bit,
//! so a decoder can find value boundaries without any side table.
//!
//! ## Encoded length
//!
//! | value range            | bytes |
//! |------------------------|-------|
//! | `0 ..= 2^7 - 1`        | 1     |
//! | `2^7 ..= 2^14 - 1`     | 2     |
//! | `2^14 ..= 2^21 - 1`    | 3     |
//! | `2^21 ..= 2^28 - 1`    | 4     |
//! | `2^28 ..= u32::MAX`    | 5     |
//!
//! For example, `300` encodes as `[0xAC, 0x02]`.
//!
//! ```rust
//! let bytes = vbyte::encode(300);
//! assert_eq!(bytes, vec![0xAC, 0x02]);
//! assert_eq!(vbyte::decode(&bytes).unwrap(), vec![300]);
//! ```

use thiserror::Error;

/// Largest number of bytes a `u32` can occupy.
pub const MAX_ENCODED_LEN: usize = 5;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// Bits of a 5th byte that would land above bit 31.
const FIFTH_BYTE_OVERFLOW_MASK: u8 = 0x70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The buffer ended while a value still expected continuation bytes.
    #[error("malformed integer: buffer ends mid-group at byte {offset}")]
    MalformedInteger { offset: usize },

    /// A group does not fit in 32 bits.
    #[error("integer overflow: group starting at byte {offset} exceeds 32 bits")]
    Overflow { offset: usize },
}

/// Returns the number of bytes `value` occupies when encoded.
pub fn encoded_len(value: u32) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else {
        5
    }
}

/// Appends the encoding of `value` to `out`.
pub fn encode_into(value: u32, out: &mut Vec<u8>) {
    let mut value = value;
    while value >= CONTINUATION as u32 {
        out.push((value as u8 & PAYLOAD_MASK) | CONTINUATION);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Encodes a single value.
pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    encode_into(value, &mut out);
    out
}

/// Lowers a whole symbol stream to bytes.
pub fn encode_all(symbols: &[u32]) -> Vec<u8> {
    let size = symbols.iter().map(|&s| encoded_len(s)).sum();
    let mut out = Vec::with_capacity(size);
    for &symbol in symbols {
        encode_into(symbol, &mut out);
    }
    out
}

/// Decodes the first value in `bytes`, returning it with the number of bytes
/// consumed.
///
/// # Errors
///
/// [`Error::MalformedInteger`] if `bytes` is empty or ends before a byte with
/// the continuation flag clear; [`Error::Overflow`] if the value needs more
/// than 32 bits.
pub fn decode_one(bytes: &[u8]) -> Result<(u32, usize), Error> {
    decode_at(bytes, 0)
}

fn decode_at(bytes: &[u8], start: usize) -> Result<(u32, usize), Error> {
    let mut value = 0u32;
    for (i, &byte) in bytes[start..].iter().enumerate() {
        if i == MAX_ENCODED_LEN - 1 && byte & (CONTINUATION | FIFTH_BYTE_OVERFLOW_MASK) != 0 {
            return Err(Error::Overflow { offset: start });
        }

        value |= ((byte & PAYLOAD_MASK) as u32) << (7 * i);

        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::MalformedInteger {
        offset: bytes.len(),
    })
}

/// Decodes every value in `bytes` into `out`, clearing it first.
///
/// `out` is typically a recycled buffer, so its capacity is kept.
pub fn decode_into(bytes: &[u8], out: &mut Vec<u32>) -> Result<(), Error> {
    out.clear();
    let mut pos = 0;
    while pos < bytes.len() {
        let (value, used) = decode_at(bytes, pos)?;
        out.push(value);
        pos += used;
    }
    Ok(())
}

/// Decodes every value in `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Vec<u32>, Error> {
    let mut out = Vec::with_capacity(bytes.len());
    decode_into(bytes, &mut out)?;
    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn single_value_roundtrip(value in any::<u32>()) {
            let bytes = encode(value);
            prop_assert_eq!(bytes.len(), encoded_len(value));
            prop_assert_eq!(decode_one(&bytes).unwrap(), (value, bytes.len()));
        }

        #[test]
        fn stream_roundtrip(symbols in proptest::collection::vec(any::<u32>(), 0..64)) {
            let bytes = encode_all(&symbols);
            prop_assert_eq!(decode(&bytes).unwrap(), symbols);
        }
    }
}
