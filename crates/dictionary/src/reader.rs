use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::DictionaryError;
use crate::format::{read_footer, FOOTER_BYTES};
use crate::table::{CodeTable, TableValue};

/// Reads one code table written by [`write_table`](crate::writer::write_table).
///
/// Returns the table together with the dictionary fingerprint recorded in its
/// footer. The file handle is closed before this function returns, whether
/// loading succeeds or not.
///
/// # Errors
///
/// [`DictionaryError::Io`] on any I/O failure, [`DictionaryError::Corrupt`]
/// if validation of the bytes fails (see [`parse_table`]).
pub fn read_table<V: TableValue>(
    path: &Path,
    magic: u32,
) -> Result<(CodeTable<V>, u32), DictionaryError> {
    let mut bytes = Vec::new();
    {
        let mut f = File::open(path)?;
        f.read_to_end(&mut bytes)?;
    }
    parse_table(&bytes, magic)
}

/// Parses a table dump held in memory.
///
/// # Validation
///
/// - The buffer must hold at least the 16-byte footer.
/// - The footer magic must equal `magic`.
/// - The CRC-32 of the data section must match the footer.
/// - `count` entries of at least 8 bytes each must fit in the data section.
/// - Entries must carry codes `1, 2, ..., count` in that order.
/// - Exactly `count` entries must fill the data section.
pub fn parse_table<V: TableValue>(
    bytes: &[u8],
    magic: u32,
) -> Result<(CodeTable<V>, u32), DictionaryError> {
    let corrupt = |reason: String| DictionaryError::corrupt(V::TABLE, reason);

    if bytes.len() < FOOTER_BYTES {
        return Err(corrupt(format!("file too small: {} bytes", bytes.len())));
    }

    let (data, mut footer_bytes) = bytes.split_at(bytes.len() - FOOTER_BYTES);
    let footer = read_footer(&mut footer_bytes)?;
    if footer.magic != magic {
        return Err(corrupt(format!("invalid magic: {:x}", footer.magic)));
    }
    if crc32fast::hash(data) != footer.data_crc {
        return Err(corrupt("data checksum mismatch".to_string()));
    }

    // each entry carries at least a code and a length
    if footer.count as u64 * 8 > data.len() as u64 {
        return Err(corrupt(format!(
            "count {} does not fit in {} data bytes",
            footer.count,
            data.len()
        )));
    }

    let mut rdr = data;
    let mut values = Vec::with_capacity(footer.count as usize);
    for expected in 1..=footer.count {
        let code = rdr
            .read_u32::<LittleEndian>()
            .map_err(|_| corrupt(format!("entry {} truncated", expected)))?;
        if code != expected {
            return Err(corrupt(format!("expected code {}, found {}", expected, code)));
        }
        let len = rdr
            .read_u32::<LittleEndian>()
            .map_err(|_| corrupt(format!("entry {} truncated", expected)))? as usize;
        if len > rdr.len() {
            return Err(corrupt(format!("entry {} value truncated", expected)));
        }
        let (value, rest) = rdr.split_at(len);
        values.push(V::from_bytes(value.to_vec())?);
        rdr = rest;
    }
    if !rdr.is_empty() {
        return Err(corrupt(format!("{} trailing bytes after last entry", rdr.len())));
    }

    Ok((CodeTable::from_ranked(values)?, footer.fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::AlignmentVector;
    use crate::format::{ALIGNMENT_MAGIC, TOKEN_MAGIC};
    use crate::writer::write_table;
    use tempfile::tempdir;

    fn sample_tokens() -> CodeTable<String> {
        CodeTable::from_ranked(vec!["the".into(), "cat".into(), "".into()]).unwrap()
    }

    // -------------------- Roundtrip --------------------

    #[test]
    fn write_then_read_tokens() -> Result<(), DictionaryError> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dict");
        write_table(&path, &sample_tokens(), TOKEN_MAGIC, 99)?;

        let (table, fingerprint) = read_table::<String>(&path, TOKEN_MAGIC)?;
        assert_eq!(fingerprint, 99);
        assert_eq!(table.len(), 3);
        assert_eq!(table.code_of_str("cat"), Some(2));
        assert_eq!(table.value(3).map(String::as_str), Some(""));
        Ok(())
    }

    #[test]
    fn write_then_read_alignments() -> Result<(), DictionaryError> {
        let dir = tempdir()?;
        let path = dir.path().join("a.dict");
        let a = AlignmentVector::parse("0-0 1-1")?;
        let table = CodeTable::from_ranked(vec![a.clone(), AlignmentVector::new()])?;
        write_table(&path, &table, ALIGNMENT_MAGIC, 1)?;

        let (loaded, _) = read_table::<AlignmentVector>(&path, ALIGNMENT_MAGIC)?;
        assert_eq!(loaded.code(&a), Some(1));
        assert_eq!(loaded.value(2), Some(&AlignmentVector::new()));
        Ok(())
    }

    // -------------------- Validation errors --------------------

    #[test]
    fn too_small() {
        let r = parse_table::<String>(b"short", TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
    }

    #[test]
    fn wrong_magic() -> Result<(), DictionaryError> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dict");
        write_table(&path, &sample_tokens(), TOKEN_MAGIC, 0)?;
        let r = read_table::<String>(&path, ALIGNMENT_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
        Ok(())
    }

    #[test]
    fn flipped_byte_fails_checksum() -> Result<(), DictionaryError> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dict");
        write_table(&path, &sample_tokens(), TOKEN_MAGIC, 0)?;

        let mut bytes = std::fs::read(&path)?;
        bytes[9] ^= 0x01;
        let r = parse_table::<String>(&bytes, TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let r = read_table::<String>(Path::new("/tmp/no_such_ptpack_table.dict"), TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Io(_))));
    }

    #[test]
    fn invalid_utf8_token() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[0xff, 0xfe]);
        let crc = crc32fast::hash(&data);
        for field in [1u32, 0, crc, TOKEN_MAGIC] {
            data.extend_from_slice(&field.to_le_bytes());
        }
        let r = parse_table::<String>(&data, TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
    }

    #[test]
    fn gap_in_codes() {
        let mut data = Vec::new();
        for (code, value) in [(1u32, b"a"), (3u32, b"b")] {
            data.extend_from_slice(&code.to_le_bytes());
            data.extend_from_slice(&1u32.to_le_bytes());
            data.extend_from_slice(value);
        }
        let crc = crc32fast::hash(&data);
        for field in [2u32, 0, crc, TOKEN_MAGIC] {
            data.extend_from_slice(&field.to_le_bytes());
        }
        let r = parse_table::<String>(&data, TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
    }

    #[test]
    fn inflated_count_is_corrupt() {
        let crc = crc32fast::hash(&[]);
        let mut data = Vec::new();
        for field in [0x8000_0003u32, 0, crc, TOKEN_MAGIC] {
            data.extend_from_slice(&field.to_le_bytes());
        }
        let r = parse_table::<String>(&data, TOKEN_MAGIC);
        assert!(matches!(r, Err(DictionaryError::Corrupt { .. })));
    }
}
