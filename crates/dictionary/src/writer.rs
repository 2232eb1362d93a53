use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{rename, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::DictionaryError;
use crate::format::{write_footer, Footer};
use crate::table::{CodeTable, TableValue};

/// Serializes the data section of a table: `code | value_len | value` per
/// entry, ascending code order.
pub(crate) fn encode_entries<V: TableValue>(table: &CodeTable<V>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    for (code, value) in table.iter() {
        let bytes = value.as_bytes();
        buf.write_u32::<LittleEndian>(code)?;
        buf.write_u32::<LittleEndian>(bytes.len() as u32)?;
        buf.extend_from_slice(bytes);
    }
    Ok(buf)
}

/// Writes one code table to `path`.
///
/// # File Layout
///
/// ```text
/// [DATA]   repeated: code(u32) | value_len(u32) | value
/// [FOOTER] count(u32) | fingerprint(u32) | data_crc(u32) | magic(u32)
/// ```
///
/// # Crash Safety
///
/// Writes to `path.tmp`, calls `sync_all()`, then atomically renames. A crash
/// mid-write leaves the previous table (if any) untouched.
pub fn write_table<V: TableValue>(
    path: &Path,
    table: &CodeTable<V>,
    magic: u32,
    fingerprint: u32,
) -> Result<(), DictionaryError> {
    let data = encode_entries(table)?;

    let mut hasher = Crc32::new();
    hasher.update(&data);
    let footer = Footer {
        count: table.len() as u32,
        fingerprint,
        data_crc: hasher.finalize(),
        magic,
    };

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;

    file.write_all(&data)?;
    write_footer(&mut file, &footer)?;

    file.flush()?;
    file.sync_all()?;
    drop(file);

    rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{read_footer, FOOTER_BYTES, TOKEN_MAGIC};
    use tempfile::tempdir;

    #[test]
    fn write_and_inspect_footer() -> Result<(), DictionaryError> {
        let dir = tempdir()?;
        let path = dir.path().join("tokens.dict");

        let table = CodeTable::from_ranked(vec!["the".to_string(), "cat".to_string()])?;
        write_table(&path, &table, TOKEN_MAGIC, 42)?;

        let bytes = std::fs::read(&path)?;
        // 2 entries * (4 + 4) header bytes + "the" + "cat" + footer
        assert_eq!(bytes.len(), 16 + 6 + FOOTER_BYTES);

        let footer = read_footer(&mut &bytes[bytes.len() - FOOTER_BYTES..])?;
        assert_eq!(footer.count, 2);
        assert_eq!(footer.fingerprint, 42);
        assert_eq!(footer.magic, TOKEN_MAGIC);
        assert_eq!(footer.data_crc, crc32fast::hash(&bytes[..bytes.len() - FOOTER_BYTES]));

        // no temp file left behind
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }
}
