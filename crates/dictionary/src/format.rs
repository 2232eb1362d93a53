//! Table dump constants and footer read/write helpers.
//!
//! The footer is always the **last 16 bytes** of a table file:
//!
//! ```text
//! [count: u32 LE][fingerprint: u32 LE][data_crc: u32 LE][magic: u32 LE]
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result as IoResult, Write};

/// Magic number of the target-phrase token table (ASCII "PTD1").
pub const TOKEN_MAGIC: u32 = 0x5054_4431;

/// Magic number of the alignment table (ASCII "PTA1").
pub const ALIGNMENT_MAGIC: u32 = 0x5054_4131;

/// File name of the token table inside a dictionary directory.
pub const TOKEN_FILE: &str = "target_phrases.dict";

/// File name of the alignment table inside a dictionary directory.
pub const ALIGNMENT_FILE: &str = "alignments.dict";

/// Size of the footer in bytes: four `u32` fields.
pub const FOOTER_BYTES: usize = 4 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Number of `(code, value)` entries in the data section.
    pub count: u32,
    /// Fingerprint of the dictionary this table belongs to.
    pub fingerprint: u32,
    /// CRC-32 of the data section.
    pub data_crc: u32,
    pub magic: u32,
}

pub fn write_footer<W: Write>(w: &mut W, footer: &Footer) -> IoResult<()> {
    w.write_u32::<LittleEndian>(footer.count)?;
    w.write_u32::<LittleEndian>(footer.fingerprint)?;
    w.write_u32::<LittleEndian>(footer.data_crc)?;
    w.write_u32::<LittleEndian>(footer.magic)?;
    Ok(())
}

/// Reads a footer from exactly [`FOOTER_BYTES`] bytes.
pub fn read_footer<R: Read>(r: &mut R) -> IoResult<Footer> {
    Ok(Footer {
        count: r.read_u32::<LittleEndian>()?,
        fingerprint: r.read_u32::<LittleEndian>()?,
        data_crc: r.read_u32::<LittleEndian>()?,
        magic: r.read_u32::<LittleEndian>()?,
    })
}
