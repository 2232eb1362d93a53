//! # Packfile
//!
//! Sequential container for packed phrase-table groups: each entry pairs a
//! lookup key (the source phrase) with the packed buffer of every record
//! stored under it.
//!
//! ## File layout
//!
//! ```text
//! HEADER   magic (u32 LE) "PTK1" | dictionary fingerprint (u32 LE)
//! ENTRY    record_len (u32) | crc (u32) | key_len (u32) | key | buf_len (u32) | buf
//!          ... repeated ...
//! ```
//!
//! `record_len` counts the crc and the body; `crc` covers the body. The
//! header ties the file to the dictionary it was encoded with, so a reader
//! can refuse to decode it with any other.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

/// Magic number at the start of every pack file (ASCII "PTK1").
pub const PACK_MAGIC: u32 = 0x5054_4B31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    pub key: String,
    pub buf: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not a pack file (magic {0:x})")]
    BadMagic(u32),
    #[error("corrupt record")]
    Corrupt,
}

/// Writes entries to a new pack file, optionally syncing after each one.
pub struct PackWriter {
    out: BufWriter<File>,
    sync: bool,
    entries: u64,
}

impl PackWriter {
    /// Creates (or truncates) `path` and writes the header.
    pub fn create<P: AsRef<Path>>(path: P, fingerprint: u32, sync: bool) -> Result<Self, PackError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut out = BufWriter::new(file);
        out.write_u32::<LittleEndian>(PACK_MAGIC)?;
        out.write_u32::<LittleEndian>(fingerprint)?;
        Ok(Self {
            out,
            sync,
            entries: 0,
        })
    }

    /// Appends one entry.
    pub fn append(&mut self, entry: &PackEntry) -> Result<(), PackError> {
        let mut body = Vec::with_capacity(8 + entry.key.len() + entry.buf.len());
        body.write_u32::<LittleEndian>(entry.key.len() as u32)?;
        body.extend_from_slice(entry.key.as_bytes());
        body.write_u32::<LittleEndian>(entry.buf.len() as u32)?;
        body.extend_from_slice(&entry.buf);

        let mut hasher = Crc32::new();
        hasher.update(&body);
        let crc = hasher.finalize();

        let record_len = body.len() as u32 + 4 /*crc*/;
        self.out.write_u32::<LittleEndian>(record_len)?;
        self.out.write_u32::<LittleEndian>(crc)?;
        self.out.write_all(&body)?;
        self.entries += 1;

        if self.sync {
            self.out.flush()?;
            self.out.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Number of entries appended so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Flushes buffered entries and syncs the file.
    pub fn finish(mut self) -> Result<(), PackError> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(())
    }
}

/// Reads a pack file front to back.
pub struct PackReader<R: Read> {
    rdr: BufReader<R>,
    fingerprint: u32,
}

impl PackReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PackReader<File>, PackError> {
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read> PackReader<R> {
    /// Reads and checks the header.
    pub fn from_reader(reader: R) -> Result<Self, PackError> {
        let mut rdr = BufReader::new(reader);
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != PACK_MAGIC {
            return Err(PackError::BadMagic(magic));
        }
        let fingerprint = rdr.read_u32::<LittleEndian>()?;
        Ok(Self { rdr, fingerprint })
    }

    /// Fingerprint of the dictionary the entries were encoded with.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Reads the next entry. `Ok(None)` at a clean end of file; a torn or
    /// mismatching entry is [`PackError::Corrupt`].
    pub fn next_entry(&mut self) -> Result<Option<PackEntry>, PackError> {
        if self.rdr.fill_buf()?.is_empty() {
            return Ok(None);
        }
        let record_len = self.rdr.read_u32::<LittleEndian>().map_err(torn)?;
        if record_len < 4 + 8 {
            return Err(PackError::Corrupt);
        }

        let crc = self.rdr.read_u32::<LittleEndian>().map_err(torn)?;
        let body_len = (record_len - 4) as usize;
        let mut body = Vec::new();
        (&mut self.rdr).take(body_len as u64).read_to_end(&mut body)?;
        if body.len() != body_len {
            return Err(PackError::Corrupt);
        }

        let mut hasher = Crc32::new();
        hasher.update(&body);
        if hasher.finalize() != crc {
            return Err(PackError::Corrupt);
        }

        let mut br = &body[..];
        let key_len = br.read_u32::<LittleEndian>().map_err(torn)? as usize;
        if key_len > br.len() {
            return Err(PackError::Corrupt);
        }
        let (key, mut rest) = br.split_at(key_len);
        let key = String::from_utf8(key.to_vec()).map_err(|_| PackError::Corrupt)?;
        let buf_len = rest.read_u32::<LittleEndian>().map_err(torn)? as usize;
        if buf_len != rest.len() {
            return Err(PackError::Corrupt);
        }

        Ok(Some(PackEntry {
            key,
            buf: rest.to_vec(),
        }))
    }

    /// Calls `apply` for every entry in file order, stopping at the first
    /// corrupt one.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), PackError>
    where
        F: FnMut(PackEntry),
    {
        while let Some(entry) = self.next_entry()? {
            apply(entry);
        }
        Ok(())
    }
}

fn torn(e: io::Error) -> PackError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        PackError::Corrupt
    } else {
        PackError::Io(e)
    }
}
