/// Codec engine that ties together the dictionary, record and packfile layers.
use anyhow::{bail, Context, Result};
use dictionary::Dictionary;
use packfile::{PackEntry, PackReader, PackWriter};
use record::{
    build_dictionary, group_by_source, DecodedRecord, Decoder, Encoder, Pooled, RawRecord,
    RecordPool,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, info};

/// Reads a phrase-table text file, one record per non-blank line.
///
/// # Errors
///
/// Fails on the first line that does not have the four mandatory fields; the
/// error names the file and line number.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;

    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = RawRecord::parse_line(&line)
            .with_context(|| format!("{}:{}", path.display(), n + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Counts every target token and alignment in `records`, then saves the
/// resulting dictionary under `dict_dir`.
pub fn build_and_save<P: AsRef<Path>>(records: &[RawRecord], dict_dir: P) -> Result<Dictionary> {
    let dict_dir = dict_dir.as_ref();
    let dict = build_dictionary(records).context("building dictionary")?;
    dict.save(dict_dir)
        .with_context(|| format!("saving dictionary to {}", dict_dir.display()))?;
    Ok(dict)
}

/// Totals reported by [`Engine::encode_corpus`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    pub groups: u64,
    pub records: u64,
    /// Size of the records as text lines, newlines included.
    pub text_bytes: u64,
    /// Size of the packed buffers alone.
    pub packed_bytes: u64,
}

impl EncodeStats {
    /// Packed size as a fraction of text size.
    pub fn ratio(&self) -> f64 {
        if self.text_bytes == 0 {
            return 0.0;
        }
        self.packed_bytes as f64 / self.text_bytes as f64
    }
}

/// Totals reported by [`Engine::decode_pack`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    pub groups: u64,
    pub records: u64,
}

/// Outcome of [`Engine::verify_corpus`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub groups: u64,
    pub records: u64,
    /// Keys whose decoded records differ from the input.
    pub mismatches: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// The codec engine behind the `ptpack` commands.
///
/// # Encode Path
///
/// 1. Records sharing a source phrase are encoded together into one buffer.
/// 2. The buffer is appended to a pack file under the source phrase.
///
/// # Decode Path
///
/// 1. The pack header fingerprint must match the loaded dictionary.
/// 2. Each buffer is decoded with records and scratch space drawn from the
///    engine's [`RecordPool`], then rendered back to text lines.
///
/// An engine is single-threaded: its pool is not `Sync`.
pub struct Engine {
    dict: Dictionary,
    pool: RecordPool,
    num_scores: usize,
    num_lex_scores: usize,
}

impl Engine {
    pub fn new(dict: Dictionary, num_scores: usize, num_lex_scores: usize, pool_limit: usize) -> Self {
        Self {
            dict,
            pool: RecordPool::with_capacity_limit(pool_limit),
            num_scores,
            num_lex_scores,
        }
    }

    /// Loads the dictionary saved under `dict_dir` and wraps it in an engine.
    pub fn open<P: AsRef<Path>>(
        dict_dir: P,
        num_scores: usize,
        num_lex_scores: usize,
        pool_limit: usize,
    ) -> Result<Self> {
        let dict_dir = dict_dir.as_ref();
        let dict = Dictionary::load(dict_dir)
            .with_context(|| format!("loading dictionary from {}", dict_dir.display()))?;
        Ok(Self::new(dict, num_scores, num_lex_scores, pool_limit))
    }

    /// Drops the dictionary's forward maps. The engine can still decode but
    /// every encode fails with `ReadOnlyDictionary`.
    pub fn into_decode_only(self) -> Self {
        Self {
            dict: self.dict.into_decode_only(),
            ..self
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn pool(&self) -> &RecordPool {
        &self.pool
    }

    fn decoder(&self) -> Decoder<'_> {
        Decoder::new(&self.dict, self.num_scores, self.num_lex_scores)
    }

    /// Encodes records that share one lookup key into a single buffer.
    pub fn encode_group(&self, records: &[RawRecord]) -> Result<Vec<u8>> {
        let key = records.first().map(|r| r.source_phrase.as_str()).unwrap_or("");
        Encoder::new(&self.dict)
            .encode_group(records)
            .with_context(|| format!("encoding records for {:?}", key))
    }

    /// Decodes every record in `buf`. The records go back to the pool when
    /// the returned guards are dropped.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<Pooled<'_, DecodedRecord>>> {
        Ok(self.decoder().decode(buf, &self.pool)?)
    }

    /// Decodes `buf` and renders each record as a text line keyed by `source`.
    pub fn render(&self, source: &str, buf: &[u8]) -> Result<Vec<String>> {
        let records = self
            .decode(buf)
            .with_context(|| format!("decoding records for {:?}", source))?;
        let mut lines = Vec::with_capacity(records.len());
        for r in &records {
            lines.push(r.to_line(source, &self.dict)?);
        }
        Ok(lines)
    }

    /// Encodes and decodes one group in memory, returning whether every
    /// decoded record matches its input.
    pub fn verify_group(&self, records: &[RawRecord]) -> Result<bool> {
        let buf = self.encode_group(records)?;
        let decoded = self.decode(&buf)?;
        if decoded.len() != records.len() {
            return Ok(false);
        }
        for (d, r) in decoded.iter().zip(records) {
            if !d.matches(r, &self.dict)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Groups `records` by source phrase and appends one pack entry per group
    /// to a new pack file at `out`.
    ///
    /// # Errors
    ///
    /// Any record the dictionary cannot encode aborts the whole run; the
    /// partial pack file is left behind.
    pub fn encode_corpus<P: AsRef<Path>>(
        &self,
        records: &[RawRecord],
        out: P,
        sync: bool,
    ) -> Result<EncodeStats> {
        let out = out.as_ref();
        let mut writer = PackWriter::create(out, self.dict.fingerprint(), sync)
            .with_context(|| format!("creating pack file {}", out.display()))?;

        let mut stats = EncodeStats::default();
        for group in group_by_source(records) {
            let buf = self.encode_group(group)?;

            stats.groups += 1;
            stats.records += group.len() as u64;
            stats.text_bytes += group.iter().map(|r| r.to_line().len() as u64 + 1).sum::<u64>();
            stats.packed_bytes += buf.len() as u64;

            writer.append(&PackEntry {
                key: group[0].source_phrase.clone(),
                buf,
            })?;
        }
        writer.finish()?;

        info!(
            groups = stats.groups,
            records = stats.records,
            text_bytes = stats.text_bytes,
            packed_bytes = stats.packed_bytes,
            ratio = %format!("{:.3}", stats.ratio()),
            "encoded corpus"
        );
        Ok(stats)
    }

    /// Decodes every entry of the pack file at `input`, writing one text line
    /// per record to `out`.
    ///
    /// # Errors
    ///
    /// Refuses a pack written with a different dictionary before decoding
    /// anything. Corrupt entries and undecodable buffers are fatal.
    pub fn decode_pack<P: AsRef<Path>, W: Write>(&self, input: P, out: &mut W) -> Result<DecodeStats> {
        let input = input.as_ref();
        let mut reader = PackReader::open(input)
            .with_context(|| format!("opening pack file {}", input.display()))?;

        if reader.fingerprint() != self.dict.fingerprint() {
            bail!(
                "pack file {} was encoded with dictionary {:08x}, loaded dictionary is {:08x}",
                input.display(),
                reader.fingerprint(),
                self.dict.fingerprint()
            );
        }

        let mut stats = DecodeStats::default();
        while let Some(entry) = reader.next_entry()? {
            let lines = self.render(&entry.key, &entry.buf)?;
            for line in &lines {
                writeln!(out, "{}", line)?;
            }
            stats.groups += 1;
            stats.records += lines.len() as u64;
        }

        debug!(groups = stats.groups, records = stats.records, "decoded pack");
        Ok(stats)
    }

    /// Round-trips every group of `records` in memory.
    pub fn verify_corpus(&self, records: &[RawRecord]) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for group in group_by_source(records) {
            report.groups += 1;
            report.records += group.len() as u64;
            if !self.verify_group(group)? {
                report.mismatches.push(group[0].source_phrase.clone());
            }
        }

        info!(
            groups = report.groups,
            records = report.records,
            mismatches = report.mismatches.len(),
            "verified corpus"
        );
        Ok(report)
    }
}
