mod config;
mod engine;
mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::engine::{build_and_save, read_corpus, Engine};

/// Build, encode and decode compact phrase-table payloads.
#[derive(Debug, Parser)]
#[command(name = "ptpack", version, about)]
struct Cli {
    /// Config file; defaults to ./ptpack.toml when present.
    #[arg(short, long, global = true, env = "PTPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the dictionary tables.
    #[arg(long, global = true)]
    dict_dir: Option<PathBuf>,

    /// Feature scores per record.
    #[arg(long, global = true)]
    num_scores: Option<usize>,

    /// Lexical scores per record.
    #[arg(long, global = true)]
    num_lex_scores: Option<usize>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count tokens and alignments in a corpus and save the dictionary.
    Build { corpus: PathBuf },
    /// Encode a corpus into a pack file, one entry per source phrase.
    Encode { corpus: PathBuf, out: PathBuf },
    /// Decode a pack file to phrase-table lines on stdout.
    Decode { input: PathBuf },
    /// Encode and decode a corpus in memory and compare.
    Verify { corpus: PathBuf },
}

impl Cli {
    /// Applies command-line overrides on top of the loaded settings.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::new(self.config.as_ref()).context("loading configuration")?;
        if let Some(dir) = &self.dict_dir {
            settings.dict_dir = dir.clone();
        }
        if let Some(n) = self.num_scores {
            settings.num_scores = n;
        }
        if let Some(n) = self.num_lex_scores {
            settings.num_lex_scores = n;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn open_engine(settings: &Settings) -> Result<Engine> {
    let engine = Engine::open(
        &settings.dict_dir,
        settings.num_scores,
        settings.num_lex_scores,
        settings.pool_limit,
    )?;
    debug!(
        fingerprint = %format!("{:08x}", engine.dictionary().fingerprint()),
        tokens = engine.dictionary().tokens().len(),
        alignments = engine.dictionary().alignments().len(),
        "engine ready"
    );
    Ok(engine)
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings()?;

    match cli.command {
        Command::Build { corpus } => {
            let records = read_corpus(&corpus)?;
            let dict = build_and_save(&records, &settings.dict_dir)?;
            info!(
                records = records.len(),
                tokens = dict.tokens().len(),
                alignments = dict.alignments().len(),
                dir = %settings.dict_dir.display(),
                "dictionary built"
            );
        }
        Command::Encode { corpus, out } => {
            let records = read_corpus(&corpus)?;
            let engine = open_engine(&settings)?;
            engine.encode_corpus(&records, &out, settings.pack_sync)?;
        }
        Command::Decode { input } => {
            let engine = open_engine(&settings)?.into_decode_only();
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let stats = engine.decode_pack(&input, &mut out)?;
            out.flush()?;
            info!(
                groups = stats.groups,
                records = stats.records,
                records_allocated = engine.pool().records_allocated(),
                "decoded pack"
            );
        }
        Command::Verify { corpus } => {
            let records = read_corpus(&corpus)?;
            let engine = open_engine(&settings)?;
            let report = engine.verify_corpus(&records)?;
            if !report.is_clean() {
                for key in &report.mismatches {
                    error!(key = %key, "round trip mismatch");
                }
                bail!("{} of {} groups did not round-trip", report.mismatches.len(), report.groups);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.json);
    run(cli)
}
