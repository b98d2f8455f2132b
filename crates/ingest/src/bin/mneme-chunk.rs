//! mneme-chunk: chunk an Obsidian vault into JSONL records.
//!
//! Settings come from the environment (`.env` included, profiled through
//! `MNEME_PROFILE`); command-line flags override them.
//!
//! Records go to `--output` or stdout. Logs always go to stderr.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mneme_core::config::{load_dotenv, Config};
use mneme_ingest::{ChunkConfig, ChunkPipeline, Chunker, Vault};

// ── CLI ─────────────────────────────────────────────────────────────

/// Split vault notes into retrieval chunks.
#[derive(Parser, Debug)]
#[command(name = "mneme-chunk", version, about)]
struct Cli {
    /// Vault directory (overrides OBSIDIAN_VAULT_PATH).
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Chunking strategy: page, recursive, fixed or semantic.
    #[arg(long)]
    strategy: Option<String>,

    /// Maximum characters per chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive fixed-window chunks.
    #[arg(long)]
    overlap: Option<usize>,

    /// Write JSONL here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scan and chunk, print statistics, write no records.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.vault {
            config.vault.path = path.clone();
        }
        if let Some(strategy) = &self.strategy {
            config.chunking.strategy = strategy.clone();
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.chunk_overlap = overlap;
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    let mut config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(io::stderr)
        .init();

    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let chunker = Chunker::new(ChunkConfig::from(&config.chunking));
    let vault = Vault::open(&config.vault.path, &config.vault)
        .with_context(|| format!("failed to open vault {}", config.vault.path.display()))?;

    let output = ChunkPipeline::new(chunker).run(&vault);

    if cli.dry_run {
        let report = serde_json::json!({
            "config": config.summary_json(),
            "stats": output.stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            output
                .write_jsonl(BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), chunks = output.chunks.len(), "wrote chunks");
        }
        None => {
            output
                .write_jsonl(BufWriter::new(io::stdout().lock()))
                .context("failed to write chunks to stdout")?;
        }
    }
    Ok(())
}
