//! Chunking pipeline: vault notes → chunks with note metadata attached.
//!
//! Notes are chunked in parallel with rayon; the shared [`Chunker`] holds no
//! mutable state. Output keeps vault order.

use std::io::Write;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::document::chunker::{Chunk, Chunker};
use crate::document::NoteDocument;
use crate::vault::Vault;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Notes extracted from the vault.
    pub notes_parsed: usize,
    /// Notes that produced no chunks (empty body).
    pub notes_skipped: usize,
    /// Matching files that could not be read or extracted.
    pub files_failed: usize,
    pub chunks_created: usize,
    /// Sum of chunk token estimates.
    pub total_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub chunks: Vec<Chunk>,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// Write one flat JSON record per chunk, newline separated.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for chunk in &self.chunks {
            serde_json::to_writer(&mut writer, &chunk.to_record())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

pub struct ChunkPipeline {
    chunker: Chunker,
}

impl ChunkPipeline {
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Chunk a single note body with its metadata and backlinks.
    pub fn chunk_note(&self, note: &NoteDocument, backlinks: &[String]) -> Vec<Chunk> {
        let metadata = note.metadata(backlinks);
        self.chunker
            .chunk(&note.body, Some(&metadata), Some(&note.note_id()))
    }

    pub fn run(&self, vault: &Vault) -> PipelineOutput {
        let per_note: Vec<Vec<Chunk>> = vault
            .notes()
            .par_iter()
            .map(|note| self.chunk_note(note, &vault.backlinks(&note.title)))
            .collect();

        let mut stats = PipelineStats {
            notes_parsed: vault.len(),
            files_failed: vault.failed(),
            ..PipelineStats::default()
        };
        let mut chunks = Vec::new();
        for note_chunks in per_note {
            if note_chunks.is_empty() {
                stats.notes_skipped += 1;
                continue;
            }
            stats.total_tokens += note_chunks.iter().map(|c| c.token_estimate).sum::<usize>();
            chunks.extend(note_chunks);
        }
        stats.chunks_created = chunks.len();

        info!(
            notes = stats.notes_parsed,
            skipped = stats.notes_skipped,
            failed = stats.files_failed,
            chunks = stats.chunks_created,
            tokens = stats.total_tokens,
            strategy = %self.chunker.strategy(),
            "chunking complete"
        );
        PipelineOutput { chunks, stats }
    }
}
