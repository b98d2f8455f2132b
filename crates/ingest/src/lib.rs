//! Note ingestion: vault discovery, note extraction and chunking.
//!
//! Flow: [`Vault::open`] → [`ChunkPipeline::run`] → JSONL chunk records.

pub mod document;
pub mod pipeline;
pub mod vault;

pub use document::chunker::{Chunk, ChunkConfig, ChunkStrategy, Chunker};
pub use document::{extract_note, NoteDocument};
pub use pipeline::{ChunkPipeline, PipelineOutput, PipelineStats};
pub use vault::{Vault, VaultError};
