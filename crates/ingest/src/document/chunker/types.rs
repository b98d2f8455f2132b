//! Chunk configuration and output types.

use std::fmt;
use std::str::FromStr;

use mneme_core::config::ChunkingConfig;
use mneme_core::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// String-keyed metadata carried on every chunk.
pub type ChunkMetadata = Map<String, Value>;

// ── Strategy ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("unknown chunking strategy: {0}")]
pub struct UnknownStrategy(pub String);

/// How a document is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Whole document as a single chunk.
    Page,
    /// Structure-aware splitting: paragraphs, lines, sentences, words, characters.
    #[default]
    Recursive,
    /// Sliding character window with overlap.
    Fixed,
    /// Greedy sentence accumulation.
    Semantic,
}

impl ChunkStrategy {
    pub const ALL: [ChunkStrategy; 4] = [
        ChunkStrategy::Page,
        ChunkStrategy::Recursive,
        ChunkStrategy::Fixed,
        ChunkStrategy::Semantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Page => "page",
            ChunkStrategy::Recursive => "recursive",
            ChunkStrategy::Fixed => "fixed",
            ChunkStrategy::Semantic => "semantic",
        }
    }

    /// Lenient lookup used for settings: unknown names log a warning and
    /// resolve to [`ChunkStrategy::Page`].
    pub fn from_name(name: &str) -> Self {
        match name.parse() {
            Ok(strategy) => strategy,
            Err(UnknownStrategy(unknown)) => {
                tracing::warn!(strategy = %unknown, "unknown chunking strategy, using page");
                ChunkStrategy::Page
            }
        }
    }
}

impl FromStr for ChunkStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(ChunkStrategy::Page),
            "recursive" => Ok(ChunkStrategy::Recursive),
            "fixed" => Ok(ChunkStrategy::Fixed),
            "semantic" => Ok(ChunkStrategy::Semantic),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the chunking engine. Sizes are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk (default: 1000).
    pub max_chunk_size: usize,
    /// Characters shared by consecutive fixed-window chunks (default: 200).
    pub overlap: usize,
    /// Splitting strategy (default: recursive).
    pub strategy: ChunkStrategy,
}

impl ChunkConfig {
    pub fn new(max_chunk_size: usize, overlap: usize, strategy: ChunkStrategy) -> Self {
        Self {
            max_chunk_size,
            overlap,
            strategy,
        }
    }

    /// Upstream validation with the same rules as the process settings.
    /// The chunker itself tolerates invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ChunkingConfig::from(self).validate()
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap: 200,
            strategy: ChunkStrategy::Recursive,
        }
    }
}

impl From<&ChunkingConfig> for ChunkConfig {
    fn from(settings: &ChunkingConfig) -> Self {
        Self {
            max_chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
            strategy: ChunkStrategy::from_name(&settings.strategy),
        }
    }
}

impl From<&ChunkConfig> for ChunkingConfig {
    fn from(config: &ChunkConfig) -> Self {
        Self {
            chunk_size: config.max_chunk_size,
            chunk_overlap: config.overlap,
            strategy: config.strategy.as_str().to_string(),
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// One segment of a source document, ready for embedding.
///
/// Serializes to the flat record `content`, `chunk_id`, `start_char`,
/// `end_char`, `token_count`, `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed, non-empty chunk text.
    pub content: String,
    /// `{document_id}_chunk_{index}`, or `{document_id}_page` for page mode.
    #[serde(rename = "chunk_id")]
    pub id: String,
    /// Character offset into the untrimmed source text.
    #[serde(rename = "start_char")]
    pub start_offset: usize,
    /// Character offset into the untrimmed source text (exclusive).
    #[serde(rename = "end_char")]
    pub end_offset: usize,
    /// `chars(content) / 4`.
    #[serde(rename = "token_count")]
    pub token_estimate: usize,
    /// Caller metadata plus `chunk_index`, `chunking_strategy` and, for page
    /// mode, `total_chunks`.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// 0-based position among chunks from the same document.
    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata
            .get("chunk_index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
    }

    /// Flat record for downstream embedding and storage.
    pub fn to_record(&self) -> Value {
        json!({
            "content": self.content,
            "chunk_id": self.id,
            "start_char": self.start_offset,
            "end_char": self.end_offset,
            "token_count": self.token_estimate,
            "metadata": self.metadata,
        })
    }
}
