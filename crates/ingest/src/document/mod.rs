pub mod chunker;
mod md;
mod txt;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use chunker::ChunkMetadata;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// A note read from the vault, with front-matter removed from `body`.
#[derive(Debug, Clone)]
pub struct NoteDocument {
    /// Path relative to the vault root.
    pub path: PathBuf,
    /// File type: "md" or "txt".
    pub file_type: String,
    /// Front-matter `title`, or the file stem.
    pub title: String,
    /// Note text without front-matter, trimmed.
    pub body: String,
    /// Parsed YAML front-matter (empty when absent or invalid).
    pub frontmatter: Map<String, Value>,
    /// Link targets from `[[...]]`, in order of appearance.
    pub wikilinks: Vec<String>,
    /// Inline and front-matter tags without `#`, sorted and unique.
    pub tags: Vec<String>,
    /// Markdown heading texts.
    pub headings: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl NoteDocument {
    /// Stable document id: the vault-relative path without extension.
    pub fn note_id(&self) -> String {
        self.path
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Metadata attached to every chunk of this note. Front-matter keys are
    /// merged last and win over the derived ones.
    pub fn metadata(&self, backlinks: &[String]) -> ChunkMetadata {
        let mut metadata = ChunkMetadata::new();
        metadata.insert("title".to_string(), json!(self.title));
        metadata.insert(
            "file_path".to_string(),
            json!(self.path.to_string_lossy()),
        );
        metadata.insert("tags".to_string(), json!(self.tags));
        metadata.insert("wikilinks".to_string(), json!(self.wikilinks));
        metadata.insert("headings".to_string(), json!(self.headings));
        metadata.insert("backlinks".to_string(), json!(backlinks));
        metadata.insert("backlink_count".to_string(), json!(backlinks.len()));
        metadata.insert(
            "created_at".to_string(),
            json!(self.created_at.map(|t| t.to_rfc3339())),
        );
        metadata.insert(
            "modified_at".to_string(),
            json!(self.modified_at.map(|t| t.to_rfc3339())),
        );
        for (key, value) in &self.frontmatter {
            metadata.insert(key.clone(), value.clone());
        }
        metadata
    }
}

/// Extract a note from file bytes based on the extension of `path`.
pub fn extract_note(bytes: &[u8], path: &Path) -> Result<NoteDocument, ExtractionError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match ext.as_str() {
        "md" | "markdown" => Ok(md::extract_md(bytes, path, &stem)),
        "txt" | "text" => Ok(txt::extract_txt(bytes, path, &stem)),
        other => Err(ExtractionError::UnsupportedType(other.to_string())),
    }
}

/// Decode as UTF-8, falling back to lossy conversion.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}
