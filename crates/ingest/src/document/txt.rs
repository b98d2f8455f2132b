use std::path::Path;

use serde_json::Map;

use super::{decode, NoteDocument};

pub fn extract_txt(bytes: &[u8], path: &Path, stem: &str) -> NoteDocument {
    let text = decode(bytes);

    NoteDocument {
        path: path.to_path_buf(),
        file_type: "txt".to_string(),
        title: stem.to_string(),
        body: text.trim().to_string(),
        frontmatter: Map::new(),
        wikilinks: Vec::new(),
        tags: Vec::new(),
        headings: Vec::new(),
        created_at: None,
        modified_at: None,
    }
}
