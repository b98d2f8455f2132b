//! Vault discovery.
//!
//! Walks a note directory with `walkdir`, extracts every note whose extension
//! is configured, skips excluded folders and oversized files, and builds a
//! backlink index (link target → notes linking to it). Per-file failures are
//! logged and counted, never fatal.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mneme_core::config::VaultConfig;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::document::{extract_note, ExtractionError, NoteDocument};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Vault path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Parsed notes of one vault plus their backlink index.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    notes: Vec<NoteDocument>,
    failed: usize,
    backlinks: BTreeMap<String, BTreeSet<String>>,
}

impl Vault {
    /// Scan `root` recursively and extract every matching note.
    pub fn open(root: &Path, config: &VaultConfig) -> Result<Self, VaultError> {
        if !root.exists() {
            return Err(VaultError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(VaultError::NotADirectory(root.to_path_buf()));
        }
        info!(path = %root.display(), "scanning vault");

        let extensions: Vec<String> = config
            .file_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        let limit = config.max_file_size_bytes();

        let mut notes = Vec::new();
        let mut failed = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e, &config.exclude_folders));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !has_extension(entry.path(), &extensions) {
                continue;
            }
            match read_note(root, entry.path(), limit) {
                Ok(note) => {
                    debug!(
                        title = %note.title,
                        links = note.wikilinks.len(),
                        tags = note.tags.len(),
                        "parsed note"
                    );
                    notes.push(note);
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping note");
                    failed += 1;
                }
            }
        }

        let vault = Self::from_notes(root, notes, failed);
        info!(
            notes = vault.notes.len(),
            failed,
            backlink_targets = vault.backlinks.len(),
            "vault scanned"
        );
        Ok(vault)
    }

    /// Build a vault from already extracted notes.
    pub fn from_notes(root: &Path, mut notes: Vec<NoteDocument>, failed: usize) -> Self {
        notes.sort_by(|a, b| a.path.cmp(&b.path));

        let mut backlinks: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for note in &notes {
            let source = note.path.to_string_lossy().into_owned();
            for link in &note.wikilinks {
                backlinks
                    .entry(link.clone())
                    .or_default()
                    .insert(source.clone());
            }
        }

        Self {
            root: root.to_path_buf(),
            notes,
            failed,
            backlinks,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes(&self) -> &[NoteDocument] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Matching files that could not be read or extracted.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Paths of notes linking to `target`, sorted.
    pub fn backlinks(&self, target: &str) -> Vec<String> {
        self.backlinks
            .get(target)
            .map(|sources| sources.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| exclude.iter().any(|x| x == name))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| extensions.contains(&e))
}

fn read_note(root: &Path, path: &Path, limit: u64) -> Result<NoteDocument, VaultError> {
    let io_err = |source| VaultError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = fs::metadata(path).map_err(io_err)?;
    if meta.len() > limit {
        return Err(VaultError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit,
        });
    }
    let bytes = fs::read(path).map_err(io_err)?;
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut note = extract_note(&bytes, relative)?;

    // Front-matter dates win over filesystem timestamps.
    if note.created_at.is_none() {
        note.created_at = meta.created().ok().map(DateTime::<Utc>::from);
    }
    if note.modified_at.is_none() {
        note.modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "Home.md", "# Home\n\nStart at [[Projects]] and [[Inbox]].");
        write(root, "Projects.md", "---\ntitle: Projects\n---\nSee [[Inbox|the inbox]].");
        write(root, "areas/Inbox.markdown", "Inbox body #todo");
        write(root, ".obsidian/workspace.md", "[[Projects]]");
        write(root, "templates/Daily.md", "[[Inbox]]");
        write(root, "attachments/image.png", "not a note");
        write(root, "notes.txt", "plain text note");
        tmp
    }

    #[test]
    fn discovers_notes_and_skips_excluded_folders() {
        let tmp = setup();
        let vault = Vault::open(tmp.path(), &VaultConfig::default()).unwrap();
        let paths: Vec<String> = vault
            .notes()
            .iter()
            .map(|n| n.path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(paths, vec!["Home.md", "Projects.md", "areas/Inbox.markdown"]);
        assert_eq!(vault.failed(), 0);
        assert_eq!(vault.root(), tmp.path());
    }

    #[test]
    fn configured_extensions_are_honoured() {
        let tmp = setup();
        let config = VaultConfig {
            file_extensions: vec![".txt".to_string()],
            ..VaultConfig::default()
        };
        let vault = Vault::open(tmp.path(), &config).unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.notes()[0].title, "notes");
    }

    #[test]
    fn builds_backlink_index() {
        let tmp = setup();
        let vault = Vault::open(tmp.path(), &VaultConfig::default()).unwrap();
        assert_eq!(vault.backlinks("Inbox"), vec!["Home.md", "Projects.md"]);
        assert_eq!(vault.backlinks("Projects"), vec!["Home.md"]);
        assert!(vault.backlinks("Nowhere").is_empty());
    }

    #[test]
    fn fills_timestamps_from_filesystem() {
        let tmp = setup();
        let vault = Vault::open(tmp.path(), &VaultConfig::default()).unwrap();
        assert!(vault.notes().iter().all(|n| n.modified_at.is_some()));
    }

    #[test]
    fn oversized_files_are_counted_as_failed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "small.md", "ok");
        write(tmp.path(), "big.md", &"x".repeat(2 * 1024 * 1024));
        let config = VaultConfig {
            max_file_size_mb: 1,
            ..VaultConfig::default()
        };
        let vault = Vault::open(tmp.path(), &config).unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.failed(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = Vault::open(&tmp.path().join("nope"), &VaultConfig::default()).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[test]
    fn file_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "note.md", "x");
        let err = Vault::open(&tmp.path().join("note.md"), &VaultConfig::default()).unwrap_err();
        assert!(matches!(err, VaultError::NotADirectory(_)));
    }
}
