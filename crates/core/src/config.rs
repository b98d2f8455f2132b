use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated env value into trimmed, non-empty items.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub vault: VaultConfig,
    pub chunking: ChunkingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `MNEME_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("MNEME_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            vault: VaultConfig::from_env_profiled(p),
            chunking: ChunkingConfig::from_env_profiled(p),
            logging: LoggingConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject settings the ingestion pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        if self.vault.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_FILE_SIZE_MB",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  vault:       path={}, extensions={:?}, exclude={:?}",
            self.vault.path.display(),
            self.vault.file_extensions,
            self.vault.exclude_folders
        );
        tracing::info!(
            "  chunking:    strategy={}, size={}, overlap={}",
            self.chunking.strategy,
            self.chunking.chunk_size,
            self.chunking.chunk_overlap
        );
        tracing::info!("  logging:     level={}", self.logging.level);
    }

    /// Return a JSON view of the active settings.
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "vault": {
                "path": self.vault.path,
                "file_extensions": self.vault.file_extensions,
                "exclude_folders": self.vault.exclude_folders,
                "max_file_size_mb": self.vault.max_file_size_mb,
            },
            "chunking": {
                "strategy": self.chunking.strategy,
                "chunk_size": self.chunking.chunk_size,
                "chunk_overlap": self.chunking.chunk_overlap,
            },
            "logging": { "level": self.logging.level },
        })
    }
}

// ── Vault ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub path: PathBuf,
    /// Extensions including the leading dot, e.g. ".md".
    pub file_extensions: Vec<String>,
    /// Folder names skipped anywhere in the tree.
    pub exclude_folders: Vec<String>,
    pub max_file_size_mb: u64,
}

impl VaultConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            path: PathBuf::from(profiled_env_or(p, "OBSIDIAN_VAULT_PATH", "/vault")),
            file_extensions: split_list(&profiled_env_or(
                p,
                "OBSIDIAN_FILE_EXTENSIONS",
                ".md,.markdown",
            )),
            exclude_folders: split_list(&profiled_env_or(
                p,
                "OBSIDIAN_EXCLUDE_FOLDERS",
                ".obsidian,.trash,templates",
            )),
            max_file_size_mb: profiled_env_u64(p, "MAX_FILE_SIZE_MB", 10),
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/vault"),
            file_extensions: vec![".md".to_string(), ".markdown".to_string()],
            exclude_folders: vec![
                ".obsidian".to_string(),
                ".trash".to_string(),
                "templates".to_string(),
            ],
            max_file_size_mb: 10,
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters repeated between consecutive fixed-window chunks.
    pub chunk_overlap: usize,
    /// "page", "recursive", "fixed" or "semantic". Unknown names fall back to page.
    pub strategy: String,
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            chunk_size: profiled_env_usize(p, "CHUNK_SIZE", 1000),
            chunk_overlap: profiled_env_usize(p, "CHUNK_OVERLAP", 200),
            strategy: profiled_env_or(p, "CHUNKING_STRATEGY", "recursive"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                reason: format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            strategy: "recursive".to_string(),
        }
    }
}

// ── Logging ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
}

impl LoggingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            level: profiled_env_or(p, "LOG_LEVEL", "info").to_lowercase(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
