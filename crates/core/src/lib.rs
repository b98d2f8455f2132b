pub mod config;
pub mod error;

pub use config::{ChunkingConfig, Config, LoggingConfig, VaultConfig};
pub use error::*;
