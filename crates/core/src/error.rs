use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
