use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Stored settings could not be read or parsed. Callers fall back to the
    /// default config.
    #[error("failed to load settings from {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// A submitted config was rejected.
    #[error("invalid settings: {0}")]
    Validation(String),

    #[error("failed to write settings to {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}
