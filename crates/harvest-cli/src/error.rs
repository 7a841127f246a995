//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Job file parsing error
    #[error("Job file parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Archival store error
    #[error("Source error: {0}")]
    Source(#[from] harvest_domain::SourceError),

    /// Row store error
    #[error("Row store error: {0}")]
    Store(#[from] harvest_store::StoreError),
}
