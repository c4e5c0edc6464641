//! Errors reported by the `credence` binary.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by every command.
pub type Result<T> = std::result::Result<T, CliError>;

/// Failures a command can report.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file is not valid TOML for the expected sections
    #[error("Invalid config file '{}': {source}", path.display())]
    ConfigParse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// Claim store error
    #[error("Store error: {0}")]
    Store(#[from] credence_store::StoreError),

    /// Defeat propagation error
    #[error("Defeat error: {0}")]
    Defeat(#[from] credence_defeat::DefeatError),

    /// Calibration error
    #[error("Calibration error: {0}")]
    Calibration(#[from] credence_calibration::CalibrationError),

    /// Input document is not the JSON the command expects
    #[error("Cannot parse '{input}': {source}")]
    InputParse {
        /// File name, or `-` for stdin
        input: String,
        /// Parser error
        source: serde_json::Error,
    },

    /// A result could not be rendered as JSON
    #[error("Cannot render output: {0}")]
    Render(#[source] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Argument or input content rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Claim not in the store
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),
}
