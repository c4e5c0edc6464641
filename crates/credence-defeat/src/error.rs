//! Error types for defeat operations

use credence_domain::ConfidenceError;
use thiserror::Error;

/// Errors that can occur while reasoning about defeaters
#[derive(Error, Debug)]
pub enum DefeatError {
    /// Claim graph collaborator error
    #[error("Storage error: {0}")]
    Store(String),

    /// A defeater or confidence value failed validation
    #[error("Invalid confidence: {0}")]
    Confidence(#[from] ConfidenceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DefeatError {
    pub(crate) fn store<E: std::fmt::Display>(err: E) -> Self {
        DefeatError::Store(err.to_string())
    }
}
