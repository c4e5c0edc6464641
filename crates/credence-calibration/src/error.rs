//! Error types for calibration operations

use thiserror::Error;

/// Errors that can occur during calibration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// An input collection that must not be empty was empty
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    /// An argument is outside its valid range
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl CalibrationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalibrationError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for calibration operations
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Check that a probability-like argument is a number in [0, 1]
pub(crate) fn check_probability(field: &'static str, value: f64) -> CalibrationResult<()> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(CalibrationError::invalid(field, format!("must be in [0, 1], got {}", value)));
    }
    Ok(())
}
