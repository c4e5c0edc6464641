//! Domain error types

use thiserror::Error;

/// Validation failures raised while constructing or combining confidence values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfidenceError {
    /// A numeric field is outside [0, 1] or not a number
    #[error("{field} must be in [0, 1], got {value}")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// Deterministic confidence must be exactly 0 or 1
    #[error("deterministic value must be 0 or 1, got {0}")]
    NotDeterministic(f64),

    /// Bounded confidence requires low < high
    #[error("bounded confidence requires low < high, got low={low}, high={high}")]
    InvertedBounds {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },

    /// Measured confidence requires at least one sample
    #[error("sampleSize must be greater than 0")]
    EmptySample,

    /// Any other malformed field
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Errors raised while evaluating a formula AST
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// The formula references a name missing from the bindings
    #[error("unbound variable in formula: {0}")]
    UnboundVariable(String),
}

/// Logical violations in the contract registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    /// A contract for this primitive is already registered
    #[error("contract already registered for primitive: {0}")]
    Duplicate(String),

    /// No contract is registered for this primitive
    #[error("no contract registered for primitive: {0}")]
    NotFound(String),

    /// The contract itself is malformed
    #[error("invalid contract for primitive {primitive_id}: {reason}")]
    Invalid {
        /// Primitive the contract belongs to
        primitive_id: String,
        /// What is wrong with it
        reason: String,
    },
}
