//! Credence Domain Layer
//!
//! This crate contains the value types and the confidence algebra that every
//! other Credence crate depends upon. It performs no I/O and does no logging.
//!
//! ## Key Concepts
//!
//! - **ConfidenceValue**: a closed tagged union (deterministic, bounded,
//!   measured, derived, absent); absent is never read as zero
//! - **Algebra**: `sequence` (min), `parallel_all` (product) and
//!   `parallel_any` (noisy-or), tracking whether calibration survives
//! - **FormulaNode**: auditable formula AST behind derived values
//! - **Claims and edges**: the external claim graph, seen through [`ClaimGraph`]
//! - **ExtendedDefeater**: evidence against claims, with meta-defeat links
//!
//! ## Example
//!
//! ```
//! use credence_domain::{parallel_all, ConfidenceValue};
//!
//! let parsed = ConfidenceValue::deterministic(true, "parse_succeeded");
//! let resolved = ConfidenceValue::measured("resolver-bench", 400, 0.82, [0.78, 0.86]).unwrap();
//!
//! let both = parallel_all(&[parsed, resolved]);
//! assert!((both.numeric_value().unwrap() - 0.82).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algebra;
pub mod claim;
pub mod confidence;
pub mod contract;
pub mod defeater;
pub mod edge;
pub mod error;
pub mod formula;
pub mod traits;

// Re-exports for convenience
pub use algebra::{parallel_all, parallel_any, sequence, AbsentHandling, ParallelAnyOptions};
pub use claim::{Claim, ClaimId, ClaimStatus};
pub use confidence::{
    meets_threshold, AbsentReason, BoundedBasis, CalibrationStatus, ConfidenceValue, DerivedInput,
};
pub use contract::{
    Combinator, Condition, ConfidenceDerivation, ConfidenceFactor, ContractRegistry, ErrorSpec,
    PrimitiveContract,
};
pub use defeater::{DefeaterId, DefeaterSeverity, DefeaterStatus, DefeaterType, ExtendedDefeater};
pub use edge::{EdgeType, EvidenceEdge};
pub use error::{ConfidenceError, ContractError, FormulaError};
pub use formula::{create_formula, evaluate_formula, formula_to_string, FormulaKind, FormulaNode};
pub use traits::ClaimGraph;
