//! Contract registry
//!
//! The contract executor (an external collaborator) looks up contracts by
//! primitive ID. The registry is an ordinary value: the caller constructs it,
//! owns its lifetime, and passes it by reference to whoever needs it.

use crate::algebra::{parallel_all, parallel_any, sequence, ParallelAnyOptions};
use crate::confidence::{AbsentReason, ConfidenceValue};
use crate::error::{ConfidenceError, ContractError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A named pre/post condition or invariant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Stable identifier
    pub id: String,
    /// What must hold
    pub description: String,
}

impl Condition {
    /// Create a condition
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// One input to a contract's confidence derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    /// Factor name, also the key callers supply values under
    pub id: String,
    /// What the factor measures
    pub description: String,
}

/// How a derivation combines its factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Combinator {
    /// Ordered pipeline, `min`
    Sequence,
    /// Independent conjunction, `product`
    ParallelAll,
    /// Disjunction, noisy-or blended with `max`
    ParallelAny {
        /// Branch correlation in [0, 1]
        correlation: f64,
    },
}

/// How a primitive's output confidence is derived from its factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDerivation {
    /// Factors in evaluation order
    pub factors: Vec<ConfidenceFactor>,
    /// How the factors are combined
    pub combinator: Combinator,
}

impl ConfidenceDerivation {
    /// Combine the supplied factor values
    ///
    /// A factor missing from `values` counts as `absent(uncalibrated)`, so the
    /// combinator's absent rules decide the outcome.
    pub fn derive(
        &self,
        values: &HashMap<String, ConfidenceValue>,
    ) -> Result<ConfidenceValue, ConfidenceError> {
        let inputs: Vec<ConfidenceValue> = self
            .factors
            .iter()
            .map(|factor| {
                values
                    .get(&factor.id)
                    .cloned()
                    .unwrap_or_else(|| ConfidenceValue::absent(AbsentReason::Uncalibrated))
            })
            .collect();

        match self.combinator {
            Combinator::Sequence => Ok(sequence(&inputs)),
            Combinator::ParallelAll => Ok(parallel_all(&inputs)),
            Combinator::ParallelAny { correlation } => {
                parallel_any(&inputs, ParallelAnyOptions::correlated(correlation))
            }
        }
    }
}

/// Retry policy for failures of a primitive
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSpec {
    /// Error codes that may be retried
    pub retryable_errors: Vec<String>,
    /// Maximum number of retries
    pub max_retries: u32,
}

/// Everything the contract executor needs to run one primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveContract {
    /// Primitive this contract governs
    pub primitive_id: String,
    /// Must hold before execution
    pub preconditions: Vec<Condition>,
    /// Must hold after execution
    pub postconditions: Vec<Condition>,
    /// Must hold throughout
    pub invariants: Vec<Condition>,
    /// How output confidence is derived
    pub confidence_derivation: ConfidenceDerivation,
    /// Retry policy
    pub error_spec: ErrorSpec,
}

impl PrimitiveContract {
    fn validate(&self) -> Result<(), ContractError> {
        let invalid = |reason: &str| ContractError::Invalid {
            primitive_id: self.primitive_id.clone(),
            reason: reason.to_string(),
        };

        if self.primitive_id.trim().is_empty() {
            return Err(invalid("primitive id must not be empty"));
        }
        let factors = &self.confidence_derivation.factors;
        if factors.is_empty() {
            return Err(invalid("confidence derivation needs at least one factor"));
        }
        let mut seen = HashSet::new();
        for factor in factors {
            if !seen.insert(factor.id.as_str()) {
                return Err(invalid(&format!("duplicate factor '{}'", factor.id)));
            }
        }
        if let Combinator::ParallelAny { correlation } = self.confidence_derivation.combinator {
            if correlation.is_nan() || !(0.0..=1.0).contains(&correlation) {
                return Err(invalid("correlation must be in [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Registry of contracts keyed by primitive ID
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, PrimitiveContract>,
}

impl ContractRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract; a second registration for the same primitive fails
    pub fn register(&mut self, contract: PrimitiveContract) -> Result<(), ContractError> {
        contract.validate()?;
        if self.contracts.contains_key(&contract.primitive_id) {
            return Err(ContractError::Duplicate(contract.primitive_id));
        }
        self.contracts.insert(contract.primitive_id.clone(), contract);
        Ok(())
    }

    /// Look up a contract
    pub fn get(&self, primitive_id: &str) -> Option<&PrimitiveContract> {
        self.contracts.get(primitive_id)
    }

    /// Look up a contract that must exist
    pub fn require(&self, primitive_id: &str) -> Result<&PrimitiveContract, ContractError> {
        self.get(primitive_id)
            .ok_or_else(|| ContractError::NotFound(primitive_id.to_string()))
    }

    /// Remove a contract, returning it
    pub fn unregister(&mut self, primitive_id: &str) -> Result<PrimitiveContract, ContractError> {
        self.contracts
            .remove(primitive_id)
            .ok_or_else(|| ContractError::NotFound(primitive_id.to_string()))
    }

    /// Registered primitive IDs in sorted order
    pub fn primitive_ids(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    /// Number of registered contracts
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(id: &str, combinator: Combinator) -> PrimitiveContract {
        PrimitiveContract {
            primitive_id: id.to_string(),
            preconditions: vec![Condition::new("input_exists", "target file exists")],
            postconditions: vec![Condition::new("output_parsed", "AST produced")],
            invariants: vec![],
            confidence_derivation: ConfidenceDerivation {
                factors: vec![
                    ConfidenceFactor {
                        id: "parse".to_string(),
                        description: "parser succeeded".to_string(),
                    },
                    ConfidenceFactor {
                        id: "resolve".to_string(),
                        description: "symbol resolution accuracy".to_string(),
                    },
                ],
                combinator,
            },
            error_spec: ErrorSpec::default(),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ContractRegistry::new();
        registry.register(contract("tp_parse", Combinator::Sequence)).unwrap();

        let err = registry.register(contract("tp_parse", Combinator::Sequence)).unwrap_err();
        assert_eq!(err, ContractError::Duplicate("tp_parse".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_require_and_unregister() {
        let mut registry = ContractRegistry::new();
        registry.register(contract("a", Combinator::ParallelAll)).unwrap();
        assert!(registry.require("a").is_ok());
        assert_eq!(registry.require("b").unwrap_err(), ContractError::NotFound("b".to_string()));

        registry.unregister("a").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_contract() {
        let mut c = contract("x", Combinator::Sequence);
        c.confidence_derivation.factors.clear();
        assert!(matches!(
            ContractRegistry::new().register(c),
            Err(ContractError::Invalid { .. })
        ));
    }

    #[test]
    fn test_derive_combines_factors() {
        let c = contract("tp_parse", Combinator::Sequence);
        let mut values = HashMap::new();
        values.insert("parse".to_string(), ConfidenceValue::deterministic(true, "parsed"));
        values.insert(
            "resolve".to_string(),
            ConfidenceValue::measured("resolver-bench", 400, 0.82, [0.78, 0.86]).unwrap(),
        );

        let result = c.confidence_derivation.derive(&values).unwrap();
        assert!((result.numeric_value().unwrap() - 0.82).abs() < 1e-12);
    }

    #[test]
    fn test_derive_missing_factor_is_absent() {
        let c = contract("tp_parse", Combinator::ParallelAll);
        let mut values = HashMap::new();
        values.insert("parse".to_string(), ConfidenceValue::deterministic(true, "parsed"));

        let result = c.confidence_derivation.derive(&values).unwrap();
        assert!(result.is_absent());
    }
}
