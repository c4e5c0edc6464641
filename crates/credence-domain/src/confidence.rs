//! Confidence value module
//!
//! A [`ConfidenceValue`] is a closed tagged union. Every consumer must match
//! on all five variants: an [`ConfidenceValue::Absent`] value carries no
//! number and must never be read as zero.

use crate::error::ConfidenceError;
use crate::formula::FormulaNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a bounded estimate comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundedBasis {
    /// Derived from a theoretical argument
    Theoretical,
    /// Taken from published literature
    Literature,
}

/// Whether a derived value still carries a calibration guarantee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// Every input was calibrated and the combinator keeps that property
    Preserved,
    /// At least one input or the combinator broke the guarantee
    Degraded,
}

/// Why no confidence is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    /// The producing component has never been calibrated
    Uncalibrated,
    /// Not enough observations to say anything
    InsufficientData,
}

impl AbsentReason {
    /// Wire name of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsentReason::Uncalibrated => "uncalibrated",
            AbsentReason::InsufficientData => "insufficient_data",
        }
    }
}

/// One named input of a derived confidence (the provenance chain)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedInput {
    /// Binding name used in the formula
    pub name: String,
    /// The input value as it was when the derivation happened
    pub confidence: ConfidenceValue,
}

impl DerivedInput {
    /// Create a named input
    pub fn new(name: impl Into<String>, confidence: ConfidenceValue) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Epistemic confidence attached to a claim
///
/// Immutable once constructed: every transformation in this workspace returns
/// a new value, which keeps the `inputs` provenance chain usable for undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConfidenceValue {
    /// Logically certain fact, value is exactly 0 or 1
    Deterministic {
        /// 0.0 or 1.0
        value: f64,
        /// Why the fact is certain (e.g. "parse_succeeded")
        reason: String,
    },

    /// Interval estimate without a point value
    Bounded {
        /// Lower bound, strictly below `high`
        low: f64,
        /// Upper bound
        high: f64,
        /// Where the bounds come from
        basis: BoundedBasis,
        /// Reference backing the bounds
        citation: String,
    },

    /// Accuracy measured on a labeled dataset
    Measured {
        /// Dataset the measurement was taken on
        dataset_id: String,
        /// Number of labeled samples (> 0)
        sample_size: u64,
        /// Observed accuracy
        accuracy: f64,
        /// 95% confidence interval on the accuracy
        ci95: [f64; 2],
    },

    /// Result of composing other confidence values
    Derived {
        /// Composed value
        value: f64,
        /// Human-readable formula
        formula: String,
        /// Typed formula, when the combinator has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        formula_ast: Option<FormulaNode>,
        /// Inputs the value was derived from
        inputs: Vec<DerivedInput>,
        /// Whether calibration survived the derivation
        calibration_status: CalibrationStatus,
    },

    /// Explicitly no confidence available
    Absent {
        /// Why nothing is available
        reason: AbsentReason,
    },
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfidenceError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ConfidenceError::OutOfRange { field, value });
    }
    Ok(())
}

impl ConfidenceValue {
    /// A logically certain fact (or certain falsehood)
    pub fn deterministic(holds: bool, reason: impl Into<String>) -> Self {
        ConfidenceValue::Deterministic {
            value: if holds { 1.0 } else { 0.0 },
            reason: reason.into(),
        }
    }

    /// An interval estimate
    pub fn bounded(
        low: f64,
        high: f64,
        basis: BoundedBasis,
        citation: impl Into<String>,
    ) -> Result<Self, ConfidenceError> {
        let value = ConfidenceValue::Bounded {
            low,
            high,
            basis,
            citation: citation.into(),
        };
        value.validate()?;
        Ok(value)
    }

    /// An accuracy measured on a labeled dataset
    pub fn measured(
        dataset_id: impl Into<String>,
        sample_size: u64,
        accuracy: f64,
        ci95: [f64; 2],
    ) -> Result<Self, ConfidenceError> {
        let value = ConfidenceValue::Measured {
            dataset_id: dataset_id.into(),
            sample_size,
            accuracy,
            ci95,
        };
        value.validate()?;
        Ok(value)
    }

    /// A derived value built by a caller outside the algebra
    pub fn derived(
        value: f64,
        formula: impl Into<String>,
        inputs: Vec<DerivedInput>,
        calibration_status: CalibrationStatus,
    ) -> Result<Self, ConfidenceError> {
        let value = ConfidenceValue::Derived {
            value,
            formula: formula.into(),
            formula_ast: None,
            inputs,
            calibration_status,
        };
        value.validate()?;
        Ok(value)
    }

    /// Explicitly no confidence
    pub fn absent(reason: AbsentReason) -> Self {
        ConfidenceValue::Absent { reason }
    }

    /// Derived value produced by trusted combinators; the value is clamped to [0, 1]
    pub(crate) fn derived_clamped(
        value: f64,
        formula: String,
        formula_ast: Option<FormulaNode>,
        inputs: Vec<DerivedInput>,
        calibration_status: CalibrationStatus,
    ) -> Self {
        ConfidenceValue::Derived {
            value: value.clamp(0.0, 1.0),
            formula,
            formula_ast,
            inputs,
            calibration_status,
        }
    }

    /// Check every field invariant, recursing into derived inputs
    pub fn validate(&self) -> Result<(), ConfidenceError> {
        match self {
            ConfidenceValue::Deterministic { value, .. } => {
                if *value == 0.0 || *value == 1.0 {
                    Ok(())
                } else {
                    Err(ConfidenceError::NotDeterministic(*value))
                }
            }
            ConfidenceValue::Bounded { low, high, .. } => {
                check_unit("low", *low)?;
                check_unit("high", *high)?;
                if low >= high {
                    return Err(ConfidenceError::InvertedBounds {
                        low: *low,
                        high: *high,
                    });
                }
                Ok(())
            }
            ConfidenceValue::Measured {
                dataset_id,
                sample_size,
                accuracy,
                ci95,
            } => {
                if dataset_id.trim().is_empty() {
                    return Err(ConfidenceError::Invalid {
                        field: "datasetId",
                        reason: "must not be empty".to_string(),
                    });
                }
                if *sample_size == 0 {
                    return Err(ConfidenceError::EmptySample);
                }
                check_unit("accuracy", *accuracy)?;
                check_unit("ci95[0]", ci95[0])?;
                check_unit("ci95[1]", ci95[1])?;
                if ci95[0] > ci95[1] {
                    return Err(ConfidenceError::Invalid {
                        field: "ci95",
                        reason: format!("lower {} exceeds upper {}", ci95[0], ci95[1]),
                    });
                }
                Ok(())
            }
            ConfidenceValue::Derived {
                value,
                formula,
                inputs,
                ..
            } => {
                check_unit("value", *value)?;
                if formula.trim().is_empty() {
                    return Err(ConfidenceError::Invalid {
                        field: "formula",
                        reason: "must not be empty".to_string(),
                    });
                }
                for input in inputs {
                    input.confidence.validate()?;
                }
                Ok(())
            }
            ConfidenceValue::Absent { .. } => Ok(()),
        }
    }

    /// Numeric view of the value; `None` for absent
    ///
    /// Bounded values report their midpoint.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            ConfidenceValue::Deterministic { value, .. } => Some(*value),
            ConfidenceValue::Bounded { low, high, .. } => Some((low + high) / 2.0),
            ConfidenceValue::Measured { accuracy, .. } => Some(*accuracy),
            ConfidenceValue::Derived { value, .. } => Some(*value),
            ConfidenceValue::Absent { .. } => None,
        }
    }

    /// Whether this is the absent variant
    pub fn is_absent(&self) -> bool {
        matches!(self, ConfidenceValue::Absent { .. })
    }

    /// Calibration status of the value itself
    ///
    /// Deterministic and measured values are calibrated by construction;
    /// bounded and absent values never are.
    pub fn calibration_status(&self) -> CalibrationStatus {
        match self {
            ConfidenceValue::Deterministic { .. } | ConfidenceValue::Measured { .. } => {
                CalibrationStatus::Preserved
            }
            ConfidenceValue::Derived {
                calibration_status, ..
            } => *calibration_status,
            ConfidenceValue::Bounded { .. } | ConfidenceValue::Absent { .. } => {
                CalibrationStatus::Degraded
            }
        }
    }

    /// Formula string of a derived value
    pub fn formula(&self) -> Option<&str> {
        match self {
            ConfidenceValue::Derived { formula, .. } => Some(formula),
            _ => None,
        }
    }

    /// Inputs of a derived value (empty for every other variant)
    pub fn inputs(&self) -> &[DerivedInput] {
        match self {
            ConfidenceValue::Derived { inputs, .. } => inputs,
            _ => &[],
        }
    }
}

/// Whether a confidence reaches `threshold`; absent never does
pub fn meets_threshold(value: &ConfidenceValue, threshold: f64) -> bool {
    value.numeric_value().is_some_and(|v| v >= threshold)
}

impl fmt::Display for ConfidenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceValue::Deterministic { value, reason } => {
                write!(f, "deterministic({} ({}))", value, reason)
            }
            ConfidenceValue::Bounded { low, high, .. } => {
                write!(f, "bounded[{:.2}, {:.2}]", low, high)
            }
            ConfidenceValue::Measured {
                accuracy,
                sample_size,
                ..
            } => write!(f, "measured({:.3}, n={})", accuracy, sample_size),
            ConfidenceValue::Derived {
                value,
                formula,
                calibration_status,
                ..
            } => {
                let tag = match calibration_status {
                    CalibrationStatus::Preserved => "",
                    CalibrationStatus::Degraded => ", degraded",
                };
                write!(f, "derived({:.3} = {}{})", value, formula, tag)
            }
            ConfidenceValue::Absent { reason } => write!(f, "absent({})", reason.as_str()),
        }
    }
}
