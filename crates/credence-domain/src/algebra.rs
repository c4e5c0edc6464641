//! Confidence composition algebra
//!
//! Combinators that build a [`ConfidenceValue::Derived`] from several inputs:
//!
//! | Combinator | Meaning | Numeric rule |
//! |---|---|---|
//! | [`sequence`] | every pipeline stage succeeds | `min(p)` |
//! | [`parallel_all`] | every independent branch succeeds | `product(p)` |
//! | [`parallel_any`] | at least one branch succeeds | `1 - product(1 - p)`, blended with `max` under correlation |
//!
//! Calibration survives a combinator only when every input was calibrated and
//! the combinator is min, product, or uncorrelated noisy-or over all branches.
//! Independence is an assumption the caller must justify; nothing here checks it.

use crate::confidence::{AbsentReason, CalibrationStatus, ConfidenceValue, DerivedInput};
use crate::error::ConfidenceError;
use crate::formula::{create_formula, formula_to_string, FormulaKind, FormulaNode};
use serde::{Deserialize, Serialize};

/// How [`parallel_any`] treats absent branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentHandling {
    /// Compute from present branches only and mark the result degraded
    #[default]
    Relaxed,
    /// Any absent branch makes the whole result absent
    Strict,
}

/// Options for [`parallel_any`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelAnyOptions {
    /// Correlation between branches in [0, 1]; 0 = independent noisy-or, 1 = max
    pub correlation: f64,
    /// Treatment of absent branches
    pub absent_handling: AbsentHandling,
}

impl Default for ParallelAnyOptions {
    fn default() -> Self {
        Self {
            correlation: 0.0,
            absent_handling: AbsentHandling::Relaxed,
        }
    }
}

impl ParallelAnyOptions {
    /// Independent branches with strict absent handling
    pub fn strict() -> Self {
        Self {
            absent_handling: AbsentHandling::Strict,
            ..Self::default()
        }
    }

    /// Relaxed handling with the given branch correlation
    pub fn correlated(correlation: f64) -> Self {
        Self {
            correlation,
            ..Self::default()
        }
    }
}

fn named_inputs(prefix: &str, values: &[ConfidenceValue]) -> (Vec<String>, Vec<DerivedInput>) {
    let names: Vec<String> = (0..values.len()).map(|i| format!("{}_{}", prefix, i)).collect();
    let inputs = names
        .iter()
        .zip(values)
        .map(|(name, value)| DerivedInput::new(name.clone(), value.clone()))
        .collect();
    (names, inputs)
}

fn combined_status<'a>(values: impl IntoIterator<Item = &'a ConfidenceValue>) -> CalibrationStatus {
    let all_calibrated = values
        .into_iter()
        .all(|v| v.calibration_status() == CalibrationStatus::Preserved);
    if all_calibrated {
        CalibrationStatus::Preserved
    } else {
        CalibrationStatus::Degraded
    }
}

/// Numeric values of every input, or the first absent input
fn all_present(values: &[ConfidenceValue]) -> Result<Vec<f64>, ConfidenceValue> {
    values
        .iter()
        .map(|v| v.numeric_value().ok_or_else(|| v.clone()))
        .collect()
}

/// Confidence that an ordered pipeline succeeds end to end
///
/// A later stage can never be more trustworthy than the weakest stage before
/// it, so the result is the minimum. Any absent stage makes the pipeline
/// absent; an empty pipeline is absent with `insufficient_data`.
pub fn sequence(values: &[ConfidenceValue]) -> ConfidenceValue {
    if values.is_empty() {
        return ConfidenceValue::absent(AbsentReason::InsufficientData);
    }
    let numbers = match all_present(values) {
        Ok(numbers) => numbers,
        Err(absent) => return absent,
    };

    let (names, inputs) = named_inputs("step", values);
    let ast = create_formula(FormulaKind::Min, &names);
    let value = numbers.iter().copied().fold(f64::INFINITY, f64::min);

    ConfidenceValue::derived_clamped(
        value,
        formula_to_string(&ast),
        Some(ast),
        inputs,
        combined_status(values),
    )
}

/// Confidence that every independent branch succeeds
///
/// There is no relaxed mode: dropping an unknown branch from a conjunction
/// would overstate the result.
pub fn parallel_all(values: &[ConfidenceValue]) -> ConfidenceValue {
    if values.is_empty() {
        return ConfidenceValue::absent(AbsentReason::InsufficientData);
    }
    let numbers = match all_present(values) {
        Ok(numbers) => numbers,
        Err(absent) => return absent,
    };

    let (names, inputs) = named_inputs("branch", values);
    let ast = create_formula(FormulaKind::Product, &names);
    let value: f64 = numbers.iter().product();

    ConfidenceValue::derived_clamped(
        value,
        formula_to_string(&ast),
        Some(ast),
        inputs,
        combined_status(values),
    )
}

/// Confidence that at least one branch succeeds
///
/// `result = (1 - rho) * noisy_or + rho * max`. In relaxed mode absent
/// branches are dropped: for a disjunction the remaining branches give a
/// conservative lower bound. The formula then records `[k/n branches]` and the
/// result is always degraded. If every branch is absent the result is absent
/// in both modes.
///
/// The attached AST covers the present branches only, as
/// `sum(scale(1 - rho, noisy_or(..)), scale(rho, max(..)))` or a bare
/// `noisy_or(..)` when `rho` is 0.
pub fn parallel_any(
    values: &[ConfidenceValue],
    options: ParallelAnyOptions,
) -> Result<ConfidenceValue, ConfidenceError> {
    let rho = options.correlation;
    if rho.is_nan() || !(0.0..=1.0).contains(&rho) {
        return Err(ConfidenceError::OutOfRange {
            field: "correlation",
            value: rho,
        });
    }
    if values.is_empty() {
        return Ok(ConfidenceValue::absent(AbsentReason::InsufficientData));
    }

    let (names, inputs) = named_inputs("branch", values);
    let present: Vec<(&str, &ConfidenceValue, f64)> = names
        .iter()
        .zip(values)
        .filter_map(|(name, v)| v.numeric_value().map(|p| (name.as_str(), v, p)))
        .collect();

    let first_absent = values.iter().find(|v| v.is_absent());
    if present.is_empty() || (options.absent_handling == AbsentHandling::Strict && first_absent.is_some()) {
        let absent = first_absent
            .cloned()
            .unwrap_or_else(|| ConfidenceValue::absent(AbsentReason::InsufficientData));
        return Ok(absent);
    }

    let noisy_or = 1.0 - present.iter().map(|(_, _, p)| 1.0 - p).product::<f64>();
    let max = present.iter().map(|(_, _, p)| *p).fold(f64::NEG_INFINITY, f64::max);
    let value = (1.0 - rho) * noisy_or + rho * max;

    let present_names: Vec<&str> = present.iter().map(|(name, _, _)| *name).collect();
    let branch_list = present_names.join(", ");
    let mut formula = if rho > 0.0 {
        format!(
            "{} * noisy_or({}) + {} * max({})",
            1.0 - rho,
            branch_list,
            rho,
            branch_list
        )
    } else {
        format!("noisy_or({})", branch_list)
    };

    let noisy_or_ast = create_formula(FormulaKind::NoisyOr, &present_names);
    let ast = if rho > 0.0 {
        FormulaNode::Sum {
            children: vec![
                FormulaNode::scale(1.0 - rho, noisy_or_ast),
                FormulaNode::scale(rho, create_formula(FormulaKind::Max, &present_names)),
            ],
        }
    } else {
        noisy_or_ast
    };

    let dropped = present.len() < values.len();
    if dropped {
        formula.push_str(&format!(" [{}/{} branches]", present.len(), values.len()));
    }

    let status = if dropped || rho > 0.0 {
        CalibrationStatus::Degraded
    } else {
        combined_status(present.iter().map(|(_, v, _)| *v))
    };

    Ok(ConfidenceValue::derived_clamped(value, formula, Some(ast), inputs, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::BoundedBasis;

    fn measured(p: f64) -> ConfidenceValue {
        ConfidenceValue::measured("ds", 100, p, [0.0, 1.0]).unwrap()
    }

    fn value_of(c: &ConfidenceValue) -> f64 {
        c.numeric_value().unwrap()
    }

    #[test]
    fn test_sequence_is_min_with_formula() {
        let result = sequence(&[measured(0.9), measured(0.6), measured(0.8)]);
        assert!((value_of(&result) - 0.6).abs() < 1e-12);
        assert_eq!(result.formula(), Some("min(step_0, step_1, step_2)"));
        assert_eq!(result.calibration_status(), CalibrationStatus::Preserved);
        assert_eq!(result.inputs().len(), 3);
    }

    #[test]
    fn test_sequence_absent_propagates() {
        let absent = ConfidenceValue::absent(AbsentReason::Uncalibrated);
        let result = sequence(&[measured(0.9), absent.clone()]);
        assert_eq!(result, absent);
    }

    #[test]
    fn test_empty_combinators_are_absent() {
        let expected = ConfidenceValue::absent(AbsentReason::InsufficientData);
        assert_eq!(sequence(&[]), expected);
        assert_eq!(parallel_all(&[]), expected);
        assert_eq!(parallel_any(&[], ParallelAnyOptions::default()).unwrap(), expected);
    }

    #[test]
    fn test_parallel_all_product() {
        let result = parallel_all(&[measured(0.9), measured(0.5)]);
        assert!((value_of(&result) - 0.45).abs() < 1e-12);
        assert_eq!(result.formula(), Some("product(branch_0, branch_1)"));
    }

    #[test]
    fn test_bounded_input_degrades() {
        let bounded = ConfidenceValue::bounded(0.6, 0.8, BoundedBasis::Theoretical, "x").unwrap();
        let result = parallel_all(&[measured(0.9), bounded]);
        assert_eq!(result.calibration_status(), CalibrationStatus::Degraded);
    }

    #[test]
    fn test_deterministic_identities() {
        let x = measured(0.37);
        let one = ConfidenceValue::deterministic(true, "certain");
        let zero = ConfidenceValue::deterministic(false, "impossible");

        assert!((value_of(&parallel_all(&[one.clone(), x.clone()])) - 0.37).abs() < 1e-12);
        assert_eq!(value_of(&parallel_all(&[zero.clone(), x.clone()])), 0.0);

        let any_one = parallel_any(&[one, x.clone()], ParallelAnyOptions::default()).unwrap();
        assert!((value_of(&any_one) - 1.0).abs() < 1e-12);
        let any_zero = parallel_any(&[zero, x], ParallelAnyOptions::default()).unwrap();
        assert!((value_of(&any_zero) - 0.37).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_any_noisy_or() {
        let result = parallel_any(&[measured(0.5), measured(0.5)], ParallelAnyOptions::default()).unwrap();
        assert!((value_of(&result) - 0.75).abs() < 1e-12);
        assert_eq!(result.formula(), Some("noisy_or(branch_0, branch_1)"));
        assert_eq!(result.calibration_status(), CalibrationStatus::Preserved);
    }

    #[test]
    fn test_parallel_any_correlation_blend() {
        let values = [measured(0.5), measured(0.5)];
        let full = parallel_any(&values, ParallelAnyOptions::correlated(1.0)).unwrap();
        assert!((value_of(&full) - 0.5).abs() < 1e-12);

        let half = parallel_any(&values, ParallelAnyOptions::correlated(0.5)).unwrap();
        assert!((value_of(&half) - 0.625).abs() < 1e-12);
        assert_eq!(half.calibration_status(), CalibrationStatus::Degraded);
    }

    #[test]
    fn test_parallel_any_ast_reevaluates() {
        use crate::formula::evaluate_formula;
        use std::collections::HashMap;

        let values = [
            measured(0.6),
            ConfidenceValue::absent(AbsentReason::Uncalibrated),
            measured(0.3),
        ];
        let bindings: HashMap<String, f64> =
            [("branch_0".to_string(), 0.6), ("branch_2".to_string(), 0.3)].into_iter().collect();

        for rho in [0.0, 0.4, 1.0] {
            let result = parallel_any(&values, ParallelAnyOptions::correlated(rho)).unwrap();
            let ConfidenceValue::Derived { formula_ast: Some(ast), .. } = &result else {
                panic!("expected a derived value with an AST, got {:?}", result);
            };
            assert_eq!(ast.variables(), vec!["branch_0".to_string(), "branch_2".to_string()]);
            let reevaluated = evaluate_formula(ast, &bindings).unwrap();
            assert!((reevaluated - value_of(&result)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parallel_any_rejects_bad_correlation() {
        let result = parallel_any(&[measured(0.5)], ParallelAnyOptions::correlated(1.5));
        assert!(matches!(
            result,
            Err(ConfidenceError::OutOfRange { field: "correlation", .. })
        ));
    }

    #[test]
    fn test_parallel_any_relaxed_drops_absent() {
        let values = [
            measured(0.5),
            ConfidenceValue::absent(AbsentReason::Uncalibrated),
            measured(0.5),
        ];
        let result = parallel_any(&values, ParallelAnyOptions::default()).unwrap();
        assert!((value_of(&result) - 0.75).abs() < 1e-12);
        assert_eq!(result.formula(), Some("noisy_or(branch_0, branch_2) [2/3 branches]"));
        assert_eq!(result.calibration_status(), CalibrationStatus::Degraded);
        assert_eq!(result.inputs().len(), 3);
    }

    #[test]
    fn test_parallel_any_strict_absent() {
        let absent = ConfidenceValue::absent(AbsentReason::Uncalibrated);
        let result = parallel_any(&[measured(0.5), absent.clone()], ParallelAnyOptions::strict()).unwrap();
        assert_eq!(result, absent);
    }

    #[test]
    fn test_parallel_any_all_absent_in_both_modes() {
        let values = [
            ConfidenceValue::absent(AbsentReason::InsufficientData),
            ConfidenceValue::absent(AbsentReason::Uncalibrated),
        ];
        for options in [ParallelAnyOptions::default(), ParallelAnyOptions::strict()] {
            assert!(parallel_any(&values, options).unwrap().is_absent());
        }
    }
}
