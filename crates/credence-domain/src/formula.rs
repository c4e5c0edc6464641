//! Formula AST for auditable derivations
//!
//! A derived confidence can carry the formula that produced it. The AST can be
//! rendered for humans and re-evaluated against a fresh set of bindings.

use crate::error::FormulaError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node of a confidence formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormulaNode {
    /// Reference to a named binding
    Value {
        /// Binding name
        name: String,
    },
    /// Minimum of the children (empty = +inf)
    Min {
        /// Operands
        children: Vec<FormulaNode>,
    },
    /// Maximum of the children (empty = -inf)
    Max {
        /// Operands
        children: Vec<FormulaNode>,
    },
    /// Product of the children (empty = 1)
    Product {
        /// Operands
        children: Vec<FormulaNode>,
    },
    /// Sum of the children (empty = 0)
    Sum {
        /// Operands
        children: Vec<FormulaNode>,
    },
    /// Probability that at least one independent child holds,
    /// `1 - product(1 - c)` (empty = 0)
    NoisyOr {
        /// Operands
        children: Vec<FormulaNode>,
    },
    /// Child multiplied by a constant factor
    Scale {
        /// Constant factor
        factor: f64,
        /// Scaled operand
        child: Box<FormulaNode>,
    },
}

/// Operator used by [`create_formula`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// `min(..)`
    Min,
    /// `max(..)`
    Max,
    /// `product(..)`
    Product,
    /// `sum(..)`
    Sum,
    /// `noisy_or(..)`
    NoisyOr,
}

impl FormulaNode {
    /// Leaf referencing `name`
    pub fn value(name: impl Into<String>) -> Self {
        FormulaNode::Value { name: name.into() }
    }

    /// Scale `child` by `factor`
    pub fn scale(factor: f64, child: FormulaNode) -> Self {
        FormulaNode::Scale {
            factor,
            child: Box::new(child),
        }
    }

    /// Names referenced anywhere in the tree, in first-seen order
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            FormulaNode::Value { name } => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            FormulaNode::Min { children }
            | FormulaNode::Max { children }
            | FormulaNode::Product { children }
            | FormulaNode::Sum { children }
            | FormulaNode::NoisyOr { children } => {
                for child in children {
                    child.collect_variables(names);
                }
            }
            FormulaNode::Scale { child, .. } => child.collect_variables(names),
        }
    }
}

/// Build an n-ary node of `kind` over plain value leaves
pub fn create_formula<S: AsRef<str>>(kind: FormulaKind, names: &[S]) -> FormulaNode {
    let children = names
        .iter()
        .map(|n| FormulaNode::value(n.as_ref()))
        .collect();
    match kind {
        FormulaKind::Min => FormulaNode::Min { children },
        FormulaKind::Max => FormulaNode::Max { children },
        FormulaKind::Product => FormulaNode::Product { children },
        FormulaKind::Sum => FormulaNode::Sum { children },
        FormulaKind::NoisyOr => FormulaNode::NoisyOr { children },
    }
}

/// Evaluate `node` against `bindings`
///
/// Empty operators follow the usual identities, so an empty `min` yields
/// `f64::INFINITY` and an empty `max` yields `f64::NEG_INFINITY`.
pub fn evaluate_formula(
    node: &FormulaNode,
    bindings: &HashMap<String, f64>,
) -> Result<f64, FormulaError> {
    match node {
        FormulaNode::Value { name } => bindings
            .get(name)
            .copied()
            .ok_or_else(|| FormulaError::UnboundVariable(name.clone())),
        FormulaNode::Min { children } => fold(children, bindings, f64::INFINITY, f64::min),
        FormulaNode::Max { children } => fold(children, bindings, f64::NEG_INFINITY, f64::max),
        FormulaNode::Product { children } => fold(children, bindings, 1.0, |a, b| a * b),
        FormulaNode::Sum { children } => fold(children, bindings, 0.0, |a, b| a + b),
        FormulaNode::NoisyOr { children } => {
            let miss = fold(children, bindings, 1.0, |a, b| a * (1.0 - b))?;
            Ok(1.0 - miss)
        }
        FormulaNode::Scale { factor, child } => Ok(factor * evaluate_formula(child, bindings)?),
    }
}

fn fold(
    children: &[FormulaNode],
    bindings: &HashMap<String, f64>,
    identity: f64,
    op: impl Fn(f64, f64) -> f64,
) -> Result<f64, FormulaError> {
    let mut acc = identity;
    for child in children {
        acc = op(acc, evaluate_formula(child, bindings)?);
    }
    Ok(acc)
}

/// Render `node` as a human-readable formula
pub fn formula_to_string(node: &FormulaNode) -> String {
    fn join(op: &str, children: &[FormulaNode]) -> String {
        let parts: Vec<String> = children.iter().map(formula_to_string).collect();
        format!("{}({})", op, parts.join(", "))
    }

    match node {
        FormulaNode::Value { name } => name.clone(),
        FormulaNode::Min { children } => join("min", children),
        FormulaNode::Max { children } => join("max", children),
        FormulaNode::Product { children } => join("product", children),
        FormulaNode::Sum { children } => join("sum", children),
        FormulaNode::NoisyOr { children } => join("noisy_or", children),
        FormulaNode::Scale { factor, child } => format!("{} * {}", factor, formula_to_string(child)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_evaluate_nested() {
        let node = FormulaNode::Min {
            children: vec![
                FormulaNode::value("a"),
                FormulaNode::scale(0.5, create_formula(FormulaKind::Sum, &["b", "c"])),
            ],
        };
        let b = bindings(&[("a", 0.9), ("b", 0.6), ("c", 0.4)]);
        assert!((evaluate_formula(&node, &b).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_identities() {
        let b = HashMap::new();
        let empty: [&str; 0] = [];
        assert_eq!(evaluate_formula(&create_formula(FormulaKind::Product, &empty), &b), Ok(1.0));
        assert_eq!(evaluate_formula(&create_formula(FormulaKind::Sum, &empty), &b), Ok(0.0));
        assert_eq!(
            evaluate_formula(&create_formula(FormulaKind::Min, &empty), &b),
            Ok(f64::INFINITY)
        );
        assert_eq!(
            evaluate_formula(&create_formula(FormulaKind::Max, &empty), &b),
            Ok(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_noisy_or() {
        let node = create_formula(FormulaKind::NoisyOr, &["a", "b"]);
        let b = bindings(&[("a", 0.5), ("b", 0.4)]);
        assert!((evaluate_formula(&node, &b).unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(formula_to_string(&node), "noisy_or(a, b)");

        let empty: [&str; 0] = [];
        assert_eq!(evaluate_formula(&create_formula(FormulaKind::NoisyOr, &empty), &b), Ok(0.0));
    }

    #[test]
    fn test_unbound_variable_fails() {
        let node = create_formula(FormulaKind::Product, &["a", "missing"]);
        let result = evaluate_formula(&node, &bindings(&[("a", 0.5)]));
        assert_eq!(result, Err(FormulaError::UnboundVariable("missing".to_string())));
    }

    #[test]
    fn test_to_string() {
        let node = FormulaNode::Max {
            children: vec![
                create_formula(FormulaKind::Min, &["a", "b"]),
                FormulaNode::scale(0.5, FormulaNode::value("c")),
            ],
        };
        assert_eq!(formula_to_string(&node), "max(min(a, b), 0.5 * c)");
    }

    #[test]
    fn test_variables_dedup() {
        let node = create_formula(FormulaKind::Sum, &["a", "b", "a"]);
        assert_eq!(node.variables(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_serde_tagging() {
        let node = FormulaNode::scale(2.0, FormulaNode::value("x"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "scale");
        assert_eq!(json["child"]["kind"], "value");
        assert_eq!(json["child"]["name"], "x");
    }
}
