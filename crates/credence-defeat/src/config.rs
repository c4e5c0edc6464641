//! Configuration for transitive defeat propagation
//!
//! Controls traversal depth and whether propagation leaves a `new_info`
//! defeater behind on every claim it marks stale.

use crate::DefeatError;
use serde::{Deserialize, Serialize};

/// Configuration for [`apply_transitive_defeat`](crate::apply_transitive_defeat)
///
/// # Examples
///
/// ```
/// use credence_defeat::PropagationConfig;
///
/// // Default configuration
/// let config = PropagationConfig::default();
/// assert_eq!(config.max_depth, 10);
///
/// // Only direct and second-order dependents
/// let config = PropagationConfig::shallow();
/// assert_eq!(config.max_depth, 2);
///
/// // Mark stale without recording defeaters
/// let config = PropagationConfig::report_only();
/// assert!(!config.materialize_defeaters);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Number of dependency levels to follow
    /// Direct dependents are level 0, so 1 means "direct dependents only"
    /// Default: 10
    pub max_depth: usize,

    /// Record a `new_info` defeater on each newly staled claim
    /// Default: true
    pub materialize_defeaters: bool,

    /// Confidence reduction for defeaters on direct dependents
    /// Default: 0.3
    pub base_reduction: f64,

    /// Factor applied to the reduction for each level further from the root
    /// Default: 0.5
    pub depth_decay: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            materialize_defeaters: true,
            base_reduction: 0.3,
            depth_decay: 0.5,
        }
    }
}

impl PropagationConfig {
    /// Follow only direct and second-order dependents
    pub fn shallow() -> Self {
        Self {
            max_depth: 2,
            ..Self::default()
        }
    }

    /// Mark claims stale but record no defeaters
    pub fn report_only() -> Self {
        Self {
            materialize_defeaters: false,
            ..Self::default()
        }
    }

    /// Check that reductions and decay are usable
    pub fn validate(&self) -> Result<(), DefeatError> {
        if !(0.0..=1.0).contains(&self.base_reduction) {
            return Err(DefeatError::Config(format!(
                "base_reduction must be in [0, 1], got {}",
                self.base_reduction
            )));
        }
        if !(0.0..=1.0).contains(&self.depth_decay) {
            return Err(DefeatError::Config(format!(
                "depth_decay must be in [0, 1], got {}",
                self.depth_decay
            )));
        }
        Ok(())
    }

    /// Reduction for a materialized defeater at `depth`
    pub fn reduction_at(&self, depth: usize) -> f64 {
        let exponent = i32::try_from(depth).unwrap_or(i32::MAX);
        (self.base_reduction * self.depth_decay.powi(exponent)).clamp(0.0, 1.0)
    }
}
