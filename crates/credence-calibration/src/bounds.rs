//! PAC sample-size bounds
//!
//! By Hoeffding's inequality, `n ≥ ln(2/δ) / (2ε²)` samples estimate a
//! bucket's accuracy within `ε` with probability `1 − δ`. For `k` buckets
//! the union bound replaces `δ` with `δ/k` so every bucket holds at once.

use crate::error::{CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};

/// Samples needed to calibrate within a tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequirement {
    /// Samples needed per bucket
    pub min_samples: usize,
    /// Samples needed across all buckets, assuming an even spread
    pub total_samples: usize,
    /// Tolerance ε
    pub epsilon: f64,
    /// Confidence level `1 − δ`
    pub confidence: f64,
    /// Number of buckets
    pub num_bins: u32,
}

/// Whether a dataset is large enough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRequirements {
    /// `actual ≥ required`
    pub meets: bool,
    /// Samples needed per bucket
    pub required: usize,
    /// Samples available per bucket
    pub actual: usize,
    /// `max(0, required − actual)`
    pub deficit: usize,
    /// Tolerance the available samples support
    pub achievable_accuracy: f64,
}

fn validate_confidence(confidence: f64) -> CalibrationResult<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(CalibrationError::invalid(
            "confidence",
            format!("must be in (0, 1), got {}", confidence),
        ));
    }
    Ok(())
}

fn validate_bins(num_bins: u32) -> CalibrationResult<()> {
    if num_bins == 0 {
        return Err(CalibrationError::invalid("numBins", "must be at least 1"));
    }
    Ok(())
}

/// `ln(2k/δ)`
fn log_term(confidence: f64, num_bins: u32) -> f64 {
    let delta = 1.0 - confidence;
    (2.0 * num_bins as f64 / delta).ln()
}

/// Samples per bucket needed for tolerance `epsilon` at `confidence`
///
/// `num_bins` defaults to 1.
///
/// # Examples
///
/// ```
/// use credence_calibration::compute_min_samples_for_calibration;
///
/// let requirement = compute_min_samples_for_calibration(0.05, 0.95, None).unwrap();
/// assert_eq!(requirement.min_samples, 738);
/// ```
pub fn compute_min_samples_for_calibration(
    epsilon: f64,
    confidence: f64,
    num_bins: Option<u32>,
) -> CalibrationResult<SampleRequirement> {
    if !(epsilon > 0.0 && epsilon < 1.0) {
        return Err(CalibrationError::invalid(
            "epsilon",
            format!("must be in (0, 1), got {}", epsilon),
        ));
    }
    validate_confidence(confidence)?;
    let num_bins = num_bins.unwrap_or(1);
    validate_bins(num_bins)?;

    let min_samples = (log_term(confidence, num_bins) / (2.0 * epsilon * epsilon)).ceil() as usize;

    Ok(SampleRequirement {
        min_samples,
        total_samples: min_samples.saturating_mul(num_bins as usize),
        epsilon,
        confidence,
        num_bins,
    })
}

/// Tolerance achievable with `samples` per bucket, capped at 1
pub fn compute_achievable_accuracy(
    samples: usize,
    confidence: f64,
    num_bins: Option<u32>,
) -> CalibrationResult<f64> {
    validate_confidence(confidence)?;
    let num_bins = num_bins.unwrap_or(1);
    validate_bins(num_bins)?;

    if samples == 0 {
        return Ok(1.0);
    }
    let epsilon = (log_term(confidence, num_bins) / (2.0 * samples as f64)).sqrt();
    Ok(epsilon.min(1.0))
}

/// Compare `actual` samples per bucket against the bound
pub fn check_calibration_requirements(
    actual: usize,
    epsilon: f64,
    confidence: f64,
    num_bins: Option<u32>,
) -> CalibrationResult<CalibrationRequirements> {
    let requirement = compute_min_samples_for_calibration(epsilon, confidence, num_bins)?;
    let required = requirement.min_samples;

    Ok(CalibrationRequirements {
        meets: actual >= required,
        required,
        actual,
        deficit: required.saturating_sub(actual),
        achievable_accuracy: compute_achievable_accuracy(actual, confidence, num_bins)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_bound() {
        let r = compute_min_samples_for_calibration(0.05, 0.95, None).unwrap();
        assert_eq!(r.min_samples, 738);
        assert_eq!(r.total_samples, 738);
        assert_eq!(r.num_bins, 1);
    }

    #[test]
    fn test_union_bound_raises_per_bin_requirement() {
        let one = compute_min_samples_for_calibration(0.1, 0.9, None).unwrap();
        let ten = compute_min_samples_for_calibration(0.1, 0.9, Some(10)).unwrap();
        assert!(ten.min_samples > one.min_samples);
        assert_eq!(ten.total_samples, ten.min_samples * 10);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(compute_min_samples_for_calibration(0.0, 0.95, None).is_err());
        assert!(compute_min_samples_for_calibration(1.0, 0.95, None).is_err());
        assert!(compute_min_samples_for_calibration(0.05, 1.0, None).is_err());
        assert!(compute_min_samples_for_calibration(0.05, f64::NAN, None).is_err());
        assert!(compute_min_samples_for_calibration(0.05, 0.95, Some(0)).is_err());
    }

    #[test]
    fn test_achievable_accuracy() {
        assert_eq!(compute_achievable_accuracy(0, 0.95, None).unwrap(), 1.0);
        assert_eq!(compute_achievable_accuracy(1, 0.95, None).unwrap(), 1.0);

        let eps = compute_achievable_accuracy(738, 0.95, None).unwrap();
        assert!(eps <= 0.05);
        assert!(eps > 0.049);
    }

    #[test]
    fn test_check_requirements() {
        let short = check_calibration_requirements(500, 0.05, 0.95, None).unwrap();
        assert!(!short.meets);
        assert_eq!(short.required, 738);
        assert_eq!(short.deficit, 238);
        assert!(short.achievable_accuracy > 0.05);

        let enough = check_calibration_requirements(1000, 0.05, 0.95, None).unwrap();
        assert!(enough.meets);
        assert_eq!(enough.deficit, 0);
    }

    #[test]
    fn test_requirements_serialize_camel_case() {
        let r = check_calibration_requirements(10, 0.1, 0.9, None).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("achievableAccuracy").is_some());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the bound guarantees 2·exp(−2nε²) ≤ δ
        #[test]
        fn test_hoeffding_holds(epsilon in 0.01f64..0.5, confidence in 0.5f64..0.999) {
            let n = compute_min_samples_for_calibration(epsilon, confidence, None).unwrap().min_samples;
            let delta = 1.0 - confidence;
            let tail = 2.0 * (-2.0 * n as f64 * epsilon * epsilon).exp();
            prop_assert!(tail <= delta * (1.0 + 1e-9));
        }

        /// Property: more samples never make the achievable tolerance worse
        #[test]
        fn test_achievable_accuracy_monotone(n in 1usize..100_000, confidence in 0.5f64..0.999) {
            let a = compute_achievable_accuracy(n, confidence, None).unwrap();
            let b = compute_achievable_accuracy(n + 1, confidence, None).unwrap();
            prop_assert!(b <= a);
        }
    }
}
