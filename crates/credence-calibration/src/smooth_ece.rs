//! Kernel-smoothed expected calibration error
//!
//! Binned ECE jumps when a prediction crosses a bucket edge. Smoothed ECE
//! replaces the buckets with a kernel: at each grid point `x` over [0, 1] it
//! takes kernel-weighted means of the predicted score and of the outcome,
//! then averages their gap weighted by the prediction density at `x`.

use crate::config::{KernelType, SmoothEceOptions};
use crate::error::{CalibrationError, CalibrationResult};
use crate::isotonic::Prediction;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bandwidth used when Silverman's rule degenerates
const FALLBACK_BANDWIDTH: f64 = 0.05;

/// Grid points whose density falls below this are left out
const MIN_DENSITY: f64 = 1e-12;

/// One grid point of the smoothed reliability curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothCurvePoint {
    /// Grid position
    pub x: f64,
    /// Kernel-weighted mean predicted score
    pub smoothed_predicted: f64,
    /// Kernel-weighted mean outcome
    pub smoothed_accuracy: f64,
    /// Kernel density of predictions at `x`
    pub density: f64,
}

/// Result of [`compute_smooth_ece`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothEceResult {
    /// Density-weighted mean calibration gap
    pub smooth_ece: f64,
    /// Bandwidth used
    pub bandwidth: f64,
    /// Kernel used
    pub kernel: KernelType,
    /// Number of predictions
    pub sample_size: usize,
    /// Grid points with non-negligible density
    pub curve: Vec<SmoothCurvePoint>,
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Silverman's rule of thumb, `0.9 · min(σ, IQR/1.34) · n^(−1/5)`
///
/// Falls back to σ when the interquartile range is zero. Returns `None`
/// when the scores have no spread at all.
pub fn silverman_bandwidth(scores: &[f64]) -> Option<f64> {
    let n = scores.len();
    if n < 2 {
        return None;
    }

    let mean = scores.iter().sum::<f64>() / n as f64;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sigma = variance.sqrt();

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);

    let spread = if iqr > 0.0 { sigma.min(iqr / 1.34) } else { sigma };
    let h = 0.9 * spread * (n as f64).powf(-0.2);
    (h.is_finite() && h > 0.0).then_some(h)
}

/// Compute the kernel-smoothed ECE of `predictions`
///
/// Predictions are clamped to [0, 1] first.
///
/// # Examples
///
/// ```
/// use credence_calibration::{compute_smooth_ece, Prediction, SmoothEceOptions};
///
/// let predictions = vec![Prediction::new(0.9, false); 20];
/// let result = compute_smooth_ece(&predictions, &SmoothEceOptions::default()).unwrap();
/// assert!((result.smooth_ece - 0.9).abs() < 1e-9);
/// ```
pub fn compute_smooth_ece(
    predictions: &[Prediction],
    options: &SmoothEceOptions,
) -> CalibrationResult<SmoothEceResult> {
    options.validate()?;
    if predictions.is_empty() {
        return Err(CalibrationError::EmptyInput("predictions"));
    }
    if predictions.iter().any(|p| p.predicted.is_nan()) {
        return Err(CalibrationError::invalid("predicted", "must not be NaN"));
    }

    let scores: Vec<f64> = predictions.iter().map(|p| p.predicted.clamp(0.0, 1.0)).collect();
    let outcomes: Vec<f64> = predictions
        .iter()
        .map(|p| if p.actual { 1.0 } else { 0.0 })
        .collect();

    let bandwidth = match options.bandwidth {
        Some(h) => h,
        None => silverman_bandwidth(&scores).unwrap_or_else(|| {
            warn!(
                samples = scores.len(),
                fallback = FALLBACK_BANDWIDTH,
                "Degenerate score spread, using fallback bandwidth"
            );
            FALLBACK_BANDWIDTH
        }),
    };

    let n = scores.len() as f64;
    let m = options.num_eval_points;
    let mut curve = Vec::with_capacity(m);

    for j in 0..m {
        let x = j as f64 / (m - 1) as f64;
        let mut weight_sum = 0.0;
        let mut predicted_sum = 0.0;
        let mut outcome_sum = 0.0;
        for (score, outcome) in scores.iter().zip(&outcomes) {
            let w = options.kernel.weight((x - score) / bandwidth);
            weight_sum += w;
            predicted_sum += w * score;
            outcome_sum += w * outcome;
        }

        let density = weight_sum / (n * bandwidth);
        if density < MIN_DENSITY {
            continue;
        }
        curve.push(SmoothCurvePoint {
            x,
            smoothed_predicted: predicted_sum / weight_sum,
            smoothed_accuracy: outcome_sum / weight_sum,
            density,
        });
    }

    let total_density: f64 = curve.iter().map(|p| p.density).sum();
    let smooth_ece = if total_density > 0.0 {
        curve
            .iter()
            .map(|p| p.density * (p.smoothed_predicted - p.smoothed_accuracy).abs())
            .sum::<f64>()
            / total_density
    } else {
        warn!(bandwidth, "No grid point carries density, smoothed ECE is zero");
        0.0
    };

    Ok(SmoothEceResult {
        smooth_ece,
        bandwidth,
        kernel: options.kernel,
        sample_size: predictions.len(),
        curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(
            compute_smooth_ece(&[], &SmoothEceOptions::default()),
            Err(CalibrationError::EmptyInput("predictions"))
        );
    }

    #[test]
    fn test_perfectly_calibrated_is_zero() {
        let predictions: Vec<Prediction> = (0..40).map(|i| Prediction::new(0.5, i % 2 == 0)).collect();
        let result = compute_smooth_ece(&predictions, &SmoothEceOptions::default()).unwrap();
        assert!(result.smooth_ece < 1e-9);
        assert_eq!(result.bandwidth, FALLBACK_BANDWIDTH);
        assert_eq!(result.sample_size, 40);
    }

    #[test]
    fn test_always_wrong_is_large() {
        let predictions = vec![Prediction::new(0.9, false); 25];
        let result = compute_smooth_ece(&predictions, &SmoothEceOptions::default()).unwrap();
        assert!((result.smooth_ece - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_predictions_clamped() {
        let predictions = vec![Prediction::new(1.5, true), Prediction::new(-0.2, false)];
        let options = SmoothEceOptions {
            bandwidth: Some(0.1),
            ..Default::default()
        };
        let result = compute_smooth_ece(&predictions, &options).unwrap();
        assert!(result.smooth_ece < 0.05);
    }

    #[test]
    fn test_epanechnikov_skips_empty_regions() {
        let predictions = vec![Prediction::new(0.2, true); 10];
        let options = SmoothEceOptions {
            bandwidth: Some(0.05),
            kernel: KernelType::Epanechnikov,
            num_eval_points: 101,
        };
        let result = compute_smooth_ece(&predictions, &options).unwrap();
        assert!(result.curve.iter().all(|p| (p.x - 0.2).abs() < 0.05 + 1e-9));
        assert!((result.smooth_ece - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_silverman_bandwidth() {
        assert_eq!(silverman_bandwidth(&[0.3]), None);
        assert_eq!(silverman_bandwidth(&[0.4, 0.4, 0.4]), None);

        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let h = silverman_bandwidth(&scores).unwrap();
        assert!(h > 0.05 && h < 0.2);
    }

    #[test]
    fn test_nan_rejected() {
        assert!(compute_smooth_ece(&[Prediction::new(f64::NAN, true)], &SmoothEceOptions::default()).is_err());
    }
}
