//! Calibration curves, reports and score adjustment
//!
//! Samples are bucketed into equal-width confidence bins. For each non-empty
//! bucket the gap between stated confidence and observed accuracy is measured:
//!
//! - ECE = Σ (n_b / n) · |stated(b) − accuracy(b)|
//! - MCE = max_b |stated(b) − accuracy(b)|
//! - overconfidence ratio = share of samples in buckets where stated > accuracy
//! - Brier score = (1/n) · Σ (confidence − outcome)²

use crate::error::{check_probability, CalibrationError, CalibrationResult};
use crate::CurveOptions;
use credence_domain::CalibrationStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// A stated confidence and whether the claim turned out true
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Stated confidence [0.0, 1.0]
    pub confidence: f64,
    /// Observed outcome
    pub outcome: bool,
}

impl CalibrationSample {
    /// Create a sample
    pub fn new(confidence: f64, outcome: bool) -> Self {
        Self { confidence, outcome }
    }
}

/// One equal-width bucket of a calibration curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationBucket {
    /// Lower bound (inclusive)
    pub lower: f64,
    /// Upper bound (exclusive, except for the last bucket)
    pub upper: f64,
    /// Mean stated confidence of the samples in the bucket
    pub stated_mean: f64,
    /// Fraction of samples in the bucket whose outcome was true
    pub empirical_accuracy: f64,
    /// Number of samples in the bucket
    pub sample_size: usize,
    /// Binomial standard error of the accuracy, √(p(1−p)/n)
    pub standard_error: f64,
}

impl CalibrationBucket {
    /// Whether the bucket holds no samples
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }

    /// |stated − accuracy|
    pub fn gap(&self) -> f64 {
        (self.stated_mean - self.empirical_accuracy).abs()
    }

    /// Label such as `[0.20, 0.40)`; the last bucket is closed
    pub fn label(&self, is_last: bool) -> String {
        format!(
            "[{:.2}, {:.2}{}",
            self.lower,
            self.upper,
            if is_last { "]" } else { ")" }
        )
    }
}

/// Reliability curve with summary metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationCurve {
    /// All buckets, empty ones included
    pub buckets: Vec<CalibrationBucket>,
    /// Expected calibration error
    pub ece: f64,
    /// Maximum calibration error
    pub mce: f64,
    /// Share of samples in overconfident buckets
    pub overconfidence_ratio: f64,
    /// Mean squared error of the stated confidences
    pub brier_score: f64,
    /// Total number of samples
    pub sample_size: usize,
}

/// Index of the equal-width bucket holding `value`
pub(crate) fn bucket_index(value: f64, bucket_count: usize) -> usize {
    ((value * bucket_count as f64).floor() as usize).min(bucket_count - 1)
}

/// Bucket samples and compute ECE, MCE, overconfidence ratio and Brier score
///
/// # Examples
///
/// ```
/// use credence_calibration::{compute_calibration_curve, CalibrationSample, CurveOptions};
///
/// let samples = [
///     CalibrationSample::new(0.9, true),
///     CalibrationSample::new(0.9, false),
/// ];
/// let curve = compute_calibration_curve(&samples, &CurveOptions::default()).unwrap();
/// assert!((curve.ece - 0.4).abs() < 1e-12);
/// ```
pub fn compute_calibration_curve(
    samples: &[CalibrationSample],
    options: &CurveOptions,
) -> CalibrationResult<CalibrationCurve> {
    options.validate()?;
    if samples.is_empty() {
        return Err(CalibrationError::EmptyInput("samples"));
    }
    for sample in samples {
        check_probability("confidence", sample.confidence)?;
    }

    let k = options.bucket_count;
    let width = 1.0 / k as f64;
    let mut confidence_sums = vec![0.0; k];
    let mut correct = vec![0usize; k];
    let mut counts = vec![0usize; k];

    for sample in samples {
        let idx = bucket_index(sample.confidence, k);
        confidence_sums[idx] += sample.confidence;
        counts[idx] += 1;
        if sample.outcome {
            correct[idx] += 1;
        }
    }

    let n = samples.len() as f64;
    let mut ece = 0.0;
    let mut mce: f64 = 0.0;
    let mut overconfident = 0usize;

    let buckets: Vec<CalibrationBucket> = (0..k)
        .map(|i| {
            let size = counts[i];
            let mut bucket = CalibrationBucket {
                lower: i as f64 * width,
                upper: (i + 1) as f64 * width,
                stated_mean: 0.0,
                empirical_accuracy: 0.0,
                sample_size: size,
                standard_error: 0.0,
            };
            if size > 0 {
                let p = correct[i] as f64 / size as f64;
                bucket.stated_mean = confidence_sums[i] / size as f64;
                bucket.empirical_accuracy = p;
                bucket.standard_error = (p * (1.0 - p) / size as f64).sqrt();

                ece += (size as f64 / n) * bucket.gap();
                mce = mce.max(bucket.gap());
                if bucket.stated_mean > bucket.empirical_accuracy {
                    overconfident += size;
                }
            }
            bucket
        })
        .collect();

    let brier_score = samples
        .iter()
        .map(|s| {
            let target = if s.outcome { 1.0 } else { 0.0 };
            (s.confidence - target).powi(2)
        })
        .sum::<f64>()
        / n;

    Ok(CalibrationCurve {
        buckets,
        ece,
        mce,
        overconfidence_ratio: overconfident as f64 / n,
        brier_score,
        sample_size: samples.len(),
    })
}

/// Correction for one bucket of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAdjustment {
    /// Mean stated confidence
    pub stated_mean: f64,
    /// Observed accuracy
    pub empirical_accuracy: f64,
    /// Amount to add to a raw score in this bucket (accuracy − stated)
    pub adjustment: f64,
    /// Samples backing the adjustment
    pub sample_size: usize,
}

/// A calibration curve for a dataset with its adjustment table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    /// Dataset the curve was measured on
    pub dataset_id: String,
    /// The curve
    pub curve: CalibrationCurve,
    /// Adjustments for non-empty buckets, keyed by bucket label
    pub adjustments: BTreeMap<String, BucketAdjustment>,
}

impl CalibrationReport {
    /// `Preserved` when the ECE is within `max_ece`, `Degraded` otherwise
    pub fn status(&self, max_ece: f64) -> CalibrationStatus {
        if self.curve.ece <= max_ece {
            CalibrationStatus::Preserved
        } else {
            CalibrationStatus::Degraded
        }
    }

    /// Short summary line
    pub fn summary(&self) -> String {
        format!(
            "{}: ECE {:.4}, MCE {:.4}, Brier {:.4}, overconfident {:.1}%, samples {}",
            self.dataset_id,
            self.curve.ece,
            self.curve.mce,
            self.curve.brier_score,
            self.curve.overconfidence_ratio * 100.0,
            self.curve.sample_size
        )
    }
}

/// Package a curve with its per-bucket adjustment table
pub fn build_calibration_report(dataset_id: impl Into<String>, curve: CalibrationCurve) -> CalibrationReport {
    let last = curve.buckets.len().saturating_sub(1);
    let adjustments = curve
        .buckets
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_empty())
        .map(|(i, b)| {
            (
                b.label(i == last),
                BucketAdjustment {
                    stated_mean: b.stated_mean,
                    empirical_accuracy: b.empirical_accuracy,
                    adjustment: b.empirical_accuracy - b.stated_mean,
                    sample_size: b.sample_size,
                },
            )
        })
        .collect();

    let report = CalibrationReport {
        dataset_id: dataset_id.into(),
        curve,
        adjustments,
    };
    info!(
        dataset = %report.dataset_id,
        ece = report.curve.ece,
        mce = report.curve.mce,
        samples = report.curve.sample_size,
        "Calibration report built"
    );
    report
}

/// Shift a raw score by its bucket's adjustment, clamped to [0, 1]
///
/// Scores falling in a bucket without samples are returned unchanged.
pub fn adjust_confidence_score(report: &CalibrationReport, raw: f64) -> CalibrationResult<f64> {
    check_probability("raw", raw)?;
    let buckets = &report.curve.buckets;
    if buckets.is_empty() {
        return Ok(raw);
    }

    let idx = bucket_index(raw, buckets.len());
    let label = buckets[idx].label(idx == buckets.len() - 1);
    Ok(match report.adjustments.get(&label) {
        Some(adj) => (raw + adj.adjustment).clamp(0.0, 1.0),
        None => raw,
    })
}
