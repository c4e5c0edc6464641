//! Bootstrap calibration for small datasets
//!
//! How far a raw score is pulled toward its bucket's empirical rate depends
//! on how many labelled samples exist. With few samples the empirical rate
//! is noise, so it is smoothed with a Beta prior and blended with the raw
//! score instead of replacing it.

use crate::curve::{bucket_index, CalibrationSample};
use crate::error::{check_probability, CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Beta distribution prior over a bucket's success rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    /// Prior pseudo-successes
    pub alpha: f64,
    /// Prior pseudo-failures
    pub beta: f64,
}

impl BetaPrior {
    /// Create a prior; both parameters must be positive
    pub fn new(alpha: f64, beta: f64) -> CalibrationResult<Self> {
        let prior = Self { alpha, beta };
        prior.validate()?;
        Ok(prior)
    }

    /// Beta(1, 1)
    pub fn uniform() -> Self {
        Self { alpha: 1.0, beta: 1.0 }
    }

    /// Beta(0.5, 0.5)
    pub fn jeffreys() -> Self {
        Self { alpha: 0.5, beta: 0.5 }
    }

    /// Prior mean `α / (α + β)`
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    fn validate(&self) -> CalibrationResult<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(CalibrationError::invalid("alpha", format!("must be positive, got {}", self.alpha)));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(CalibrationError::invalid("beta", format!("must be positive, got {}", self.beta)));
        }
        Ok(())
    }
}

/// Sample-size tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapTier {
    /// Fewer than 10 samples: raw scores are used as-is
    Uncalibrated,
    /// 10 to 49 samples
    Sparse,
    /// 50 to 199 samples
    Moderate,
    /// 200 samples or more
    Full,
}

impl BootstrapTier {
    /// Tier for `sample_size` labelled samples
    pub fn for_sample_size(sample_size: usize) -> Self {
        match sample_size {
            0..=9 => BootstrapTier::Uncalibrated,
            10..=49 => BootstrapTier::Sparse,
            50..=199 => BootstrapTier::Moderate,
            _ => BootstrapTier::Full,
        }
    }

    /// Wire name of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapTier::Uncalibrated => "uncalibrated",
            BootstrapTier::Sparse => "sparse",
            BootstrapTier::Moderate => "moderate",
            BootstrapTier::Full => "full",
        }
    }
}

/// Calibration settings chosen for a dataset size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    /// Tier the settings were chosen for
    pub tier: BootstrapTier,
    /// Number of labelled samples
    pub sample_size: usize,
    /// Blend weight `w` of the smoothed rate, `(1−w)·raw + w·smoothed`
    pub calibration_weight: f64,
    /// Prior used for smoothing
    pub prior: BetaPrior,
    /// Whether isotonic calibration is worth fitting
    pub use_isotonic: bool,
    /// Number of equal-width buckets
    pub bucket_count: usize,
    /// Observations a bucket needs before its rate is trusted
    pub min_samples_per_bucket: usize,
}

/// Choose calibration settings for `sample_size` labelled samples
///
/// # Examples
///
/// ```
/// use credence_calibration::{bootstrap_calibration, BootstrapTier};
///
/// let config = bootstrap_calibration(30);
/// assert_eq!(config.tier, BootstrapTier::Sparse);
/// assert_eq!(config.calibration_weight, 0.3);
/// assert!(!config.use_isotonic);
/// ```
pub fn bootstrap_calibration(sample_size: usize) -> BootstrapConfig {
    let tier = BootstrapTier::for_sample_size(sample_size);
    let config = match tier {
        BootstrapTier::Uncalibrated => BootstrapConfig {
            tier,
            sample_size,
            calibration_weight: 0.0,
            prior: BetaPrior::uniform(),
            use_isotonic: false,
            bucket_count: 1,
            min_samples_per_bucket: 10,
        },
        BootstrapTier::Sparse => BootstrapConfig {
            tier,
            sample_size,
            calibration_weight: 0.3,
            prior: BetaPrior { alpha: 2.0, beta: 2.0 },
            use_isotonic: false,
            bucket_count: (sample_size / 3).clamp(1, 5),
            min_samples_per_bucket: 3,
        },
        BootstrapTier::Moderate => BootstrapConfig {
            tier,
            sample_size,
            calibration_weight: 0.6,
            prior: BetaPrior::uniform(),
            use_isotonic: true,
            bucket_count: (sample_size / 5).min(10),
            min_samples_per_bucket: 5,
        },
        BootstrapTier::Full => BootstrapConfig {
            tier,
            sample_size,
            calibration_weight: 1.0,
            prior: BetaPrior::jeffreys(),
            use_isotonic: true,
            bucket_count: 10,
            min_samples_per_bucket: 10,
        },
    };

    debug!(
        sample_size,
        tier = tier.as_str(),
        buckets = config.bucket_count,
        weight = config.calibration_weight,
        "Selected bootstrap calibration tier"
    );

    config
}

/// Beta-Binomial posterior mean `(s + α) / (t + α + β)`
pub fn bayesian_smooth(successes: u64, total: u64, prior: &BetaPrior) -> CalibrationResult<f64> {
    if successes > total {
        return Err(CalibrationError::invalid(
            "successes",
            format!("{} exceeds total {}", successes, total),
        ));
    }
    prior.validate()?;
    Ok((successes as f64 + prior.alpha) / (total as f64 + prior.alpha + prior.beta))
}

/// Outcome counts for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketCounts {
    /// Positive outcomes
    pub successes: u64,
    /// All outcomes
    pub total: u64,
}

impl BucketCounts {
    /// Count outcomes per bucket, `bucket_count` equal-width buckets
    ///
    /// Confidences must lie in [0, 1], as for
    /// [`compute_calibration_curve`](crate::compute_calibration_curve).
    pub fn from_samples(
        samples: &[CalibrationSample],
        bucket_count: usize,
    ) -> CalibrationResult<Vec<BucketCounts>> {
        let mut counts = vec![BucketCounts::default(); bucket_count];
        if bucket_count == 0 {
            return Ok(counts);
        }
        for sample in samples {
            check_probability("confidence", sample.confidence)?;
            let bucket = &mut counts[bucket_index(sample.confidence, bucket_count)];
            bucket.total += 1;
            if sample.outcome {
                bucket.successes += 1;
            }
        }
        Ok(counts)
    }
}

/// Calibrate a raw score from per-bucket counts
///
/// The bucket's rate is smoothed with the config's prior when it has at
/// least `min_samples_per_bucket` observations; otherwise the prior mean
/// stands in. The result is `(1−w)·raw + w·smoothed`.
pub fn apply_bootstrap_calibration(
    raw: f64,
    bucket_counts: &[BucketCounts],
    config: &BootstrapConfig,
) -> CalibrationResult<f64> {
    check_probability("raw", raw)?;
    check_probability("calibrationWeight", config.calibration_weight)?;

    let counts = if config.bucket_count == 0 {
        None
    } else {
        bucket_counts.get(bucket_index(raw, config.bucket_count))
    };

    let smoothed = match counts {
        Some(c) if c.total >= config.min_samples_per_bucket as u64 => {
            bayesian_smooth(c.successes, c.total, &config.prior)?
        }
        _ => {
            config.prior.validate()?;
            config.prior.mean()
        }
    };

    let w = config.calibration_weight;
    Ok(((1.0 - w) * raw + w * smoothed).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(bootstrap_calibration(0).tier, BootstrapTier::Uncalibrated);
        assert_eq!(bootstrap_calibration(9).tier, BootstrapTier::Uncalibrated);
        assert_eq!(bootstrap_calibration(10).tier, BootstrapTier::Sparse);
        assert_eq!(bootstrap_calibration(49).tier, BootstrapTier::Sparse);
        assert_eq!(bootstrap_calibration(50).tier, BootstrapTier::Moderate);
        assert_eq!(bootstrap_calibration(199).tier, BootstrapTier::Moderate);
        assert_eq!(bootstrap_calibration(200).tier, BootstrapTier::Full);
    }

    #[test]
    fn test_tier_settings() {
        let none = bootstrap_calibration(5);
        assert_eq!(none.calibration_weight, 0.0);
        assert!(!none.use_isotonic);

        let sparse = bootstrap_calibration(12);
        assert_eq!(sparse.prior, BetaPrior { alpha: 2.0, beta: 2.0 });
        assert_eq!(sparse.bucket_count, 4);
        assert_eq!(bootstrap_calibration(40).bucket_count, 5);

        let moderate = bootstrap_calibration(120);
        assert_eq!(moderate.calibration_weight, 0.6);
        assert!(moderate.use_isotonic);
        assert_eq!(moderate.bucket_count, 10);

        let full = bootstrap_calibration(1000);
        assert_eq!(full.calibration_weight, 1.0);
        assert_eq!(full.prior, BetaPrior::jeffreys());
    }

    #[test]
    fn test_bayesian_smooth() {
        assert_eq!(bayesian_smooth(0, 0, &BetaPrior::uniform()).unwrap(), 0.5);
        assert!((bayesian_smooth(8, 10, &BetaPrior::uniform()).unwrap() - 0.75).abs() < 1e-12);
        assert!(bayesian_smooth(11, 10, &BetaPrior::uniform()).is_err());
        assert!(bayesian_smooth(1, 2, &BetaPrior { alpha: 0.0, beta: 1.0 }).is_err());
        assert!(BetaPrior::new(1.0, -1.0).is_err());
    }

    #[test]
    fn test_bucket_counts_from_samples() {
        let samples = vec![
            CalibrationSample::new(0.1, true),
            CalibrationSample::new(0.2, false),
            CalibrationSample::new(1.0, true),
        ];
        let counts = BucketCounts::from_samples(&samples, 2).unwrap();
        assert_eq!(counts[0], BucketCounts { successes: 1, total: 2 });
        assert_eq!(counts[1], BucketCounts { successes: 1, total: 1 });
    }

    #[test]
    fn test_bucket_counts_reject_out_of_range_confidence() {
        for confidence in [f64::NAN, -0.1, 1.2] {
            let samples = vec![CalibrationSample::new(0.5, true), CalibrationSample::new(confidence, false)];
            assert!(matches!(
                BucketCounts::from_samples(&samples, 5),
                Err(CalibrationError::InvalidArgument { field: "confidence", .. })
            ));
        }
    }

    #[test]
    fn test_apply_blends_smoothed_rate() {
        let config = bootstrap_calibration(120);
        let mut counts = vec![BucketCounts::default(); config.bucket_count];
        counts[8] = BucketCounts { successes: 3, total: 8 };

        // (3 + 1) / (8 + 2) = 0.4; 0.4 * 0.85 + 0.6 * 0.4 = 0.58
        let calibrated = apply_bootstrap_calibration(0.85, &counts, &config).unwrap();
        assert!((calibrated - 0.58).abs() < 1e-12);
    }

    #[test]
    fn test_apply_thin_bucket_uses_prior_mean() {
        let config = bootstrap_calibration(30);
        let counts = vec![BucketCounts { successes: 1, total: 2 }; config.bucket_count];

        // 0.7 * 0.9 + 0.3 * 0.5
        let calibrated = apply_bootstrap_calibration(0.9, &counts, &config).unwrap();
        assert!((calibrated - 0.78).abs() < 1e-12);
    }

    #[test]
    fn test_apply_uncalibrated_returns_raw() {
        let config = bootstrap_calibration(3);
        assert_eq!(apply_bootstrap_calibration(0.42, &[], &config).unwrap(), 0.42);
        assert!(apply_bootstrap_calibration(1.5, &[], &config).is_err());
    }
}
