//! Options for curve and smoothed-ECE computation

use crate::error::{CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};

/// Options for [`compute_calibration_curve`](crate::compute_calibration_curve)
///
/// # Examples
///
/// ```
/// use credence_calibration::CurveOptions;
///
/// assert_eq!(CurveOptions::default().bucket_count, 10);
/// assert_eq!(CurveOptions::coarse().bucket_count, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    /// Number of equal-width confidence buckets
    /// Default: 10
    pub bucket_count: usize,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self { bucket_count: 10 }
    }
}

impl CurveOptions {
    /// Five buckets, for small datasets
    pub fn coarse() -> Self {
        Self { bucket_count: 5 }
    }

    /// Check the options
    pub fn validate(&self) -> CalibrationResult<()> {
        if self.bucket_count == 0 {
            return Err(CalibrationError::invalid("bucketCount", "must be at least 1"));
        }
        Ok(())
    }
}

/// Smoothing kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    /// Standard normal density
    #[default]
    Gaussian,
    /// `0.75 (1 - u²)` on [-1, 1]
    Epanechnikov,
}

impl KernelType {
    /// Kernel weight at standardized distance `u`
    pub fn weight(&self, u: f64) -> f64 {
        match self {
            KernelType::Gaussian => (-0.5 * u * u).exp() / (2.0 * std::f64::consts::PI).sqrt(),
            KernelType::Epanechnikov => {
                if u.abs() <= 1.0 {
                    0.75 * (1.0 - u * u)
                } else {
                    0.0
                }
            }
        }
    }

    /// Wire name of the kernel
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelType::Gaussian => "gaussian",
            KernelType::Epanechnikov => "epanechnikov",
        }
    }
}

impl std::str::FromStr for KernelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(KernelType::Gaussian),
            "epanechnikov" => Ok(KernelType::Epanechnikov),
            _ => Err(format!("Unknown kernel: {}", s)),
        }
    }
}

/// Options for [`compute_smooth_ece`](crate::compute_smooth_ece)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothEceOptions {
    /// Kernel bandwidth; Silverman's rule when unset
    #[serde(default)]
    pub bandwidth: Option<f64>,

    /// Smoothing kernel
    /// Default: gaussian
    #[serde(default)]
    pub kernel: KernelType,

    /// Grid points over [0, 1] the reliability curve is evaluated at
    /// Default: 100
    #[serde(default = "default_eval_points")]
    pub num_eval_points: usize,
}

fn default_eval_points() -> usize {
    100
}

impl Default for SmoothEceOptions {
    fn default() -> Self {
        Self {
            bandwidth: None,
            kernel: KernelType::Gaussian,
            num_eval_points: default_eval_points(),
        }
    }
}

impl SmoothEceOptions {
    /// Check the options
    pub fn validate(&self) -> CalibrationResult<()> {
        if let Some(h) = self.bandwidth {
            if !h.is_finite() || h <= 0.0 {
                return Err(CalibrationError::invalid(
                    "bandwidth",
                    format!("must be positive, got {}", h),
                ));
            }
        }
        if self.num_eval_points < 2 {
            return Err(CalibrationError::invalid("numEvalPoints", "must be at least 2"));
        }
        Ok(())
    }
}
