//! Credence Calibration
//!
//! Measures and corrects the gap between the confidence a claim states and
//! how often claims at that confidence turn out to be true.
//!
//! # Overview
//!
//! - **Measurement**: [`compute_calibration_curve`] buckets labelled samples
//!   and reports ECE, MCE, overconfidence and the Brier score;
//!   [`compute_smooth_ece`] gives a bucket-free alternative.
//! - **Correction**: [`isotonic_calibration`] fits a monotone mapping from raw
//!   score to probability; [`apply_bootstrap_calibration`] blends raw scores
//!   with Beta-smoothed bucket rates when data is scarce.
//! - **Sample-size planning**: [`compute_min_samples_for_calibration`] and
//!   friends apply Hoeffding's inequality to say how much labelled data a
//!   tolerance needs.
//!
//! ## Bootstrap tiers
//!
//! | Samples | Weight | Prior | Isotonic |
//! |---------|--------|-------|----------|
//! | < 10 | 0.0 | Beta(1, 1) | no |
//! | 10 - 49 | 0.3 | Beta(2, 2) | no |
//! | 50 - 199 | 0.6 | Beta(1, 1) | yes |
//! | ≥ 200 | 1.0 | Beta(0.5, 0.5) | yes |
//!
//! # Usage
//!
//! ```
//! use credence_calibration::{
//!     build_calibration_report, compute_calibration_curve, CalibrationSample, CurveOptions,
//! };
//!
//! let samples = vec![
//!     CalibrationSample::new(0.05, false),
//!     CalibrationSample::new(0.15, true),
//!     CalibrationSample::new(0.25, true),
//!     CalibrationSample::new(0.85, false),
//!     CalibrationSample::new(0.95, true),
//! ];
//!
//! let curve = compute_calibration_curve(&samples, &CurveOptions::coarse()).unwrap();
//! assert!((curve.ece - 0.47).abs() < 1e-9);
//!
//! let report = build_calibration_report("nightly", curve);
//! assert!(report.adjustments.contains_key("[0.00, 0.20)"));
//! ```
//!
//! # Configuration
//!
//! Curve and smoothing options can be configured via TOML:
//!
//! ```toml
//! [curve]
//! bucket_count = 10
//!
//! [smooth_ece]
//! kernel = "gaussian"
//! num_eval_points = 100
//! ```

#![warn(missing_docs)]

mod bootstrap;
mod bounds;
mod config;
mod curve;
mod error;
mod isotonic;
mod smooth_ece;

pub use bootstrap::{
    apply_bootstrap_calibration, bayesian_smooth, bootstrap_calibration, BetaPrior,
    BootstrapConfig, BootstrapTier, BucketCounts,
};
pub use bounds::{
    check_calibration_requirements, compute_achievable_accuracy,
    compute_min_samples_for_calibration, CalibrationRequirements, SampleRequirement,
};
pub use config::{CurveOptions, KernelType, SmoothEceOptions};
pub use curve::{
    adjust_confidence_score, build_calibration_report, compute_calibration_curve,
    BucketAdjustment, CalibrationBucket, CalibrationCurve, CalibrationReport, CalibrationSample,
};
pub use error::{CalibrationError, CalibrationResult};
pub use isotonic::{
    apply_isotonic_mapping, calibrate_confidence, isotonic_calibration, IsotonicMapping,
    IsotonicPoint, Prediction,
};
pub use smooth_ece::{compute_smooth_ece, silverman_bandwidth, SmoothCurvePoint, SmoothEceResult};
