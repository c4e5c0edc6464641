//! Isotonic calibration
//!
//! Pool-Adjacent-Violators (PAV) fits the non-decreasing step function from
//! raw score to calibrated probability with the least squared error. Raw
//! scores that tie are pooled before PAV runs, so each distinct score maps to
//! exactly one calibrated value.

use crate::error::{check_probability, CalibrationError, CalibrationResult};
use credence_domain::{CalibrationStatus, ConfidenceValue, DerivedInput};
use serde::{Deserialize, Serialize};

/// A raw prediction and its observed outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Raw score [0.0, 1.0]
    pub predicted: f64,
    /// Observed outcome
    pub actual: bool,
}

impl Prediction {
    /// Create a prediction
    pub fn new(predicted: f64, actual: bool) -> Self {
        Self { predicted, actual }
    }
}

/// One step of an isotonic mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsotonicPoint {
    /// Raw score
    pub raw: f64,
    /// Calibrated probability
    pub calibrated: f64,
}

/// Monotone mapping from raw score to calibrated probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsotonicMapping {
    /// One point per distinct raw score, ascending
    pub points: Vec<IsotonicPoint>,
    /// Smallest raw score seen
    pub min_raw: f64,
    /// Largest raw score seen
    pub max_raw: f64,
    /// Number of predictions fitted
    pub sample_size: usize,
    /// Whether calibrated values strictly increase
    pub is_strictly_monotonic: bool,
}

struct Block {
    sum: f64,
    count: usize,
    /// Raw scores pooled into the block
    raws: Vec<f64>,
}

impl Block {
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Fit an isotonic mapping to `predictions`
///
/// # Examples
///
/// ```
/// use credence_calibration::{isotonic_calibration, Prediction};
///
/// let mapping = isotonic_calibration(&[
///     Prediction::new(0.1, false),
///     Prediction::new(0.2, true),
///     Prediction::new(0.3, false),
///     Prediction::new(0.4, true),
/// ]).unwrap();
///
/// let calibrated: Vec<f64> = mapping.points.iter().map(|p| p.calibrated).collect();
/// assert_eq!(calibrated, vec![0.0, 0.5, 0.5, 1.0]);
/// ```
pub fn isotonic_calibration(predictions: &[Prediction]) -> CalibrationResult<IsotonicMapping> {
    if predictions.is_empty() {
        return Err(CalibrationError::EmptyInput("predictions"));
    }
    for p in predictions {
        check_probability("predicted", p.predicted)?;
    }

    let mut sorted = predictions.to_vec();
    sorted.sort_by(|a, b| a.predicted.total_cmp(&b.predicted));

    let mut blocks: Vec<Block> = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        // Pool ties first
        let raw = sorted[i].predicted;
        let mut block = Block {
            sum: 0.0,
            count: 0,
            raws: vec![raw],
        };
        while i < sorted.len() && sorted[i].predicted == raw {
            block.sum += if sorted[i].actual { 1.0 } else { 0.0 };
            block.count += 1;
            i += 1;
        }
        blocks.push(block);

        // Merge backwards while monotonicity is violated
        while blocks.len() >= 2 {
            let n = blocks.len();
            if blocks[n - 2].mean() <= blocks[n - 1].mean() {
                break;
            }
            if let Some(last) = blocks.pop() {
                if let Some(prev) = blocks.last_mut() {
                    prev.sum += last.sum;
                    prev.count += last.count;
                    prev.raws.extend(last.raws);
                }
            }
        }
    }

    let points: Vec<IsotonicPoint> = blocks
        .iter()
        .flat_map(|block| {
            let mean = block.mean();
            block.raws.iter().map(move |&raw| IsotonicPoint {
                raw,
                calibrated: mean,
            })
        })
        .collect();

    let is_strictly_monotonic = points.windows(2).all(|w| w[0].calibrated < w[1].calibrated);

    Ok(IsotonicMapping {
        min_raw: sorted[0].predicted,
        max_raw: sorted[sorted.len() - 1].predicted,
        sample_size: predictions.len(),
        is_strictly_monotonic,
        points,
    })
}

/// Map a raw score through an isotonic mapping
///
/// Interpolates linearly between the bracketing points and clamps to the
/// endpoint values outside `[min_raw, max_raw]`. An empty mapping returns the
/// raw score; a single-point mapping returns that point's value.
pub fn apply_isotonic_mapping(mapping: &IsotonicMapping, raw: f64) -> f64 {
    let points = &mapping.points;
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return raw;
    };

    if points.len() == 1 || raw <= first.raw {
        return first.calibrated;
    }
    if raw >= last.raw {
        return last.calibrated;
    }

    // First point strictly above raw; at least 1 and below len here
    let upper = points.partition_point(|p| p.raw <= raw);
    let lo = points[upper - 1];
    let hi = points[upper];
    if hi.raw == lo.raw {
        return lo.calibrated;
    }
    let t = (raw - lo.raw) / (hi.raw - lo.raw);
    lo.calibrated + t * (hi.calibrated - lo.calibrated)
}

/// Calibrate a confidence value through an isotonic mapping
///
/// The result is derived from the input as `isotonic(raw)`; absent values
/// pass through unchanged.
pub fn calibrate_confidence(value: &ConfidenceValue, mapping: &IsotonicMapping) -> ConfidenceValue {
    let Some(raw) = value.numeric_value() else {
        return value.clone();
    };

    ConfidenceValue::Derived {
        value: apply_isotonic_mapping(mapping, raw).clamp(0.0, 1.0),
        formula: "isotonic(raw)".to_string(),
        formula_ast: None,
        inputs: vec![DerivedInput::new("raw", value.clone())],
        calibration_status: CalibrationStatus::Preserved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_domain::AbsentReason;

    fn mapping(points: &[(f64, f64)]) -> IsotonicMapping {
        IsotonicMapping {
            points: points
                .iter()
                .map(|&(raw, calibrated)| IsotonicPoint { raw, calibrated })
                .collect(),
            min_raw: points.first().map(|p| p.0).unwrap_or(0.0),
            max_raw: points.last().map(|p| p.0).unwrap_or(0.0),
            sample_size: points.len(),
            is_strictly_monotonic: false,
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(isotonic_calibration(&[]), Err(CalibrationError::EmptyInput("predictions")));
    }

    #[test]
    fn test_single_prediction_maps_to_outcome() {
        let m = isotonic_calibration(&[Prediction::new(0.7, true)]).unwrap();
        assert_eq!(m.points, vec![IsotonicPoint { raw: 0.7, calibrated: 1.0 }]);
        assert_eq!(m.sample_size, 1);
        assert_eq!(apply_isotonic_mapping(&m, 0.1), 1.0);
    }

    #[test]
    fn test_single_violation_pooled() {
        let m = isotonic_calibration(&[
            Prediction::new(0.4, true),
            Prediction::new(0.2, true),
            Prediction::new(0.3, false),
            Prediction::new(0.1, false),
        ])
        .unwrap();

        let calibrated: Vec<f64> = m.points.iter().map(|p| p.calibrated).collect();
        assert_eq!(calibrated, vec![0.0, 0.5, 0.5, 1.0]);
        assert!(!m.is_strictly_monotonic);
        assert_eq!(m.min_raw, 0.1);
        assert_eq!(m.max_raw, 0.4);
    }

    #[test]
    fn test_ties_pooled_before_pav() {
        let m = isotonic_calibration(&[
            Prediction::new(0.5, true),
            Prediction::new(0.5, false),
            Prediction::new(0.5, true),
            Prediction::new(0.9, true),
        ])
        .unwrap();

        assert_eq!(m.points.len(), 2);
        assert!((m.points[0].calibrated - 2.0 / 3.0).abs() < 1e-12);
        assert!(m.is_strictly_monotonic);
    }

    #[test]
    fn test_apply_interpolates_and_clamps() {
        let m = mapping(&[(0.2, 0.1), (0.6, 0.5)]);
        assert!((apply_isotonic_mapping(&m, 0.4) - 0.3).abs() < 1e-12);
        assert_eq!(apply_isotonic_mapping(&m, 0.0), 0.1);
        assert_eq!(apply_isotonic_mapping(&m, 1.0), 0.5);
        assert_eq!(apply_isotonic_mapping(&m, 0.6), 0.5);
    }

    #[test]
    fn test_apply_degenerate_mappings() {
        assert_eq!(apply_isotonic_mapping(&mapping(&[]), 0.42), 0.42);
        assert_eq!(apply_isotonic_mapping(&mapping(&[(0.5, 0.8)]), 0.1), 0.8);
    }

    #[test]
    fn test_out_of_range_prediction_rejected() {
        assert!(isotonic_calibration(&[Prediction::new(f64::NAN, true)]).is_err());
    }

    #[test]
    fn test_calibrate_confidence() {
        let m = mapping(&[(0.0, 0.0), (1.0, 0.5)]);
        let raw = ConfidenceValue::measured("bench", 50, 0.8, [0.7, 0.9]).unwrap();

        let calibrated = calibrate_confidence(&raw, &m);
        assert!((calibrated.numeric_value().unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(calibrated.formula(), Some("isotonic(raw)"));
        assert_eq!(calibrated.inputs()[0].confidence, raw);
        assert_eq!(calibrated.calibration_status(), CalibrationStatus::Preserved);

        let absent = ConfidenceValue::absent(AbsentReason::InsufficientData);
        assert_eq!(calibrate_confidence(&absent, &m), absent);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: fitted mapping is non-decreasing for any input order
        #[test]
        fn test_isotonic_monotone(data in prop::collection::vec((0.0f64..=1.0, any::<bool>()), 1..60)) {
            let predictions: Vec<Prediction> = data.iter().map(|&(p, a)| Prediction::new(p, a)).collect();
            let m = isotonic_calibration(&predictions).unwrap();

            for w in m.points.windows(2) {
                prop_assert!(w[0].raw < w[1].raw);
                prop_assert!(w[0].calibrated <= w[1].calibrated + 1e-12);
            }
        }

        /// Property: applying the mapping stays within the calibrated range
        #[test]
        fn test_apply_within_range(
            data in prop::collection::vec((0.0f64..=1.0, any::<bool>()), 1..40),
            raw in 0.0f64..=1.0,
        ) {
            let predictions: Vec<Prediction> = data.iter().map(|&(p, a)| Prediction::new(p, a)).collect();
            let m = isotonic_calibration(&predictions).unwrap();
            let y = apply_isotonic_mapping(&m, raw);
            prop_assert!((0.0..=1.0).contains(&y));
        }
    }
}
