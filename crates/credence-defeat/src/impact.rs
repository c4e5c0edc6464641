//! Confidence impact of defeaters
//!
//! Applying a defeater wraps the current confidence in a `derived` value whose
//! inputs are exactly `original` (the confidence before) and `defeater` (a
//! deterministic marker naming the defeater). The formula carries a tag that
//! records the numeric effect:
//!
//! | severity | effect | tag |
//! |---|---|---|
//! | full | 0 | `defeated_by(<type>)` |
//! | partial | `max(0, v - r)` | `partial_defeat(<type>, -r)` |
//! | warning | `max(0, v - r/2)` | `warning(<type>, -r/2)` |
//! | informational | unchanged | `noted(<type>)` |
//!
//! Undo reads the tag back; it never inverts the arithmetic.

use crate::meta::get_effectively_active_defeaters;
use credence_domain::{
    CalibrationStatus, ConfidenceValue, DefeaterId, DefeaterSeverity, DerivedInput,
    ExtendedDefeater,
};
use serde::{Deserialize, Serialize};

const ORIGINAL_INPUT: &str = "original";
const DEFEATER_INPUT: &str = "defeater";
const DEFEATER_REASON_PREFIX: &str = "defeater_";

/// Result of applying one defeater to a confidence value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefeaterApplication {
    /// Confidence after the defeater
    pub confidence: ConfidenceValue,
    /// Whether the defeater forced the confidence to zero
    pub fully_defeated: bool,
    /// Confidence before the defeater
    pub original_confidence: ConfidenceValue,
    /// The applied defeater
    pub defeater_id: DefeaterId,
    /// What happened, for logs and audit trails
    pub description: String,
}

/// Result of applying a list of defeaters in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefeatOutcome {
    /// Confidence after every defeater
    pub confidence: ConfidenceValue,
    /// Whether any defeater fully defeated the value
    pub fully_defeated: bool,
    /// One entry per defeater, in application order
    pub applications: Vec<DefeaterApplication>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TagKind {
    DefeatedBy,
    PartialDefeat,
    Warning,
    Noted,
}

impl TagKind {
    fn name(self) -> &'static str {
        match self {
            TagKind::DefeatedBy => "defeated_by",
            TagKind::PartialDefeat => "partial_defeat",
            TagKind::Warning => "warning",
            TagKind::Noted => "noted",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "defeated_by" => Some(TagKind::DefeatedBy),
            "partial_defeat" => Some(TagKind::PartialDefeat),
            "warning" => Some(TagKind::Warning),
            "noted" => Some(TagKind::Noted),
            _ => None,
        }
    }
}

/// Parsed formula tag of a defeater application
#[derive(Debug, Clone, PartialEq)]
struct Tag {
    kind: TagKind,
    defeater_type: String,
    /// Amount subtracted (partial and warning only)
    amount: f64,
}

impl Tag {
    fn for_defeater(defeater: &ExtendedDefeater) -> Self {
        let (kind, amount) = match defeater.severity {
            DefeaterSeverity::Full => (TagKind::DefeatedBy, 0.0),
            DefeaterSeverity::Partial => (TagKind::PartialDefeat, defeater.confidence_reduction),
            DefeaterSeverity::Warning => (TagKind::Warning, defeater.confidence_reduction / 2.0),
            DefeaterSeverity::Informational => (TagKind::Noted, 0.0),
        };
        Self {
            kind,
            defeater_type: defeater.defeater_type.as_str().to_string(),
            amount,
        }
    }

    fn render(&self) -> String {
        match self.kind {
            TagKind::PartialDefeat | TagKind::Warning => {
                format!("{}({}, -{})", self.kind.name(), self.defeater_type, self.amount)
            }
            TagKind::DefeatedBy | TagKind::Noted => {
                format!("{}({})", self.kind.name(), self.defeater_type)
            }
        }
    }

    fn parse(formula: &str) -> Option<Self> {
        let (name, rest) = formula.split_once('(')?;
        let kind = TagKind::from_name(name)?;
        let body = rest.strip_suffix(')')?;

        match kind {
            TagKind::PartialDefeat | TagKind::Warning => {
                let (defeater_type, amount) = body.split_once(", -")?;
                Some(Self {
                    kind,
                    defeater_type: defeater_type.to_string(),
                    amount: amount.parse().ok()?,
                })
            }
            TagKind::DefeatedBy | TagKind::Noted => Some(Self {
                kind,
                defeater_type: body.to_string(),
                amount: 0.0,
            }),
        }
    }

    fn apply(&self, value: f64) -> f64 {
        match self.kind {
            TagKind::DefeatedBy => 0.0,
            TagKind::PartialDefeat | TagKind::Warning => (value - self.amount).max(0.0),
            TagKind::Noted => value,
        }
    }

    /// Wrap `original` (which must not be absent) in an application value
    fn wrap(&self, original: &ConfidenceValue, value: f64, id: &DefeaterId) -> ConfidenceValue {
        let calibration_status = match self.kind {
            TagKind::Noted => original.calibration_status(),
            _ => CalibrationStatus::Degraded,
        };

        ConfidenceValue::Derived {
            value: self.apply(value).clamp(0.0, 1.0),
            formula: self.render(),
            formula_ast: None,
            inputs: vec![
                DerivedInput::new(ORIGINAL_INPUT, original.clone()),
                DerivedInput::new(
                    DEFEATER_INPUT,
                    ConfidenceValue::deterministic(
                        true,
                        format!("{}{}", DEFEATER_REASON_PREFIX, id),
                    ),
                ),
            ],
            calibration_status,
        }
    }
}

/// A recognised defeater application: its tag, the defeater and the input
struct Applied<'a> {
    tag: Tag,
    defeater_id: DefeaterId,
    original: &'a ConfidenceValue,
}

fn as_application(value: &ConfidenceValue) -> Option<Applied<'_>> {
    let ConfidenceValue::Derived {
        formula, inputs, ..
    } = value
    else {
        return None;
    };
    let tag = Tag::parse(formula)?;
    let [original, marker] = inputs.as_slice() else {
        return None;
    };
    if original.name != ORIGINAL_INPUT || marker.name != DEFEATER_INPUT {
        return None;
    }
    let ConfidenceValue::Deterministic { reason, .. } = &marker.confidence else {
        return None;
    };
    let id = reason.strip_prefix(DEFEATER_REASON_PREFIX)?;

    Some(Applied {
        tag,
        defeater_id: DefeaterId::from(id),
        original: &original.confidence,
    })
}

/// Apply one defeater to a confidence value
///
/// Absent confidence is returned unchanged; there is nothing left to reduce.
///
/// # Examples
///
/// ```
/// use credence_defeat::apply_defeater_to_confidence;
/// use credence_domain::{ConfidenceValue, DefeaterSeverity, DefeaterType, ExtendedDefeater};
///
/// let measured = ConfidenceValue::measured("bench", 200, 0.9, [0.85, 0.94]).unwrap();
/// let defeater = ExtendedDefeater::new(
///     DefeaterType::CodeChange, DefeaterSeverity::Partial, "parser.rs edited", vec![], 0.25,
/// ).unwrap();
///
/// let applied = apply_defeater_to_confidence(&measured, &defeater);
/// assert!((applied.confidence.numeric_value().unwrap() - 0.65).abs() < 1e-12);
/// assert_eq!(applied.confidence.formula(), Some("partial_defeat(code_change, -0.25)"));
/// ```
pub fn apply_defeater_to_confidence(
    confidence: &ConfidenceValue,
    defeater: &ExtendedDefeater,
) -> DefeaterApplication {
    let Some(value) = confidence.numeric_value() else {
        return DefeaterApplication {
            confidence: confidence.clone(),
            fully_defeated: false,
            original_confidence: confidence.clone(),
            defeater_id: defeater.id.clone(),
            description: format!(
                "Confidence already absent; {} defeater {} not applied",
                defeater.defeater_type, defeater.id
            ),
        };
    };

    let tag = Tag::for_defeater(defeater);
    let result = tag.wrap(confidence, value, &defeater.id);
    let description = match tag.kind {
        TagKind::DefeatedBy => format!("Fully defeated by {}: {}", tag.defeater_type, defeater.description),
        TagKind::PartialDefeat | TagKind::Warning => format!(
            "Reduced by {} ({}): {}",
            tag.amount, tag.defeater_type, defeater.description
        ),
        TagKind::Noted => format!("Noted {}: {}", tag.defeater_type, defeater.description),
    };

    DefeaterApplication {
        confidence: result,
        fully_defeated: defeater.severity == DefeaterSeverity::Full,
        original_confidence: confidence.clone(),
        defeater_id: defeater.id.clone(),
        description,
    }
}

/// Apply defeaters left to right
///
/// Once a value is fully defeated it stays at zero, but every later
/// application is still recorded.
pub fn apply_defeaters_to_confidence<'a, I>(confidence: &ConfidenceValue, defeaters: I) -> DefeatOutcome
where
    I: IntoIterator<Item = &'a ExtendedDefeater>,
{
    let mut current = confidence.clone();
    let mut fully_defeated = false;
    let mut applications = Vec::new();

    for defeater in defeaters {
        let application = apply_defeater_to_confidence(&current, defeater);
        fully_defeated |= application.fully_defeated;
        current = application.confidence.clone();
        applications.push(application);
    }

    DefeatOutcome {
        confidence: current,
        fully_defeated,
        applications,
    }
}

/// Apply only the effectively active defeaters in `all`
pub fn apply_active_defeaters(confidence: &ConfidenceValue, all: &[ExtendedDefeater]) -> DefeatOutcome {
    apply_defeaters_to_confidence(confidence, get_effectively_active_defeaters(all))
}

/// IDs of every defeater applied anywhere in `confidence`, in application order
///
/// Each ID is reported once.
pub fn find_defeaters_in_confidence(confidence: &ConfidenceValue) -> Vec<DefeaterId> {
    fn collect(value: &ConfidenceValue, found: &mut Vec<DefeaterId>) {
        if let Some(applied) = as_application(value) {
            collect(applied.original, found);
            if !found.contains(&applied.defeater_id) {
                found.push(applied.defeater_id);
            }
            return;
        }
        for input in value.inputs() {
            collect(&input.confidence, found);
        }
    }

    let mut found = Vec::new();
    collect(confidence, &mut found);
    found
}

/// Undo the application of `defeater_id`
///
/// When the outermost application is the one being removed, its `original`
/// input is returned unchanged. When it sits deeper in a chain of
/// applications, the applications above it are replayed from their tags on
/// top of the restored value. A value that never saw the defeater comes back
/// as is.
pub fn remove_defeater_from_confidence(
    confidence: &ConfidenceValue,
    defeater_id: &DefeaterId,
) -> ConfidenceValue {
    let Some(applied) = as_application(confidence) else {
        return confidence.clone();
    };
    if &applied.defeater_id == defeater_id {
        return applied.original.clone();
    }

    let restored = remove_defeater_from_confidence(applied.original, defeater_id);
    if &restored == applied.original {
        return confidence.clone();
    }
    match restored.numeric_value() {
        Some(value) => applied.tag.wrap(&restored, value, &applied.defeater_id),
        None => restored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_domain::{AbsentReason, DefeaterStatus, DefeaterType};

    fn defeater(id: &str, severity: DefeaterSeverity, reduction: f64) -> ExtendedDefeater {
        ExtendedDefeater::new(DefeaterType::CodeChange, severity, "parser.rs edited", vec![], reduction)
            .unwrap()
            .with_id(id)
    }

    fn measured(accuracy: f64) -> ConfidenceValue {
        ConfidenceValue::measured("bench", 100, accuracy, [0.0, 1.0]).unwrap()
    }

    fn value_of(c: &ConfidenceValue) -> f64 {
        c.numeric_value().unwrap()
    }

    #[test]
    fn test_full_defeat() {
        let applied = apply_defeater_to_confidence(&measured(0.9), &defeater("d1", DefeaterSeverity::Full, 1.0));
        assert_eq!(value_of(&applied.confidence), 0.0);
        assert!(applied.fully_defeated);
        assert_eq!(applied.confidence.formula(), Some("defeated_by(code_change)"));
        assert_eq!(applied.confidence.calibration_status(), CalibrationStatus::Degraded);
    }

    #[test]
    fn test_partial_defeat_floors_at_zero() {
        let applied =
            apply_defeater_to_confidence(&measured(0.2), &defeater("d1", DefeaterSeverity::Partial, 0.5));
        assert_eq!(value_of(&applied.confidence), 0.0);
        assert!(!applied.fully_defeated);
        assert_eq!(applied.confidence.formula(), Some("partial_defeat(code_change, -0.5)"));
    }

    #[test]
    fn test_warning_halves_reduction() {
        let applied =
            apply_defeater_to_confidence(&measured(0.8), &defeater("d1", DefeaterSeverity::Warning, 0.4));
        assert!((value_of(&applied.confidence) - 0.6).abs() < 1e-12);
        assert_eq!(applied.confidence.formula(), Some("warning(code_change, -0.2)"));
    }

    #[test]
    fn test_informational_keeps_value_and_calibration() {
        let original = measured(0.8);
        let applied =
            apply_defeater_to_confidence(&original, &defeater("d1", DefeaterSeverity::Informational, 0.4));
        assert_eq!(value_of(&applied.confidence), 0.8);
        assert_eq!(applied.confidence.formula(), Some("noted(code_change)"));
        assert_eq!(applied.confidence.calibration_status(), CalibrationStatus::Preserved);
    }

    #[test]
    fn test_inputs_record_original_and_marker() {
        let original = measured(0.8);
        let applied = apply_defeater_to_confidence(&original, &defeater("d1", DefeaterSeverity::Partial, 0.1));
        let inputs = applied.confidence.inputs();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, "original");
        assert_eq!(inputs[0].confidence, original);
        assert_eq!(inputs[1].name, "defeater");
        assert_eq!(inputs[1].confidence, ConfidenceValue::deterministic(true, "defeater_d1"));
        assert_eq!(applied.original_confidence, original);
        assert_eq!(applied.defeater_id, DefeaterId::from("d1"));
    }

    #[test]
    fn test_absent_is_untouched() {
        let absent = ConfidenceValue::absent(AbsentReason::Uncalibrated);
        let applied = apply_defeater_to_confidence(&absent, &defeater("d1", DefeaterSeverity::Full, 1.0));
        assert_eq!(applied.confidence, absent);
        assert!(!applied.fully_defeated);
        assert!(applied.description.contains("already absent"));
    }

    #[test]
    fn test_roundtrip_every_severity() {
        let original = measured(0.7);
        for severity in [
            DefeaterSeverity::Full,
            DefeaterSeverity::Partial,
            DefeaterSeverity::Warning,
            DefeaterSeverity::Informational,
        ] {
            let d = defeater("d1", severity, 0.3);
            let applied = apply_defeater_to_confidence(&original, &d);
            assert_eq!(remove_defeater_from_confidence(&applied.confidence, &d.id), original);
        }
    }

    #[test]
    fn test_fold_records_every_application() {
        let defeaters = vec![
            defeater("d1", DefeaterSeverity::Full, 1.0),
            defeater("d2", DefeaterSeverity::Partial, 0.2),
            defeater("d3", DefeaterSeverity::Informational, 0.0),
        ];
        let outcome = apply_defeaters_to_confidence(&measured(0.9), &defeaters);

        assert!(outcome.fully_defeated);
        assert_eq!(value_of(&outcome.confidence), 0.0);
        assert_eq!(outcome.applications.len(), 3);
        assert_eq!(
            find_defeaters_in_confidence(&outcome.confidence),
            vec![DefeaterId::from("d1"), DefeaterId::from("d2"), DefeaterId::from("d3")]
        );
    }

    #[test]
    fn test_find_defeaters_chain_of_n() {
        let n = 12;
        let defeaters: Vec<ExtendedDefeater> = (0..n)
            .map(|i| defeater(&format!("d{}", i), DefeaterSeverity::Warning, 0.02))
            .collect();
        let outcome = apply_defeaters_to_confidence(&measured(0.95), &defeaters);

        let found = find_defeaters_in_confidence(&outcome.confidence);
        assert_eq!(found.len(), n);
        let expected: Vec<DefeaterId> = defeaters.iter().map(|d| d.id.clone()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_find_defeaters_through_composition() {
        let a = apply_defeater_to_confidence(&measured(0.9), &defeater("d1", DefeaterSeverity::Partial, 0.1));
        let b = apply_defeater_to_confidence(&measured(0.8), &defeater("d2", DefeaterSeverity::Partial, 0.1));
        let combined = credence_domain::parallel_all(&[a.confidence, b.confidence]);

        assert_eq!(
            find_defeaters_in_confidence(&combined),
            vec![DefeaterId::from("d1"), DefeaterId::from("d2")]
        );
    }

    #[test]
    fn test_remove_inner_defeater_replays_outer() {
        let original = measured(0.9);
        let d1 = defeater("d1", DefeaterSeverity::Partial, 0.2);
        let d2 = defeater("d2", DefeaterSeverity::Warning, 0.2);
        let outcome = apply_defeaters_to_confidence(&original, [&d1, &d2]);

        let without_d1 = remove_defeater_from_confidence(&outcome.confidence, &d1.id);
        let only_d2 = apply_defeater_to_confidence(&original, &d2).confidence;
        assert_eq!(without_d1, only_d2);
        assert!((value_of(&without_d1) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_remove_unknown_defeater_is_noop() {
        let applied = apply_defeater_to_confidence(&measured(0.9), &defeater("d1", DefeaterSeverity::Partial, 0.2));
        let unchanged = remove_defeater_from_confidence(&applied.confidence, &DefeaterId::from("zzz"));
        assert_eq!(unchanged, applied.confidence);
    }

    #[test]
    fn test_apply_active_skips_reinstated() {
        let d1 = crate::add_meta_defeater(&defeater("d1", DefeaterSeverity::Full, 1.0), &DefeaterId::from("d2"));
        let d2 = defeater("d2", DefeaterSeverity::Informational, 0.0);
        let d3 = defeater("d3", DefeaterSeverity::Partial, 0.1).with_status(DefeaterStatus::Resolved);

        let outcome = apply_active_defeaters(&measured(0.9), &[d1, d2, d3]);
        assert!(!outcome.fully_defeated);
        assert_eq!(outcome.applications.len(), 1);
        assert_eq!(outcome.applications[0].defeater_id, DefeaterId::from("d2"));
        assert_eq!(value_of(&outcome.confidence), 0.9);
    }

    #[test]
    fn test_tag_parse_roundtrip() {
        for formula in [
            "defeated_by(test_failure)",
            "partial_defeat(code_change, -0.25)",
            "warning(staleness, -0.05)",
            "noted(new_info)",
        ] {
            let tag = Tag::parse(formula).unwrap();
            assert_eq!(tag.render(), formula);
        }
        assert!(Tag::parse("min(step_0, step_1)").is_none());
    }
}
