//! Defeater types
//!
//! A defeater is evidence that a previously accepted claim should no longer be
//! trusted. Defeaters can themselves be defeated (`defeated_by`), which is how
//! reinstatement works. The reasoning over these types lives in
//! `credence-defeat`; this module only defines the values.

use crate::error::ConfidenceError;
use crate::ClaimId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a defeater
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefeaterId(String);

impl DefeaterId {
    /// Generate a new UUIDv7-based DefeaterId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DefeaterId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for DefeaterId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DefeaterId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DefeaterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of evidence the defeater is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterType {
    /// The code the claim is about changed
    CodeChange,
    /// A test covering the claim failed
    TestFailure,
    /// Another claim contradicts this one
    Contradiction,
    /// New information arrived (also used for transitive defeat)
    NewInfo,
    /// The claim is too old to trust
    Staleness,
    /// The evidence does not cover the claim
    CoverageGap,
    /// The tool that produced the evidence failed
    ToolFailure,
    /// The evidence came from a different environment
    SandboxMismatch,
    /// The evidence came from untrusted content
    UntrustedContent,
}

impl DefeaterType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            DefeaterType::CodeChange => "code_change",
            DefeaterType::TestFailure => "test_failure",
            DefeaterType::Contradiction => "contradiction",
            DefeaterType::NewInfo => "new_info",
            DefeaterType::Staleness => "staleness",
            DefeaterType::CoverageGap => "coverage_gap",
            DefeaterType::ToolFailure => "tool_failure",
            DefeaterType::SandboxMismatch => "sandbox_mismatch",
            DefeaterType::UntrustedContent => "untrusted_content",
        }
    }
}

impl fmt::Display for DefeaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly a defeater bears on the claims it affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterSeverity {
    /// Confidence drops to zero
    Full,
    /// Confidence drops by the full reduction
    Partial,
    /// Confidence drops by half the reduction
    Warning,
    /// Recorded, no numeric effect
    Informational,
}

/// Lifecycle status of a defeater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterStatus {
    /// Detected, not yet confirmed
    Pending,
    /// In force
    Active,
    /// Addressed
    Resolved,
    /// Deliberately dismissed
    Ignored,
}

/// A defeater with severity, lifecycle and meta-defeat links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedDefeater {
    /// Unique identifier
    pub id: DefeaterId,

    /// Kind of evidence
    #[serde(rename = "type")]
    pub defeater_type: DefeaterType,

    /// Human-readable explanation
    pub description: String,

    /// Strength of the defeat
    pub severity: DefeaterSeverity,

    /// Lifecycle status
    pub status: DefeaterStatus,

    /// Claims this defeater bears on
    pub affected_claim_ids: Vec<ClaimId>,

    /// Reduction applied for partial and warning severities [0.0, 1.0]
    pub confidence_reduction: f64,

    /// Whether the defeater may be resolved without a human decision
    pub auto_resolvable: bool,

    /// Defeaters that defeat this defeater
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defeated_by: Option<Vec<DefeaterId>>,
}

impl ExtendedDefeater {
    /// Create a new active defeater with a fresh ID
    pub fn new(
        defeater_type: DefeaterType,
        severity: DefeaterSeverity,
        description: impl Into<String>,
        affected_claim_ids: Vec<ClaimId>,
        confidence_reduction: f64,
    ) -> Result<Self, ConfidenceError> {
        let defeater = Self {
            id: DefeaterId::new(),
            defeater_type,
            description: description.into(),
            severity,
            status: DefeaterStatus::Active,
            affected_claim_ids,
            confidence_reduction,
            auto_resolvable: false,
            defeated_by: None,
        };
        defeater.validate()?;
        Ok(defeater)
    }

    /// Same defeater with a caller-chosen ID
    pub fn with_id(mut self, id: impl Into<DefeaterId>) -> Self {
        self.id = id.into();
        self
    }

    /// Same defeater with a different lifecycle status
    pub fn with_status(mut self, status: DefeaterStatus) -> Self {
        self.status = status;
        self
    }

    /// Same defeater marked auto-resolvable
    pub fn auto_resolvable(mut self, auto_resolvable: bool) -> Self {
        self.auto_resolvable = auto_resolvable;
        self
    }

    /// Check field invariants
    pub fn validate(&self) -> Result<(), ConfidenceError> {
        let r = self.confidence_reduction;
        if r.is_nan() || !(0.0..=1.0).contains(&r) {
            return Err(ConfidenceError::OutOfRange {
                field: "confidenceReduction",
                value: r,
            });
        }
        Ok(())
    }

    /// IDs of the defeaters that defeat this one
    pub fn meta_defeaters(&self) -> &[DefeaterId] {
        self.defeated_by.as_deref().unwrap_or(&[])
    }
}
