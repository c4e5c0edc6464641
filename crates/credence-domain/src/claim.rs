//! Claim module - the unit that confidence and defeaters attach to

use crate::confidence::ConfidenceValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a claim in the external claim graph
///
/// Any string the graph collaborator uses is accepted; freshly generated IDs
/// are UUIDv7 strings, which sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use credence_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert_eq!(id.as_str().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ClaimId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ClaimId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a claim as tracked by the graph collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Currently trusted
    Active,
    /// Awaiting validation
    Pending,
    /// Something it depends on changed; needs re-checking
    Stale,
    /// Defeated by evidence
    Defeated,
    /// In conflict with another claim
    Contradicted,
    /// Replaced by a newer claim
    Superseded,
}

impl ClaimStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Active => "active",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Stale => "stale",
            ClaimStatus::Defeated => "defeated",
            ClaimStatus::Contradicted => "contradicted",
            ClaimStatus::Superseded => "superseded",
        }
    }

    /// Parse a status from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ClaimStatus::Active),
            "pending" => Some(ClaimStatus::Pending),
            "stale" => Some(ClaimStatus::Stale),
            "defeated" => Some(ClaimStatus::Defeated),
            "contradicted" => Some(ClaimStatus::Contradicted),
            "superseded" => Some(ClaimStatus::Superseded),
            _ => None,
        }
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid claim status: {}", s))
    }
}

/// A claim about the analysed code base
///
/// Claims are replaced, not edited: status changes produce a new value that
/// the collaborator upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// Namespace for organization (e.g. repository or module path)
    pub namespace: String,

    /// What the claim asserts
    pub proposition: String,

    /// Current lifecycle status
    pub status: ClaimStatus,

    /// Current confidence
    pub confidence: ConfidenceValue,

    /// When this claim was created (ms since Unix epoch)
    pub created_at: u64,
}

impl Claim {
    /// Create a new active claim
    pub fn new(
        id: ClaimId,
        namespace: impl Into<String>,
        proposition: impl Into<String>,
        confidence: ConfidenceValue,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            proposition: proposition.into(),
            status: ClaimStatus::Active,
            confidence,
            created_at,
        }
    }

    /// Copy of this claim with a different status
    pub fn with_status(&self, status: ClaimStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::AbsentReason;

    #[test]
    fn test_claim_id_chronological() {
        // UUIDv7s generated in sequence should be chronologically ordered
        let id1 = ClaimId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ClaimId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should sort before later UUIDv7");
    }

    #[test]
    fn test_claim_id_accepts_external_strings() {
        let id = ClaimId::from("claim:parser-ok");
        assert_eq!(id.to_string(), "claim:parser-ok");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"claim:parser-ok\"");
    }

    #[test]
    fn test_with_status_leaves_original_untouched() {
        let claim = Claim::new(
            ClaimId::from("a"),
            "repo",
            "fn parse is pure",
            ConfidenceValue::absent(AbsentReason::Uncalibrated),
            1000,
        );
        let stale = claim.with_status(ClaimStatus::Stale);

        assert_eq!(claim.status, ClaimStatus::Active);
        assert_eq!(stale.status, ClaimStatus::Stale);
        assert_eq!(stale.id, claim.id);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("stale".parse::<ClaimStatus>(), Ok(ClaimStatus::Stale));
        assert!("bogus".parse::<ClaimStatus>().is_err());
    }

    #[test]
    fn test_claim_json_shape() {
        let claim = Claim::new(
            ClaimId::from("a"),
            "repo",
            "p",
            ConfidenceValue::deterministic(true, "parsed"),
            42,
        );
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["createdAt"], 42);
        assert_eq!(json["status"], "active");
        assert_eq!(json["confidence"]["type"], "deterministic");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: ClaimId ordering matches string ordering
        #[test]
        fn test_id_ordering_property(a in "[a-z0-9:-]{1,12}", b in "[a-z0-9:-]{1,12}") {
            let id_a = ClaimId::from(a.as_str());
            let id_b = ClaimId::from(b.as_str());
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: status wire names round-trip
        #[test]
        fn test_status_roundtrip(idx in 0usize..6) {
            let all = [
                ClaimStatus::Active,
                ClaimStatus::Pending,
                ClaimStatus::Stale,
                ClaimStatus::Defeated,
                ClaimStatus::Contradicted,
                ClaimStatus::Superseded,
            ];
            let status = all[idx];
            prop_assert_eq!(ClaimStatus::parse(status.as_str()), Some(status));
        }
    }
}
