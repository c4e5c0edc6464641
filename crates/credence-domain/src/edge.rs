//! Evidence edges between claims (pairwise only)

use crate::ClaimId;
use serde::{Deserialize, Serialize};

/// Type of an evidence edge
///
/// For `DependsOn` and `Assumes`, `from` relies on `to`. For `Supports`,
/// `from` lends support to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// `from` is only true if `to` is
    DependsOn,

    /// `from` takes `to` for granted (weaker coupling)
    Assumes,

    /// `from` is evidence for `to`
    Supports,

    /// `from` contradicts `to`
    Contradicts,

    /// `from` replaces `to`
    Supersedes,

    /// `from` was synthesized from `to`
    DerivedFrom,
}

impl EdgeType {
    /// Wire name of the edge type
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::DependsOn => "depends_on",
            EdgeType::Assumes => "assumes",
            EdgeType::Supports => "supports",
            EdgeType::Contradicts => "contradicts",
            EdgeType::Supersedes => "supersedes",
            EdgeType::DerivedFrom => "derived_from",
        }
    }

    /// Parse an edge type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "depends_on" => Some(EdgeType::DependsOn),
            "assumes" => Some(EdgeType::Assumes),
            "supports" => Some(EdgeType::Supports),
            "contradicts" => Some(EdgeType::Contradicts),
            "supersedes" => Some(EdgeType::Supersedes),
            "derived_from" => Some(EdgeType::DerivedFrom),
            _ => None,
        }
    }
}

/// A directed evidence edge between two claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEdge {
    /// Source claim ID
    pub from_claim_id: ClaimId,

    /// Target claim ID
    pub to_claim_id: ClaimId,

    /// Type of edge
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Strength of the edge [0.0, 1.0]
    pub strength: f64,

    /// When this edge was established
    pub created_at: u64,
}

impl EvidenceEdge {
    /// Create a new edge
    ///
    /// # Panics
    /// Panics if strength is outside [0, 1]
    pub fn new(
        from_claim_id: ClaimId,
        to_claim_id: ClaimId,
        edge_type: EdgeType,
        strength: f64,
        created_at: u64,
    ) -> Self {
        assert!((0.0..=1.0).contains(&strength), "Strength must be in [0, 1]");

        Self {
            from_claim_id,
            to_claim_id,
            edge_type,
            strength,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_type_wire_names() {
        for edge_type in [
            EdgeType::DependsOn,
            EdgeType::Assumes,
            EdgeType::Supports,
            EdgeType::Contradicts,
            EdgeType::Supersedes,
            EdgeType::DerivedFrom,
        ] {
            assert_eq!(EdgeType::parse(edge_type.as_str()), Some(edge_type));
            let json = serde_json::to_string(&edge_type).unwrap();
            assert_eq!(json, format!("\"{}\"", edge_type.as_str()));
        }
    }

    #[test]
    fn test_edge_json_uses_type_field() {
        let edge = EvidenceEdge::new("b".into(), "a".into(), EdgeType::DependsOn, 1.0, 7);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "depends_on");
        assert_eq!(json["fromClaimId"], "b");
        assert_eq!(json["toClaimId"], "a");
    }

    #[test]
    #[should_panic]
    fn test_invalid_strength() {
        EvidenceEdge::new("b".into(), "a".into(), EdgeType::Supports, 1.5, 0);
    }
}
