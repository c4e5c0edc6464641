//! Trait definitions for external interactions
//!
//! The claim/edge graph is owned by a collaborator. The reasoning crates only
//! see it through [`ClaimGraph`]; implementations live in other crates.

use crate::{Claim, ClaimId, EvidenceEdge, ExtendedDefeater};

/// Read/write access to the claim and evidence-edge graph
///
/// Implementations must return `Ok(None)` or an empty vector for unknown IDs
/// rather than failing, and upserts must be idempotent. Transaction and
/// locking discipline is the implementation's concern.
pub trait ClaimGraph {
    /// Error type for graph operations
    type Error;

    /// Get a claim by ID
    fn get_claim(&self, id: &ClaimId) -> Result<Option<Claim>, Self::Error>;

    /// Insert or replace a claim
    fn upsert_claim(&mut self, claim: Claim) -> Result<(), Self::Error>;

    /// Insert or replace several claims
    fn upsert_claims(&mut self, claims: Vec<Claim>) -> Result<(), Self::Error> {
        for claim in claims {
            self.upsert_claim(claim)?;
        }
        Ok(())
    }

    /// Edges whose source is `id`
    fn get_edges_from(&self, id: &ClaimId) -> Result<Vec<EvidenceEdge>, Self::Error>;

    /// Edges whose target is `id`
    fn get_edges_to(&self, id: &ClaimId) -> Result<Vec<EvidenceEdge>, Self::Error>;

    /// Insert or replace an edge (keyed by source, target and type)
    fn upsert_edge(&mut self, edge: EvidenceEdge) -> Result<(), Self::Error>;

    /// Insert or replace several edges
    fn upsert_edges(&mut self, edges: Vec<EvidenceEdge>) -> Result<(), Self::Error> {
        for edge in edges {
            self.upsert_edge(edge)?;
        }
        Ok(())
    }

    /// Defeaters whose affected claims include `id`
    fn get_defeaters_for_claim(&self, id: &ClaimId) -> Result<Vec<ExtendedDefeater>, Self::Error>;

    /// Record a defeater
    fn add_defeater(&mut self, defeater: ExtendedDefeater) -> Result<(), Self::Error>;
}
