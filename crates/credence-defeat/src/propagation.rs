//! Transitive defeat propagation over the claim graph
//!
//! Three edge types carry defeat:
//!
//! - `depends_on` (forward): a claim that depends on the defeated claim must be
//!   marked stale
//! - `assumes` (forward): a claim that assumes it should be investigated
//! - `supports` (reverse): a claim the defeated claim supported has lost
//!   evidence and must be revalidated
//!
//! Traversal is breadth first, so every claim is reported once at the
//! smallest depth it is reachable at.

use crate::{DefeatError, PropagationConfig};
use credence_domain::{
    ClaimGraph, ClaimId, ClaimStatus, DefeaterId, DefeaterSeverity, DefeaterType, EdgeType,
    EvidenceEdge, ExtendedDefeater,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// What a dependent claim should undergo after its dependency was defeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Dependent inherits the defeat
    MarkStale,
    /// Assumption may no longer hold
    Investigate,
    /// Supporting evidence was lost
    Revalidate,
}

impl SuggestedAction {
    /// Action implied by an edge type; `None` for edges that carry no defeat
    pub fn for_edge(edge_type: EdgeType) -> Option<Self> {
        match edge_type {
            EdgeType::DependsOn => Some(SuggestedAction::MarkStale),
            EdgeType::Assumes => Some(SuggestedAction::Investigate),
            EdgeType::Supports => Some(SuggestedAction::Revalidate),
            EdgeType::Contradicts | EdgeType::Supersedes | EdgeType::DerivedFrom => None,
        }
    }

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::MarkStale => "mark_stale",
            SuggestedAction::Investigate => "investigate",
            SuggestedAction::Revalidate => "revalidate",
        }
    }
}

/// A claim reached by defeat propagation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedClaim {
    /// The affected claim
    pub claim_id: ClaimId,
    /// Distance from the defeated claim; direct dependents are 0
    pub depth: usize,
    /// Edge type through which the claim was reached
    pub dependency_type: EdgeType,
    /// Claims from the defeated claim to this one, both ends included
    pub dependency_path: Vec<ClaimId>,
    /// What to do with the claim
    pub suggested_action: SuggestedAction,
}

/// Outcome of [`apply_transitive_defeat`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitiveDefeatReport {
    /// The defeated claim propagation started from
    pub root: ClaimId,
    /// Every claim the propagation reached
    pub affected: Vec<AffectedClaim>,
    /// Claims newly marked stale
    pub staled_count: usize,
    /// Defeaters recorded on staled claims
    pub defeaters_created: Vec<DefeaterId>,
}

/// Traversal direction for [`get_dependency_graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Claims that would be affected if the root were defeated
    Downstream,
    /// Claims the root relies on
    Upstream,
}

/// A node of a dependency graph view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Claim ID
    pub claim_id: ClaimId,
    /// Current status, `None` when the graph has no such claim
    pub status: Option<ClaimStatus>,
    /// Distance from the root; the root itself is 0
    pub depth: usize,
}

/// Node/edge view around one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraph {
    /// Claim the traversal started from
    pub root: ClaimId,
    /// Direction traversed
    pub direction: Direction,
    /// Reached claims, root first, in breadth-first order
    pub nodes: Vec<GraphNode>,
    /// Traversed edges, each once
    pub edges: Vec<EvidenceEdge>,
}

/// Edges leaving `id` in the given direction, paired with the claim they reach
fn neighbors<G>(
    graph: &G,
    id: &ClaimId,
    direction: Direction,
) -> Result<Vec<(ClaimId, EvidenceEdge)>, DefeatError>
where
    G: ClaimGraph,
    G::Error: std::fmt::Display,
{
    let incoming = graph.get_edges_to(id).map_err(DefeatError::store)?;
    let outgoing = graph.get_edges_from(id).map_err(DefeatError::store)?;

    let forward = |edge: &EvidenceEdge| matches!(edge.edge_type, EdgeType::DependsOn | EdgeType::Assumes);
    let reverse = |edge: &EvidenceEdge| edge.edge_type == EdgeType::Supports;

    let mut found = Vec::new();
    match direction {
        Direction::Downstream => {
            for edge in incoming.into_iter().filter(|e| forward(e)) {
                found.push((edge.from_claim_id.clone(), edge));
            }
            for edge in outgoing.into_iter().filter(|e| reverse(e)) {
                found.push((edge.to_claim_id.clone(), edge));
            }
        }
        Direction::Upstream => {
            for edge in outgoing.into_iter().filter(|e| forward(e)) {
                found.push((edge.to_claim_id.clone(), edge));
            }
            for edge in incoming.into_iter().filter(|e| reverse(e)) {
                found.push((edge.from_claim_id.clone(), edge));
            }
        }
    }
    Ok(found)
}

/// Find every claim affected by the defeat of `claim_id`
///
/// Claims at depth `max_depth` or deeper are not reported, so a `max_depth`
/// of 1 yields direct dependents only.
///
/// # Examples
///
/// ```
/// use credence_defeat::{propagate_defeat, SuggestedAction};
/// use credence_domain::{ClaimGraph, ClaimId, EdgeType, EvidenceEdge};
/// use credence_store::SqliteStore;
///
/// let mut store = SqliteStore::new(":memory:").unwrap();
/// // b depends on a
/// store.upsert_edge(EvidenceEdge::new("b".into(), "a".into(), EdgeType::DependsOn, 1.0, 0)).unwrap();
///
/// let affected = propagate_defeat(&store, &ClaimId::from("a"), 10).unwrap();
/// assert_eq!(affected.len(), 1);
/// assert_eq!(affected[0].suggested_action, SuggestedAction::MarkStale);
/// ```
pub fn propagate_defeat<G>(
    graph: &G,
    claim_id: &ClaimId,
    max_depth: usize,
) -> Result<Vec<AffectedClaim>, DefeatError>
where
    G: ClaimGraph,
    G::Error: std::fmt::Display,
{
    let mut affected = Vec::new();
    let mut visited: HashSet<ClaimId> = HashSet::from([claim_id.clone()]);
    // (claim to expand, path to it, depth its dependents would get)
    let mut queue = VecDeque::from([(claim_id.clone(), vec![claim_id.clone()], 0usize)]);

    while let Some((current, path, child_depth)) = queue.pop_front() {
        if child_depth >= max_depth {
            continue;
        }

        for (next, edge) in neighbors(graph, &current, Direction::Downstream)? {
            let Some(action) = SuggestedAction::for_edge(edge.edge_type) else {
                continue;
            };
            if !visited.insert(next.clone()) {
                continue;
            }

            let mut next_path = path.clone();
            next_path.push(next.clone());
            debug!(
                claim = %next,
                depth = child_depth,
                edge = edge.edge_type.as_str(),
                "Defeat reaches claim"
            );

            affected.push(AffectedClaim {
                claim_id: next.clone(),
                depth: child_depth,
                dependency_type: edge.edge_type,
                dependency_path: next_path.clone(),
                suggested_action: action,
            });
            queue.push_back((next, next_path, child_depth + 1));
        }
    }

    Ok(affected)
}

/// Propagate the defeat of `claim_id` into the graph
///
/// Every affected claim that exists and is neither `defeated` nor already
/// `stale` is upserted as `stale`. With `materialize_defeaters` set, each
/// newly staled claim also gets an auto-resolvable `new_info` defeater:
/// partial for claims to mark stale, a warning otherwise, with the reduction
/// decaying with depth.
pub fn apply_transitive_defeat<G>(
    graph: &mut G,
    claim_id: &ClaimId,
    config: &PropagationConfig,
) -> Result<TransitiveDefeatReport, DefeatError>
where
    G: ClaimGraph,
    G::Error: std::fmt::Display,
{
    config.validate()?;
    let affected = propagate_defeat(graph, claim_id, config.max_depth)?;

    let mut staled_count = 0;
    let mut defeaters_created = Vec::new();

    for entry in &affected {
        let Some(claim) = graph.get_claim(&entry.claim_id).map_err(DefeatError::store)? else {
            debug!(claim = %entry.claim_id, "Affected claim not in graph, skipping");
            continue;
        };
        if matches!(claim.status, ClaimStatus::Defeated | ClaimStatus::Stale) {
            continue;
        }

        graph
            .upsert_claim(claim.with_status(ClaimStatus::Stale))
            .map_err(DefeatError::store)?;
        staled_count += 1;

        if config.materialize_defeaters {
            let severity = match entry.suggested_action {
                SuggestedAction::MarkStale => DefeaterSeverity::Partial,
                SuggestedAction::Investigate | SuggestedAction::Revalidate => DefeaterSeverity::Warning,
            };
            let defeater = ExtendedDefeater::new(
                DefeaterType::NewInfo,
                severity,
                format!(
                    "Transitive defeat from {} via {} at depth {}",
                    claim_id,
                    entry.dependency_type.as_str(),
                    entry.depth
                ),
                vec![entry.claim_id.clone()],
                config.reduction_at(entry.depth),
            )?
            .auto_resolvable(true);

            defeaters_created.push(defeater.id.clone());
            graph.add_defeater(defeater).map_err(DefeatError::store)?;
        }
    }

    info!(
        root = %claim_id,
        affected = affected.len(),
        staled = staled_count,
        defeaters = defeaters_created.len(),
        "Transitive defeat applied"
    );

    Ok(TransitiveDefeatReport {
        root: claim_id.clone(),
        affected,
        staled_count,
        defeaters_created,
    })
}

/// Node/edge view of the claims around `claim_id`
///
/// `Downstream` follows the same edges as [`propagate_defeat`]; `Upstream`
/// follows them backwards to what the claim relies on. Nodes deeper than
/// `max_depth` are not included.
pub fn get_dependency_graph<G>(
    graph: &G,
    claim_id: &ClaimId,
    direction: Direction,
    max_depth: usize,
) -> Result<DependencyGraph, DefeatError>
where
    G: ClaimGraph,
    G::Error: std::fmt::Display,
{
    let status_of = |id: &ClaimId| -> Result<Option<ClaimStatus>, DefeatError> {
        Ok(graph.get_claim(id).map_err(DefeatError::store)?.map(|c| c.status))
    };

    let mut nodes = vec![GraphNode {
        claim_id: claim_id.clone(),
        status: status_of(claim_id)?,
        depth: 0,
    }];
    let mut edges: Vec<EvidenceEdge> = Vec::new();
    let mut visited: HashSet<ClaimId> = HashSet::from([claim_id.clone()]);
    let mut queue = VecDeque::from([(claim_id.clone(), 0usize)]);

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        for (next, edge) in neighbors(graph, &current, direction)? {
            let seen = edges.iter().any(|e| {
                e.from_claim_id == edge.from_claim_id
                    && e.to_claim_id == edge.to_claim_id
                    && e.edge_type == edge.edge_type
            });
            if !seen {
                edges.push(edge);
            }

            if visited.insert(next.clone()) {
                nodes.push(GraphNode {
                    status: status_of(&next)?,
                    claim_id: next.clone(),
                    depth: depth + 1,
                });
                queue.push_back((next, depth + 1));
            }
        }
    }

    debug!(
        root = %claim_id,
        nodes = nodes.len(),
        edges = edges.len(),
        "Dependency graph built"
    );

    Ok(DependencyGraph {
        root: claim_id.clone(),
        direction,
        nodes,
        edges,
    })
}
