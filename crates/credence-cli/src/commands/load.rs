//! Load command implementation.

use crate::cli::LoadArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use credence_domain::{
    AbsentReason, Claim, ClaimGraph, ClaimId, ClaimStatus, ConfidenceValue, EdgeType, EvidenceEdge,
};
use credence_store::SqliteStore;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Execute the load command.
pub fn execute_load(args: LoadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let graph: GraphDefinition = super::read_json(&args.input.file)?;
    if graph.claims.is_empty() && graph.edges.is_empty() {
        return Err(CliError::InvalidInput("No claims or edges provided".to_string()));
    }

    let mut store = super::open_store(config)?;
    let (claims, edges) = load_graph(&mut store, graph, &args.namespace)?;

    println!("{}", formatter.bulk_result("Loaded", claims, "claim"));
    println!("{}", formatter.bulk_result("Loaded", edges, "edge"));

    Ok(())
}

/// Claims and edges to load.
#[derive(Debug, Deserialize)]
struct GraphDefinition {
    #[serde(default)]
    claims: Vec<ClaimDefinition>,
    #[serde(default)]
    edges: Vec<EdgeDefinition>,
}

/// Simplified claim definition for JSON input.
#[derive(Debug, Deserialize)]
struct ClaimDefinition {
    id: String,
    proposition: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    status: Option<ClaimStatus>,
    #[serde(default)]
    confidence: Option<ConfidenceValue>,
}

/// Simplified edge definition for JSON input.
#[derive(Debug, Deserialize)]
struct EdgeDefinition {
    from: String,
    to: String,
    #[serde(rename = "type")]
    edge_type: EdgeType,
    #[serde(default = "default_strength")]
    strength: f64,
}

impl ClaimDefinition {
    fn to_claim(self, default_namespace: &str, created_at: u64) -> Result<Claim> {
        let confidence = self
            .confidence
            .unwrap_or_else(|| ConfidenceValue::absent(AbsentReason::Uncalibrated));
        confidence
            .validate()
            .map_err(|e| CliError::InvalidInput(format!("Claim '{}': {}", self.id, e)))?;

        let claim = Claim::new(
            ClaimId::from(self.id),
            self.namespace.unwrap_or_else(|| default_namespace.to_string()),
            self.proposition,
            confidence,
            created_at,
        );
        Ok(match self.status {
            Some(status) => claim.with_status(status),
            None => claim,
        })
    }
}

impl EdgeDefinition {
    fn to_edge(self, created_at: u64) -> Result<EvidenceEdge> {
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(CliError::InvalidInput(format!(
                "Edge {} -> {}: strength must be between 0.0 and 1.0",
                self.from, self.to
            )));
        }
        Ok(EvidenceEdge::new(
            ClaimId::from(self.from),
            ClaimId::from(self.to),
            self.edge_type,
            self.strength,
            created_at,
        ))
    }
}

/// Upsert every claim and edge; returns how many of each were written.
fn load_graph(store: &mut SqliteStore, graph: GraphDefinition, namespace: &str) -> Result<(usize, usize)> {
    let created_at = now_millis();

    let claims = graph
        .claims
        .into_iter()
        .map(|def| def.to_claim(namespace, created_at))
        .collect::<Result<Vec<_>>>()?;
    let edges = graph
        .edges
        .into_iter()
        .map(|def| def.to_edge(created_at))
        .collect::<Result<Vec<_>>>()?;

    let counts = (claims.len(), edges.len());
    store.upsert_claims(claims)?;
    store.upsert_edges(edges)?;
    Ok(counts)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn default_strength() -> f64 {
    1.0
}
