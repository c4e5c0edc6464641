//! Credence Defeat
//!
//! Defeasible reasoning over confidence values: which defeaters are in force,
//! what they do to a confidence value, and how the defeat of one claim spreads
//! through the claims that rely on it.
//!
//! # Overview
//!
//! The crate has three layers:
//! - **Meta-defeat resolution**: a defeater can itself be defeated, which
//!   reinstates whatever it defeated. [`is_defeater_active`] resolves this
//!   relation, cycles included, without recursion.
//! - **Confidence impact**: [`apply_defeater_to_confidence`] reduces a
//!   confidence value according to the defeater's severity and records the
//!   application so it can be found ([`find_defeaters_in_confidence`]) and
//!   undone ([`remove_defeater_from_confidence`]) later.
//! - **Transitive propagation**: [`propagate_defeat`] walks the claim graph
//!   breadth first; [`apply_transitive_defeat`] marks the claims it reaches
//!   as stale.
//!
//! ## Edge semantics
//!
//! | Edge | Direction followed | Suggested action |
//! |------|--------------------|------------------|
//! | `depends_on` | into the defeated claim | mark stale |
//! | `assumes` | into the defeated claim | investigate |
//! | `supports` | out of the defeated claim | revalidate |
//!
//! # Usage
//!
//! ```
//! use credence_defeat::{apply_transitive_defeat, PropagationConfig};
//! use credence_domain::{AbsentReason, Claim, ClaimGraph, ClaimId, ClaimStatus, ConfidenceValue, EdgeType, EvidenceEdge};
//! use credence_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new(":memory:")?;
//! let confidence = ConfidenceValue::absent(AbsentReason::Uncalibrated);
//! store.upsert_claim(Claim::new("a".into(), "repo", "parser is total", confidence.clone(), 0))?;
//! store.upsert_claim(Claim::new("b".into(), "repo", "lexer is total", confidence, 0))?;
//! store.upsert_edge(EvidenceEdge::new("b".into(), "a".into(), EdgeType::DependsOn, 1.0, 0))?;
//!
//! let report = apply_transitive_defeat(&mut store, &ClaimId::from("a"), &PropagationConfig::default())?;
//! assert_eq!(report.staled_count, 1);
//! assert_eq!(store.get_claim(&ClaimId::from("b"))?.unwrap().status, ClaimStatus::Stale);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Propagation can be configured via TOML:
//!
//! ```toml
//! [propagation]
//! max_depth = 10
//! materialize_defeaters = true
//! base_reduction = 0.3
//! depth_decay = 0.5
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod impact;
mod meta;
mod propagation;

pub use config::PropagationConfig;
pub use error::DefeatError;
pub use impact::{
    apply_active_defeaters, apply_defeater_to_confidence, apply_defeaters_to_confidence,
    find_defeaters_in_confidence, remove_defeater_from_confidence, DefeatOutcome,
    DefeaterApplication,
};
pub use meta::{
    activate_defeater, add_meta_defeater, get_effectively_active_defeaters, ignore_defeater,
    is_defeater_active, remove_meta_defeater, resolve_defeater,
};
pub use propagation::{
    apply_transitive_defeat, get_dependency_graph, propagate_defeat, AffectedClaim,
    DependencyGraph, Direction, GraphNode, SuggestedAction, TransitiveDefeatReport,
};
