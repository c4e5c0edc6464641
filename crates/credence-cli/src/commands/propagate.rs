//! Propagate and graph command implementations.

use crate::cli::{GraphArgs, PropagateArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use credence_defeat::{
    apply_transitive_defeat, get_dependency_graph, propagate_defeat, Direction, PropagationConfig,
};
use credence_domain::{ClaimGraph, ClaimId};
use credence_store::SqliteStore;

/// Execute the propagate command.
///
/// Reports the affected claims; with `--apply`, also marks them stale.
pub fn execute_propagate(args: PropagateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut store = super::open_store(config)?;
    let root = existing_claim(&store, &args.claim_id)?;
    let propagation = PropagationConfig {
        max_depth: args.depth.unwrap_or(config.propagation.max_depth),
        ..config.propagation.clone()
    };

    let output = if args.apply {
        let report = apply_transitive_defeat(&mut store, &root, &propagation)?;
        formatter.format_transitive_report(&report)?
    } else {
        let affected = propagate_defeat(&store, &root, propagation.max_depth)?;
        formatter.format_affected(&affected)?
    };

    println!("{}", output);

    Ok(())
}

/// Execute the graph command.
pub fn execute_graph(args: GraphArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = super::open_store(config)?;
    let root = existing_claim(&store, &args.claim_id)?;
    let direction = if args.upstream {
        Direction::Upstream
    } else {
        Direction::Downstream
    };

    let graph = get_dependency_graph(
        &store,
        &root,
        direction,
        args.depth.unwrap_or(config.propagation.max_depth),
    )?;

    println!("{}", formatter.format_graph(&graph)?);

    Ok(())
}

fn existing_claim(store: &SqliteStore, id: &str) -> Result<ClaimId> {
    let id = ClaimId::from(id);
    match store.get_claim(&id)? {
        Some(_) => Ok(id),
        None => Err(CliError::ClaimNotFound(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_domain::{AbsentReason, Claim, ConfidenceValue};

    #[test]
    fn test_existing_claim() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store
            .upsert_claim(Claim::new(
                ClaimId::from("a"),
                "repo",
                "p",
                ConfidenceValue::absent(AbsentReason::Uncalibrated),
                0,
            ))
            .unwrap();

        assert_eq!(existing_claim(&store, "a").unwrap(), ClaimId::from("a"));
        assert!(matches!(existing_claim(&store, "b"), Err(CliError::ClaimNotFound(_))));
    }
}
