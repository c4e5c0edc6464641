//! Claims command implementation.

use crate::cli::ClaimsArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use credence_domain::ClaimStatus;
use credence_store::ClaimQuery;

/// Execute the claims command.
pub fn execute_claims(args: ClaimsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let query = build_query(args)?;
    let store = super::open_store(config)?;
    let claims = store.query_claims(&query)?;

    println!("{}", formatter.format_claims(&claims)?);

    Ok(())
}

fn build_query(args: ClaimsArgs) -> Result<ClaimQuery> {
    let status = match args.status {
        Some(s) => Some(s.parse::<ClaimStatus>().map_err(CliError::InvalidInput)?),
        None => None,
    };

    Ok(ClaimQuery {
        namespace: args.namespace,
        status,
        limit: args.limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_construction() {
        let query = build_query(ClaimsArgs {
            namespace: Some("repo".to_string()),
            status: Some("stale".to_string()),
            limit: Some(5),
        })
        .unwrap();

        assert_eq!(query.namespace.as_deref(), Some("repo"));
        assert_eq!(query.status, Some(ClaimStatus::Stale));
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = build_query(ClaimsArgs {
            namespace: None,
            status: Some("zombie".to_string()),
            limit: None,
        });
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
