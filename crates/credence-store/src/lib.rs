//! Credence Storage Layer
//!
//! Implements the [`ClaimGraph`] trait on SQLite.
//!
//! # Architecture
//!
//! - `claims`: one row per claim, confidence stored as JSON
//! - `edges`: evidence edges keyed by (source, target, type)
//! - `defeaters` + `defeater_claims`: defeaters as JSON, indexed by affected claim
//!
//! Confidence values and defeaters are stored verbatim in their serialized
//! form, so what goes in comes back out field for field.
//!
//! # Examples
//!
//! ```no_run
//! use credence_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

use credence_domain::{
    Claim, ClaimGraph, ClaimId, ClaimStatus, ConfidenceValue, EdgeType, EvidenceEdge,
    ExtendedDefeater,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Filter for [`SqliteStore::query_claims`]
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    /// Filter by namespace prefix
    pub namespace: Option<String>,

    /// Filter by status
    pub status: Option<ClaimStatus>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// SQLite-based implementation of [`ClaimGraph`]
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance; that is also what gives at-most-one writer per claim.
pub struct SqliteStore {
    conn: Connection,
}

type ClaimRow = (String, String, String, String, String, i64);
type EdgeRow = (String, String, String, f64, i64);

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use credence_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("credence.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn row_to_claim(row: ClaimRow) -> Result<Claim, StoreError> {
        let (id, namespace, proposition, status, confidence, created_at) = row;
        let status = ClaimStatus::parse(&status)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown claim status: {}", status)))?;
        let confidence: ConfidenceValue = serde_json::from_str(&confidence)?;

        Ok(Claim {
            id: ClaimId::from(id),
            namespace,
            proposition,
            status,
            confidence,
            created_at: created_at as u64,
        })
    }

    fn row_to_edge(row: EdgeRow) -> Result<EvidenceEdge, StoreError> {
        let (from, to, edge_type, strength, created_at) = row;
        let edge_type = EdgeType::parse(&edge_type)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown edge type: {}", edge_type)))?;

        Ok(EvidenceEdge {
            from_claim_id: ClaimId::from(from),
            to_claim_id: ClaimId::from(to),
            edge_type,
            strength,
            created_at: created_at as u64,
        })
    }

    fn edges_where(&self, column: &str, id: &ClaimId) -> Result<Vec<EvidenceEdge>, StoreError> {
        let sql = format!(
            "SELECT from_claim_id, to_claim_id, edge_type, strength, created_at
             FROM edges WHERE {} = ?1
             ORDER BY created_at, from_claim_id, to_claim_id",
            column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<Result<Vec<EdgeRow>, _>>()?;

        rows.into_iter().map(Self::row_to_edge).collect()
    }

    /// Query claims matching criteria, oldest first
    pub fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError> {
        let mut sql = String::from(
            "SELECT id, namespace, proposition, status, confidence, created_at
             FROM claims WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(namespace) = &query.namespace {
            sql.push_str(" AND namespace LIKE ?");
            params.push(Box::new(format!("{}%", namespace)));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        sql.push_str(" ORDER BY created_at, id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(&param_refs[..], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?
            .collect::<Result<Vec<ClaimRow>, _>>()?;

        rows.into_iter().map(Self::row_to_claim).collect()
    }
}

impl ClaimGraph for SqliteStore {
    type Error = StoreError;

    fn get_claim(&self, id: &ClaimId) -> Result<Option<Claim>, Self::Error> {
        let row: Option<ClaimRow> = self
            .conn
            .query_row(
                "SELECT id, namespace, proposition, status, confidence, created_at
                 FROM claims WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        row.map(Self::row_to_claim).transpose()
    }

    fn upsert_claim(&mut self, claim: Claim) -> Result<(), Self::Error> {
        let confidence = serde_json::to_string(&claim.confidence)?;

        self.conn.execute(
            "INSERT INTO claims (id, namespace, proposition, status, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
             namespace = excluded.namespace, proposition = excluded.proposition,
             status = excluded.status, confidence = excluded.confidence,
             created_at = excluded.created_at",
            params![
                claim.id.as_str(),
                &claim.namespace,
                &claim.proposition,
                claim.status.as_str(),
                &confidence,
                claim.created_at as i64,
            ],
        )?;

        Ok(())
    }

    fn upsert_claims(&mut self, claims: Vec<Claim>) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;
        for claim in claims {
            let confidence = serde_json::to_string(&claim.confidence)?;
            tx.execute(
                "INSERT INTO claims (id, namespace, proposition, status, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                 namespace = excluded.namespace, proposition = excluded.proposition,
                 status = excluded.status, confidence = excluded.confidence,
                 created_at = excluded.created_at",
                params![
                    claim.id.as_str(),
                    &claim.namespace,
                    &claim.proposition,
                    claim.status.as_str(),
                    &confidence,
                    claim.created_at as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_edges_from(&self, id: &ClaimId) -> Result<Vec<EvidenceEdge>, Self::Error> {
        self.edges_where("from_claim_id", id)
    }

    fn get_edges_to(&self, id: &ClaimId) -> Result<Vec<EvidenceEdge>, Self::Error> {
        self.edges_where("to_claim_id", id)
    }

    fn upsert_edge(&mut self, edge: EvidenceEdge) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO edges (from_claim_id, to_claim_id, edge_type, strength, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(from_claim_id, to_claim_id, edge_type) DO UPDATE SET
             strength = excluded.strength, created_at = excluded.created_at",
            params![
                edge.from_claim_id.as_str(),
                edge.to_claim_id.as_str(),
                edge.edge_type.as_str(),
                edge.strength,
                edge.created_at as i64,
            ],
        )?;

        Ok(())
    }

    fn get_defeaters_for_claim(&self, id: &ClaimId) -> Result<Vec<ExtendedDefeater>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT d.body FROM defeaters d
             JOIN defeater_claims dc ON dc.defeater_id = d.id
             WHERE dc.claim_id = ?1
             ORDER BY d.id",
        )?;
        let bodies = stmt
            .query_map(params![id.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    fn add_defeater(&mut self, defeater: ExtendedDefeater) -> Result<(), Self::Error> {
        let body = serde_json::to_string(&defeater)?;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO defeaters (id, body) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
            params![defeater.id.as_str(), &body],
        )?;
        tx.execute(
            "DELETE FROM defeater_claims WHERE defeater_id = ?1",
            params![defeater.id.as_str()],
        )?;
        for claim_id in &defeater.affected_claim_ids {
            tx.execute(
                "INSERT OR IGNORE INTO defeater_claims (defeater_id, claim_id) VALUES (?1, ?2)",
                params![defeater.id.as_str(), claim_id.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}
