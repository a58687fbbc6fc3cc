//! Database Backend Abstraction
//!
//! The connection is an external collaborator: the core hands it finished
//! SQL text plus a positional parameter list and maps whatever comes back.
//! No sockets, pooling, or dialect handling live on this side of the trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::OrmResult;

/// A single result row: column name to value
pub type Row = HashMap<String, Value>;

/// Everything a driver can report about one executed statement
#[derive(Debug, Clone, Default)]
pub struct ExecuteResult {
    /// Result rows, empty for statements that return none
    pub rows: Vec<Row>,
    /// Number of rows the statement affected
    pub rows_affected: u64,
    /// Generated key for inserts, when the driver reports one
    pub last_insert_id: Option<Value>,
}

/// Abstract database connection trait
///
/// Transaction support is optional. A connection that reports
/// `supports_transactions()` gets multi-statement association updates
/// wrapped in `begin`/`commit`; the defaults make the boundary a no-op.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement and return its full result
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecuteResult>;

    /// Whether this connection exposes a transaction boundary
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Open a transaction
    async fn begin(&self) -> OrmResult<()> {
        Ok(())
    }

    /// Commit the open transaction
    async fn commit(&self) -> OrmResult<()> {
        Ok(())
    }

    /// Roll back the open transaction
    async fn rollback(&self) -> OrmResult<()> {
        Ok(())
    }
}
