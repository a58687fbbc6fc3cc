//! Execution Façade - statement dispatch over the external connection
//!
//! `Database` owns the connection trait object and the schema registry;
//! every statement the core produces funnels through it. Driver failures
//! are logged and propagated untouched so the caller decides on retries.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::backends::{Connection, ExecuteResult, Row};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::query::QueryType;
use crate::schema::{FieldDefinition, ModelOptions, SchemaRegistry};

/// Result of a raw statement, shaped by its declared type
///
/// The declared-type shapes are authoritative; `Raw` is the legacy pair
/// returned when no type is declared.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// Declared SELECT: plain row mappings, no metadata
    Select(Vec<Row>),
    /// Declared INSERT: generated key (when the driver reports one) plus
    /// affected count
    Insert {
        last_insert_id: Option<Value>,
        rows_affected: u64,
    },
    /// Declared UPDATE/DELETE without RETURNING: the driver yields no row
    /// data on either position
    Mutation { rows: Vec<Row>, returning: Vec<Row> },
    /// No declared type: rows plus affected count
    Raw { rows: Vec<Row>, rows_affected: u64 },
}

struct DatabaseInner {
    connection: Arc<dyn Connection>,
    registry: SchemaRegistry,
}

/// Entry point pairing an external connection with a schema registry
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

impl Database {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                connection,
                registry: SchemaRegistry::new(),
            }),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    /// Define a model and return its handle
    pub fn define(
        &self,
        name: &str,
        fields: Vec<FieldDefinition>,
        options: ModelOptions,
    ) -> OrmResult<Model> {
        self.inner.registry.define(name, fields, options)?;
        tracing::debug!(model = name, "model defined");
        Ok(Model::new(name, self.clone()))
    }

    /// Handle to an already defined model
    pub fn model(&self, name: &str) -> OrmResult<Model> {
        if !self.inner.registry.contains(name) {
            return Err(OrmError::Schema(format!("model '{}' is not defined", name)));
        }
        Ok(Model::new(name, self.clone()))
    }

    pub(crate) async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecuteResult> {
        tracing::debug!(sql = %sql, params = params.len(), "executing statement");
        match self.inner.connection.execute(sql, params).await {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::error!(sql = %sql, error = %err, "statement failed");
                Err(err)
            }
        }
    }

    pub(crate) fn supports_transactions(&self) -> bool {
        self.inner.connection.supports_transactions()
    }

    /// Run a statement sequence, inside a transaction boundary when the
    /// connection has one and more than one statement is involved
    pub(crate) async fn run_batch(&self, statements: Vec<(String, Vec<Value>)>) -> OrmResult<()> {
        let transactional = self.supports_transactions() && statements.len() > 1;
        if transactional {
            self.inner.connection.begin().await?;
        }
        for (sql, params) in &statements {
            if let Err(err) = self.execute(sql, params).await {
                if transactional {
                    let _ = self.inner.connection.rollback().await;
                }
                return Err(err);
            }
        }
        if transactional {
            self.inner.connection.commit().await?;
        }
        Ok(())
    }

    /// Raw SQL escape hatch
    ///
    /// The result shape follows the declared statement type; with none
    /// declared, the legacy `(rows, affected)` pair comes back.
    pub async fn query_raw(
        &self,
        sql: &str,
        params: &[Value],
        kind: Option<QueryType>,
    ) -> OrmResult<RawResult> {
        let result = self.execute(sql, params).await?;
        Ok(match kind {
            Some(QueryType::Select) => RawResult::Select(result.rows),
            Some(QueryType::Insert) => RawResult::Insert {
                last_insert_id: result.last_insert_id,
                rows_affected: result.rows_affected,
            },
            Some(QueryType::Update) | Some(QueryType::Delete) => RawResult::Mutation {
                rows: Vec::new(),
                returning: Vec::new(),
            },
            None => RawResult::Raw {
                rows: result.rows,
                rows_affected: result.rows_affected,
            },
        })
    }
}
