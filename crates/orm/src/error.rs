//! Error types for the ORM core
//!
//! One enum covers the whole taxonomy: schema problems are fatal and
//! raised at define time, validation problems are recoverable and always
//! precede any statement reaching the connection, database problems are
//! surfaced verbatim from the driver and never retried here.

/// Result type alias for ORM operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error type for ORM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrmError {
    /// Bad model definition, raised at define time
    #[error("Schema error: {0}")]
    Schema(String),

    /// Bad instance data, raised before any statement is sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Execution failure reported by the connection, including missing tables
    #[error("Database error: {0}")]
    Database(String),

    /// A query expecting exactly one row found zero
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Invalid query construction (bad projection, group mismatch, unknown field)
    #[error("Query error: {0}")]
    Query(String),

    /// Undeclared or misconfigured association
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Operation requires a primary key value the instance does not carry
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Value conversion failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}
