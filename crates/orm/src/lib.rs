//! # relata-orm: a minimal ORM core
//!
//! Runtime model definition, instance lifecycle with validation and
//! managed timestamps, association-based foreign-key wiring, operator-tree
//! filter compilation, soft-delete semantics, and a raw-SQL escape hatch.
//!
//! The database itself stays outside: callers supply a [`Connection`]
//! implementation and the core hands it finished statements with
//! positional parameters.

pub mod backends;
pub mod database;
pub mod error;
pub mod model;
pub mod query;
pub mod relationships;
pub mod schema;

// Re-export core traits and types
pub use backends::{Connection, ExecuteResult, Row};
pub use database::{Database, RawResult};
pub use error::{OrmError, OrmResult};
pub use model::{DestroyOptions, Instance, Model};
pub use query::{
    Attribute, Filter, Operator, OrderDirection, Projection, QueryBuilder, QuerySpec, QueryType,
};
pub use relationships::{AssociationKind, AssociationMetadata, OneToOneAccessor, ToManyAccessor};
pub use schema::{
    FieldDefinition, FieldRule, FieldType, ModelDefinition, ModelOptions, SchemaRegistry,
};
