//! Association System - edge metadata, schema wiring, and typed accessors

pub mod accessors;
pub mod metadata;

pub use accessors::{OneToOneAccessor, ToManyAccessor};
pub use metadata::{declare, foreign_key_column, AssociationKind, AssociationMetadata};
