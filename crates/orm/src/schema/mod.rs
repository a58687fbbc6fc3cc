//! Schema System - model definitions, field metadata, and the shared registry

pub mod field;
pub mod model;
pub mod registry;
pub mod validate;

pub use field::{FieldDefinition, FieldRule, FieldType};
pub use model::{ModelDefinition, ModelOptions, ModelRule, CREATED_AT, DELETED_AT, UPDATED_AT};
pub use registry::SchemaRegistry;
pub use validate::validate;
