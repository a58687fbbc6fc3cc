//! Schema Registry - shared storage for model and association metadata
//!
//! The registry is an explicitly passed context object, never module
//! state; independent registries do not interfere. It is read-mostly
//! after the definition phase.

use std::sync::Arc;

use dashmap::DashMap;

use super::field::FieldDefinition;
use super::model::{ModelDefinition, ModelOptions};
use crate::error::{OrmError, OrmResult};
use crate::relationships::AssociationMetadata;

/// Thread-safe registry of model definitions and association edges
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Model name -> validated definition
    models: Arc<DashMap<String, ModelDefinition>>,
    /// Source model name -> associations declared on it
    associations: Arc<DashMap<String, Vec<AssociationMetadata>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a model definition
    pub fn define(
        &self,
        name: &str,
        fields: Vec<FieldDefinition>,
        options: ModelOptions,
    ) -> OrmResult<()> {
        if self.models.contains_key(name) {
            return Err(OrmError::Schema(format!(
                "model '{}' is already defined",
                name
            )));
        }

        let definition = ModelDefinition::new(name, fields, options)?;
        self.models.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Fetch a copy of a model definition
    pub fn definition(&self, name: &str) -> OrmResult<ModelDefinition> {
        self.models
            .get(name)
            .map(|entry| entry.clone())
            .ok_or_else(|| OrmError::Schema(format!("model '{}' is not defined", name)))
    }

    /// Add a column to an already defined model; returns false when the
    /// column already exists
    pub(crate) fn add_field(&self, model: &str, field: FieldDefinition) -> OrmResult<bool> {
        let mut entry = self
            .models
            .get_mut(model)
            .ok_or_else(|| OrmError::Schema(format!("model '{}' is not defined", model)))?;
        Ok(entry.add_field_if_absent(field))
    }

    /// Record an association declared on its source model
    ///
    /// Re-declaring the same edge (same target and kind) is a no-op.
    pub(crate) fn register_association(&self, metadata: AssociationMetadata) {
        let mut entry = self
            .associations
            .entry(metadata.source.clone())
            .or_default();
        let exists = entry
            .iter()
            .any(|a| a.target == metadata.target && a.kind == metadata.kind);
        if !exists {
            entry.push(metadata);
        }
    }

    /// Associations declared on a model, lookup by target name
    pub fn association(&self, source: &str, target: &str) -> OrmResult<Vec<AssociationMetadata>> {
        let matches: Vec<AssociationMetadata> = self
            .associations
            .get(source)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|a| a.target == target)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if matches.is_empty() {
            return Err(OrmError::Relationship(format!(
                "no association to '{}' declared on model '{}'",
                target, source
            )));
        }
        Ok(matches)
    }

    /// Every association declared on a model
    pub fn associations_of(&self, source: &str) -> Vec<AssociationMetadata> {
        self.associations
            .get(source)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}
