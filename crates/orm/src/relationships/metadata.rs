//! Association Metadata - edge definitions and foreign-key wiring
//!
//! Declaring an association mutates the schema of whichever model holds
//! the foreign key, or materializes a join model for many-to-many edges.
//! Re-declaring an edge is idempotent on both the column and the
//! registered metadata.

use serde::{Deserialize, Serialize};

use crate::error::{OrmError, OrmResult};
use crate::schema::field::{FieldDefinition, FieldType};
use crate::schema::model::{ModelDefinition, ModelOptions};
use crate::schema::registry::SchemaRegistry;

/// The kind of association between two models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    /// FK on the declaring model, pointing at the target (belongsTo)
    BelongsTo,
    /// FK on the target model, single row (hasOne)
    HasOne,
    /// FK on the target model, many rows (hasMany)
    HasMany,
    /// Join model carries one FK per side (belongsToMany)
    BelongsToMany,
}

impl AssociationKind {
    /// Whether accessors for this kind return collections
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }

    /// Whether this kind links through a join model
    pub fn requires_join_model(self) -> bool {
        matches!(self, Self::BelongsToMany)
    }
}

/// Conventional foreign-key column for a model: `<model>Id`
pub fn foreign_key_column(model: &str) -> String {
    format!("{}Id", model)
}

/// One declared association edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationMetadata {
    pub kind: AssociationKind,
    /// The declaring model
    pub source: String,
    /// The associated model, also the accessor lookup name
    pub target: String,
    /// The linking column: on the source table for belongsTo, on the
    /// target table for hasOne/hasMany, on the join table for
    /// belongsToMany (source side)
    pub foreign_key: String,
    /// Join model name, belongsToMany only
    pub through: Option<String>,
    /// Target-side join column, belongsToMany only
    pub target_key: Option<String>,
}

impl AssociationMetadata {
    pub fn new(
        kind: AssociationKind,
        source: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
            through: None,
            target_key: None,
        }
    }

    pub fn with_through(
        mut self,
        through: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        self.through = Some(through.into());
        self.target_key = Some(target_key.into());
        self
    }

    /// Validate the metadata for consistency
    pub fn validate(&self) -> OrmResult<()> {
        if self.kind.requires_join_model() {
            if self.through.is_none() || self.target_key.is_none() {
                return Err(OrmError::Relationship(format!(
                    "association '{}' -> '{}' requires a through model and a target key",
                    self.source, self.target
                )));
            }
        } else if self.through.is_some() {
            return Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} does not take a through model",
                self.source, self.target, self.kind
            )));
        }
        if self.foreign_key.is_empty() {
            return Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' has no foreign key column",
                self.source, self.target
            )));
        }
        Ok(())
    }
}

/// Declare an association, wiring foreign-key columns into the registry
///
/// belongsTo adds `<target>Id` to the source model; hasOne/hasMany add
/// `<source>Id` to the target model; belongsToMany ensures the through
/// model exists (defining it when absent) and adds both side columns to
/// it, touching neither side's own table.
pub fn declare(
    registry: &SchemaRegistry,
    kind: AssociationKind,
    source: &str,
    target: &str,
    through: Option<&str>,
) -> OrmResult<AssociationMetadata> {
    let source_def = registry.definition(source)?;
    let target_def = registry.definition(target)?;

    let metadata = match kind {
        AssociationKind::BelongsTo => {
            let column = foreign_key_column(target);
            registry.add_field(
                source,
                FieldDefinition::new(&column, primary_key_type(&target_def)?),
            )?;
            AssociationMetadata::new(kind, source, target, column)
        }
        AssociationKind::HasOne | AssociationKind::HasMany => {
            let column = foreign_key_column(source);
            registry.add_field(
                target,
                FieldDefinition::new(&column, primary_key_type(&source_def)?),
            )?;
            AssociationMetadata::new(kind, source, target, column)
        }
        AssociationKind::BelongsToMany => {
            let through = through.ok_or_else(|| {
                OrmError::Relationship(format!(
                    "belongsToMany between '{}' and '{}' requires a through model",
                    source, target
                ))
            })?;
            if !registry.contains(through) {
                registry.define(through, Vec::new(), ModelOptions::new())?;
            }
            let source_column = foreign_key_column(source);
            let target_column = foreign_key_column(target);
            registry.add_field(
                through,
                FieldDefinition::new(&source_column, primary_key_type(&source_def)?),
            )?;
            registry.add_field(
                through,
                FieldDefinition::new(&target_column, primary_key_type(&target_def)?),
            )?;
            AssociationMetadata::new(kind, source, target, source_column)
                .with_through(through, target_column)
        }
    };

    metadata.validate()?;
    registry.register_association(metadata.clone());
    Ok(metadata)
}

/// Foreign keys copy the type of the key they point at
fn primary_key_type(def: &ModelDefinition) -> OrmResult<FieldType> {
    let key = def.primary_key().map_err(|_| {
        OrmError::Relationship(format!(
            "model '{}' needs a single primary key to participate in associations",
            def.name
        ))
    })?;
    Ok(def
        .field(key)
        .map(|field| field.field_type)
        .unwrap_or(FieldType::BigInt))
}
