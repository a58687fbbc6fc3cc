//! Instances - one bound row of a model
//!
//! An instance tracks its values, which of them changed since the last
//! round trip, and whether a backing row exists. Saving an unpersisted
//! instance inserts; saving a persisted one updates only dirty columns.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use super::handle::Model;
use crate::backends::Row;
use crate::error::{OrmError, OrmResult};
use crate::query::{Filter, QueryBuilder};
use crate::relationships::{AssociationKind, OneToOneAccessor, ToManyAccessor};
use crate::schema::model::{CREATED_AT, DELETED_AT, UPDATED_AT};
use crate::schema::validate::validate;

/// Options for `destroy`
#[derive(Debug, Clone, Copy, Default)]
pub struct DestroyOptions {
    /// Remove the row even on paranoid models
    pub force: bool,
}

impl DestroyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// A single row bound to a model definition
#[derive(Debug, Clone)]
pub struct Instance {
    model: Model,
    values: HashMap<String, Value>,
    dirty: HashSet<String>,
    persisted: bool,
}

impl Instance {
    /// A not-yet-persisted instance; every value counts as dirty
    pub(crate) fn new(model: Model, values: HashMap<String, Value>) -> Self {
        let dirty = values.keys().cloned().collect();
        Self {
            model,
            values,
            dirty,
            persisted: false,
        }
    }

    /// Hydrate from a result row; only returned columns are populated
    pub(crate) fn from_row(model: Model, row: Row) -> Self {
        Self {
            model,
            values: row,
            dirty: HashSet::new(),
            persisted: true,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Read a field value; `None` when the field was never set or not
    /// part of the query's projection
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Write a field value, marking it dirty
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<()> {
        let def = self.model.definition()?;
        if !def.has_field(field) {
            return Err(OrmError::Query(format!(
                "unknown field '{}' on model '{}'",
                field, def.name
            )));
        }
        self.values.insert(field.to_string(), value.into());
        self.dirty.insert(field.to_string());
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Whether a paranoid model's row carries a deletion timestamp
    pub fn is_soft_deleted(&self) -> bool {
        self.get(DELETED_AT).map_or(false, |v| !v.is_null())
    }

    /// The primary key value, when the definition has a single key and
    /// this instance carries it
    pub fn primary_key_value(&self) -> Option<Value> {
        let def = self.model.definition().ok()?;
        let key = def.primary_key().ok()?;
        self.values.get(key).filter(|v| !v.is_null()).cloned()
    }

    /// Persist pending values
    ///
    /// Validation runs to completion before any statement is sent. On
    /// insert, `createdAt` and `updatedAt` receive the same timestamp; on
    /// update, `updatedAt` moves strictly past its previous value.
    pub async fn save(&mut self) -> OrmResult<()> {
        let def = self.model.definition()?;

        if self.persisted && self.dirty.is_empty() {
            return Ok(());
        }

        validate(&def, &self.values)?;

        if !self.persisted {
            if def.timestamps {
                let now = timestamp_value(current_timestamp());
                self.values.insert(CREATED_AT.to_string(), now.clone());
                self.values.insert(UPDATED_AT.to_string(), now);
            }

            let mut builder = QueryBuilder::insert(&def.table_name);
            for field in &def.fields {
                if let Some(value) = self.values.get(&field.name) {
                    builder = builder.set(&field.name, value.clone());
                }
            }
            let (sql, params) = builder.to_sql_with_params()?;
            let result = self.model.database().execute(&sql, &params).await?;

            // Adopt a driver-generated key when the payload had none.
            if let Some(generated) = result.last_insert_id {
                if let Ok(key) = def.primary_key() {
                    self.values.entry(key.to_string()).or_insert(generated);
                }
            }
            self.persisted = true;
            self.dirty.clear();
            return Ok(());
        }

        if def.timestamps {
            let previous = self.values.get(UPDATED_AT).and_then(parse_timestamp);
            let mut now = current_timestamp();
            if let Some(previous) = previous {
                if now <= previous {
                    now = previous + Duration::microseconds(1);
                }
            }
            self.values
                .insert(UPDATED_AT.to_string(), timestamp_value(now));
            self.dirty.insert(UPDATED_AT.to_string());
        }

        let key = self
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;
        let key_column = def.primary_key()?.to_string();

        let mut builder = QueryBuilder::update(&def.table_name);
        for field in &def.fields {
            if self.dirty.contains(&field.name) {
                let value = self.values.get(&field.name).cloned().unwrap_or(Value::Null);
                builder = builder.set(&field.name, value);
            }
        }
        let (sql, params) = builder
            .filter(Filter::eq(key_column, key))
            .to_sql_with_params()?;
        self.model.database().execute(&sql, &params).await?;
        self.dirty.clear();
        Ok(())
    }

    /// Soft-delete (paranoid models) or remove this row
    ///
    /// `force` bypasses the soft path entirely and always removes the row.
    pub async fn destroy(&mut self, options: DestroyOptions) -> OrmResult<()> {
        let def = self.model.definition()?;
        let key = self
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;
        let key_column = def.primary_key()?.to_string();

        if def.paranoid && !options.force {
            let now = timestamp_value(current_timestamp());
            let (sql, params) = QueryBuilder::update(&def.table_name)
                .set(DELETED_AT, now.clone())
                .filter(Filter::eq(key_column, key))
                .filter(Filter::is_null(DELETED_AT))
                .to_sql_with_params()?;
            self.model.database().execute(&sql, &params).await?;
            self.values.insert(DELETED_AT.to_string(), now);
        } else {
            let (sql, params) = QueryBuilder::delete(&def.table_name)
                .filter(Filter::eq(key_column, key))
                .to_sql_with_params()?;
            self.model.database().execute(&sql, &params).await?;
            self.persisted = false;
        }
        Ok(())
    }

    /// The single-row accessor for a declared belongsTo/hasOne association
    pub fn one_to_one(&self, target: &str) -> OrmResult<OneToOneAccessor> {
        let meta = self.association_of_kind(target, false)?;
        let key = self
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;
        Ok(OneToOneAccessor::new(
            self.model.database().clone(),
            meta,
            key,
        ))
    }

    /// The collection accessor for a declared hasMany/belongsToMany association
    pub fn to_many(&self, target: &str) -> OrmResult<ToManyAccessor> {
        let meta = self.association_of_kind(target, true)?;
        let key = self
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;
        Ok(ToManyAccessor::new(
            self.model.database().clone(),
            meta,
            key,
        ))
    }

    fn association_of_kind(
        &self,
        target: &str,
        collection: bool,
    ) -> OrmResult<crate::relationships::AssociationMetadata> {
        let candidates = self
            .model
            .database()
            .registry()
            .association(self.model.name(), target)?;
        candidates
            .into_iter()
            .find(|meta| meta.kind.is_collection() == collection)
            .ok_or_else(|| {
                OrmError::Relationship(format!(
                    "association to '{}' on model '{}' is {}; use the {} accessor",
                    target,
                    self.model.name(),
                    if collection { "single-row" } else { "a collection" },
                    if collection { "one_to_one" } else { "to_many" },
                ))
            })
    }

    fn association_kind(&self, target: &str) -> Option<AssociationKind> {
        self.model
            .database()
            .registry()
            .association(self.model.name(), target)
            .ok()
            .and_then(|metas| metas.first().map(|m| m.kind))
    }

    /// Whether any association to `target` is declared on this model
    pub fn has_association(&self, target: &str) -> bool {
        self.association_kind(target).is_some()
    }
}

/// Timestamp captured for managed columns
pub(crate) fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Managed timestamps travel as RFC 3339 strings with microsecond precision
pub(crate) fn timestamp_value(timestamp: DateTime<Utc>) -> Value {
    Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
