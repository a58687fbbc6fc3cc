//! Model Handles - the per-model operation surface
//!
//! A handle is a cheap clone pairing a model name with the database it
//! was defined on. All CRUD and association declarations go through it;
//! the definition itself stays in the shared registry.

use std::collections::HashMap;

use serde_json::Value;

use super::instance::{current_timestamp, timestamp_value, DestroyOptions, Instance};
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::query::{Attribute, Filter, Projection, QueryBuilder, QuerySpec};
use crate::relationships::{declare, AssociationKind};
use crate::schema::model::{ModelDefinition, CREATED_AT, DELETED_AT, UPDATED_AT};

/// Handle to a defined model
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    db: Database,
}

impl Model {
    pub(crate) fn new(name: impl Into<String>, db: Database) -> Self {
        Self {
            name: name.into(),
            db,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// A copy of this model's definition
    pub fn definition(&self) -> OrmResult<ModelDefinition> {
        self.db.registry().definition(&self.name)
    }

    /// Build an unsaved instance from an object payload
    ///
    /// Unknown fields fail; server-assigned timestamp columns present in
    /// the payload are dropped without error.
    pub fn build(&self, values: Value) -> OrmResult<Instance> {
        let def = self.definition()?;
        let map = match values {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(OrmError::Query(format!(
                    "values for model '{}' must be an object",
                    self.name
                )))
            }
        };

        let mut out = HashMap::new();
        for (key, value) in map {
            if def.field(&key).is_none() {
                return Err(OrmError::Query(format!(
                    "unknown field '{}' on model '{}'",
                    key, self.name
                )));
            }
            if def.timestamps && (key == CREATED_AT || key == UPDATED_AT) {
                continue;
            }
            if def.paranoid && key == DELETED_AT {
                continue;
            }
            out.insert(key, value);
        }
        Ok(Instance::new(self.clone(), out))
    }

    /// Validate and insert a new row
    pub async fn create(&self, values: Value) -> OrmResult<Instance> {
        let mut instance = self.build(values)?;
        instance.save().await?;
        Ok(instance)
    }

    /// Fetch every row matching the specification
    pub async fn find_all(&self, spec: QuerySpec) -> OrmResult<Vec<Instance>> {
        let def = self.definition()?;
        let (sql, params) = self.build_select(&def, &spec)?;
        let result = self.db.execute(&sql, &params).await?;
        Ok(result
            .rows
            .into_iter()
            .map(|row| Instance::from_row(self.clone(), row))
            .collect())
    }

    /// Fetch the first matching row, if any
    pub async fn find_one(&self, spec: QuerySpec) -> OrmResult<Option<Instance>> {
        let spec = QuerySpec {
            limit: Some(1),
            ..spec
        };
        Ok(self.find_all(spec).await?.into_iter().next())
    }

    /// Fetch the row with the given primary key, failing when absent
    pub async fn find_by_pk(&self, key: impl Into<Value>) -> OrmResult<Instance> {
        let def = self.definition()?;
        let key_column = def.primary_key()?.to_string();
        self.find_one(QuerySpec::new().filter(Filter::eq(key_column, key.into())))
            .await?
            .ok_or(OrmError::NotFound(def.table_name))
    }

    /// Count rows matching the specification
    pub async fn count(&self, spec: QuerySpec) -> OrmResult<i64> {
        let def = self.definition()?;
        let spec = QuerySpec {
            attributes: Some(Projection::Columns(vec![Attribute::function(
                "COUNT", "*", "count",
            )])),
            ..spec
        };
        let (sql, params) = self.build_select(&def, &spec)?;
        let result = self.db.execute(&sql, &params).await?;
        Ok(result
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(value_as_i64)
            .unwrap_or(0))
    }

    /// Destroy every row matching the filter; `None` matches all rows
    ///
    /// Paranoid models get their deletion timestamp set instead, unless
    /// `force` bypasses the soft path.
    pub async fn destroy_where(
        &self,
        filter: Option<Filter>,
        options: DestroyOptions,
    ) -> OrmResult<u64> {
        let def = self.definition()?;

        let (sql, params) = if def.paranoid && !options.force {
            let mut builder = QueryBuilder::update(&def.table_name)
                .set(DELETED_AT, timestamp_value(current_timestamp()));
            if let Some(filter) = filter {
                builder = builder.filter(filter);
            }
            builder
                .filter(Filter::is_null(DELETED_AT))
                .to_sql_with_params()?
        } else {
            let mut builder = QueryBuilder::delete(&def.table_name);
            if let Some(filter) = filter {
                builder = builder.filter(filter);
            }
            builder.to_sql_with_params()?
        };

        let result = self.db.execute(&sql, &params).await?;
        Ok(result.rows_affected)
    }

    /// Declare: this model holds a `<other>Id` column pointing at `other`
    pub fn belongs_to(&self, other: &Model) -> OrmResult<()> {
        declare(
            self.db.registry(),
            AssociationKind::BelongsTo,
            &self.name,
            other.name(),
            None,
        )
        .map(|_| ())
    }

    /// Declare: `other` holds a `<self>Id` column, one row per owner
    pub fn has_one(&self, other: &Model) -> OrmResult<()> {
        declare(
            self.db.registry(),
            AssociationKind::HasOne,
            &self.name,
            other.name(),
            None,
        )
        .map(|_| ())
    }

    /// Declare: `other` holds a `<self>Id` column, many rows per owner
    pub fn has_many(&self, other: &Model) -> OrmResult<()> {
        declare(
            self.db.registry(),
            AssociationKind::HasMany,
            &self.name,
            other.name(),
            None,
        )
        .map(|_| ())
    }

    /// Declare a many-to-many edge through a join model
    pub fn belongs_to_many(&self, other: &Model, through: &str) -> OrmResult<()> {
        declare(
            self.db.registry(),
            AssociationKind::BelongsToMany,
            &self.name,
            other.name(),
            Some(through),
        )
        .map(|_| ())
    }

    fn build_select(
        &self,
        def: &ModelDefinition,
        spec: &QuerySpec,
    ) -> OrmResult<(String, Vec<Value>)> {
        let columns = match &spec.attributes {
            None => default_columns(def),
            Some(Projection::Columns(list)) => list.clone(),
            Some(Projection::Include(list)) => {
                let mut all = default_columns(def);
                all.extend(list.iter().cloned());
                all
            }
        };

        let mut builder = QueryBuilder::select(&def.table_name).columns(columns);
        if let Some(filter) = &spec.filter {
            builder = builder.filter(filter.clone());
        }
        if def.paranoid && !spec.include_deleted {
            builder = builder.filter(Filter::is_null(DELETED_AT));
        }
        if !spec.group.is_empty() {
            builder = builder.group_by(spec.group.clone());
        }
        for (column, direction) in &spec.order {
            builder = builder.order_by(column, *direction);
        }
        if let Some(limit) = spec.limit {
            builder = builder.limit(limit);
        }
        if let Some(offset) = spec.offset {
            builder = builder.offset(offset);
        }
        builder.to_sql_with_params()
    }
}

fn default_columns(def: &ModelDefinition) -> Vec<Attribute> {
    def.column_names().into_iter().map(Attribute::Column).collect()
}

/// Drivers report counts as numbers or strings depending on the dialect
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
