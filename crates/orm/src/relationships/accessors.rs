//! Association Accessors - capability objects attached to instances
//!
//! Instead of injecting `getX`/`setX` methods at runtime, each declared
//! association is reachable through a typed accessor obtained from an
//! instance: [`OneToOneAccessor`] for belongsTo/hasOne edges,
//! [`ToManyAccessor`] for hasMany/belongsToMany edges. Asking an instance
//! for an undeclared association fails, which is the statically typed
//! analogue of a missing generated method.

use serde_json::Value;

use super::metadata::{AssociationKind, AssociationMetadata};
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::model::instance::{current_timestamp, timestamp_value, Instance};
use crate::query::{Attribute, Filter, QueryBuilder, QuerySpec};
use crate::schema::model::{ModelDefinition, CREATED_AT, DELETED_AT, UPDATED_AT};

/// Accessor over a single-row association (belongsTo, hasOne)
#[derive(Debug, Clone)]
pub struct OneToOneAccessor {
    db: Database,
    meta: AssociationMetadata,
    owner_key: Value,
}

impl OneToOneAccessor {
    pub(crate) fn new(db: Database, meta: AssociationMetadata, owner_key: Value) -> Self {
        Self {
            db,
            meta,
            owner_key,
        }
    }

    pub fn metadata(&self) -> &AssociationMetadata {
        &self.meta
    }

    /// Fetch the linked row, if any
    pub async fn get(&self) -> OrmResult<Option<Instance>> {
        match self.meta.kind {
            AssociationKind::BelongsTo => {
                // The link lives on the owner's row; read it, then load the target.
                let source_def = self.db.registry().definition(&self.meta.source)?;
                let source_key = source_def.primary_key()?.to_string();
                let (sql, params) = QueryBuilder::select(&source_def.table_name)
                    .columns(vec![Attribute::column(&self.meta.foreign_key)])
                    .filter(Filter::eq(source_key, self.owner_key.clone()))
                    .limit(1)
                    .to_sql_with_params()?;
                let result = self.db.execute(&sql, &params).await?;

                let link = result
                    .rows
                    .into_iter()
                    .next()
                    .and_then(|mut row| row.remove(&self.meta.foreign_key))
                    .filter(|value| !value.is_null());
                match link {
                    None => Ok(None),
                    Some(value) => {
                        let target = self.db.model(&self.meta.target)?;
                        let target_key = target.definition()?.primary_key()?.to_string();
                        target
                            .find_one(QuerySpec::new().filter(Filter::eq(target_key, value)))
                            .await
                    }
                }
            }
            AssociationKind::HasOne => {
                let target = self.db.model(&self.meta.target)?;
                target
                    .find_one(QuerySpec::new().filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    )))
                    .await
            }
            kind => Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} is not single-row",
                self.meta.source, self.meta.target, kind
            ))),
        }
    }

    /// Overwrite the link to point at `target`
    ///
    /// An existing link never makes this fail; for the hasOne direction
    /// the previous holder's column is cleared first.
    pub async fn set(&self, target: &Instance) -> OrmResult<()> {
        let target_key = target
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;

        match self.meta.kind {
            AssociationKind::BelongsTo => {
                let source_def = self.db.registry().definition(&self.meta.source)?;
                let source_key = source_def.primary_key()?.to_string();
                let (sql, params) = QueryBuilder::update(&source_def.table_name)
                    .set(&self.meta.foreign_key, target_key)
                    .filter(Filter::eq(source_key, self.owner_key.clone()))
                    .to_sql_with_params()?;
                self.db.execute(&sql, &params).await?;
                Ok(())
            }
            AssociationKind::HasOne => {
                let target_def = self.db.registry().definition(&self.meta.target)?;
                let target_pk = target_def.primary_key()?.to_string();
                let clear = QueryBuilder::update(&target_def.table_name)
                    .set(&self.meta.foreign_key, Value::Null)
                    .filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    ))
                    .to_sql_with_params()?;
                let link = QueryBuilder::update(&target_def.table_name)
                    .set(&self.meta.foreign_key, self.owner_key.clone())
                    .filter(Filter::eq(target_pk, target_key))
                    .to_sql_with_params()?;
                self.db.run_batch(vec![clear, link]).await
            }
            kind => Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} is not single-row",
                self.meta.source, self.meta.target, kind
            ))),
        }
    }

    /// Drop the link without destroying any row
    pub async fn clear(&self) -> OrmResult<()> {
        match self.meta.kind {
            AssociationKind::BelongsTo => {
                let source_def = self.db.registry().definition(&self.meta.source)?;
                let source_key = source_def.primary_key()?.to_string();
                let (sql, params) = QueryBuilder::update(&source_def.table_name)
                    .set(&self.meta.foreign_key, Value::Null)
                    .filter(Filter::eq(source_key, self.owner_key.clone()))
                    .to_sql_with_params()?;
                self.db.execute(&sql, &params).await?;
                Ok(())
            }
            _ => {
                let target_def = self.db.registry().definition(&self.meta.target)?;
                let (sql, params) = QueryBuilder::update(&target_def.table_name)
                    .set(&self.meta.foreign_key, Value::Null)
                    .filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    ))
                    .to_sql_with_params()?;
                self.db.execute(&sql, &params).await?;
                Ok(())
            }
        }
    }
}

/// Accessor over a collection association (hasMany, belongsToMany)
#[derive(Debug, Clone)]
pub struct ToManyAccessor {
    db: Database,
    meta: AssociationMetadata,
    owner_key: Value,
}

impl ToManyAccessor {
    pub(crate) fn new(db: Database, meta: AssociationMetadata, owner_key: Value) -> Self {
        Self {
            db,
            meta,
            owner_key,
        }
    }

    pub fn metadata(&self) -> &AssociationMetadata {
        &self.meta
    }

    /// Fetch every linked row
    pub async fn get_all(&self) -> OrmResult<Vec<Instance>> {
        match self.meta.kind {
            AssociationKind::HasMany => {
                let target = self.db.model(&self.meta.target)?;
                target
                    .find_all(QuerySpec::new().filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    )))
                    .await
            }
            AssociationKind::BelongsToMany => {
                let (through_def, target_key) = self.join_metadata()?;
                let target = self.db.model(&self.meta.target)?;
                let target_def = target.definition()?;
                let target_pk = target_def.primary_key()?.to_string();

                // Qualified, re-aliased projection keeps join-table columns
                // from colliding with the target's own.
                let columns: Vec<Attribute> = target_def
                    .column_names()
                    .into_iter()
                    .map(|column| {
                        Attribute::aliased(
                            format!("{}.{}", target_def.table_name, column),
                            column,
                        )
                    })
                    .collect();

                let mut builder = QueryBuilder::select(&target_def.table_name)
                    .columns(columns)
                    .inner_join(
                        &through_def.table_name,
                        &format!("{}.{}", through_def.table_name, target_key),
                        &format!("{}.{}", target_def.table_name, target_pk),
                    )
                    .filter(Filter::eq(
                        format!("{}.{}", through_def.table_name, self.meta.foreign_key),
                        self.owner_key.clone(),
                    ));
                if target_def.paranoid {
                    builder = builder.filter(Filter::is_null(format!(
                        "{}.{}",
                        target_def.table_name, DELETED_AT
                    )));
                }

                let (sql, params) = builder.to_sql_with_params()?;
                let result = self.db.execute(&sql, &params).await?;
                Ok(result
                    .rows
                    .into_iter()
                    .map(|row| Instance::from_row(target.clone(), row))
                    .collect())
            }
            kind => Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} is not a collection",
                self.meta.source, self.meta.target, kind
            ))),
        }
    }

    /// Link one more row without touching existing members
    pub async fn add(&self, target: &Instance) -> OrmResult<()> {
        let target_key = target
            .primary_key_value()
            .ok_or(OrmError::MissingPrimaryKey)?;

        match self.meta.kind {
            AssociationKind::HasMany => {
                let target_def = self.db.registry().definition(&self.meta.target)?;
                let target_pk = target_def.primary_key()?.to_string();
                let (sql, params) = QueryBuilder::update(&target_def.table_name)
                    .set(&self.meta.foreign_key, self.owner_key.clone())
                    .filter(Filter::eq(target_pk, target_key))
                    .to_sql_with_params()?;
                self.db.execute(&sql, &params).await?;
                Ok(())
            }
            AssociationKind::BelongsToMany => {
                let (through_def, _) = self.join_metadata()?;
                let (sql, params) = self.join_insert(&through_def, target_key)?;
                self.db.execute(&sql, &params).await?;
                Ok(())
            }
            kind => Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} is not a collection",
                self.meta.source, self.meta.target, kind
            ))),
        }
    }

    /// Replace the full member set
    ///
    /// Previous members absent from `targets` are unlinked; the sequence
    /// runs inside a transaction boundary when the connection has one.
    pub async fn set_all(&self, targets: &[Instance]) -> OrmResult<()> {
        let keys: Vec<Value> = targets
            .iter()
            .map(|t| t.primary_key_value().ok_or(OrmError::MissingPrimaryKey))
            .collect::<OrmResult<_>>()?;

        match self.meta.kind {
            AssociationKind::HasMany => {
                let target_def = self.db.registry().definition(&self.meta.target)?;
                let target_pk = target_def.primary_key()?.to_string();

                let mut statements = Vec::new();
                let mut unlink = QueryBuilder::update(&target_def.table_name)
                    .set(&self.meta.foreign_key, Value::Null)
                    .filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    ));
                if !keys.is_empty() {
                    unlink = unlink.filter(Filter::not_in(target_pk.clone(), keys.clone()));
                }
                statements.push(unlink.to_sql_with_params()?);

                if !keys.is_empty() {
                    statements.push(
                        QueryBuilder::update(&target_def.table_name)
                            .set(&self.meta.foreign_key, self.owner_key.clone())
                            .filter(Filter::in_list(target_pk, keys))
                            .to_sql_with_params()?,
                    );
                }
                self.db.run_batch(statements).await
            }
            AssociationKind::BelongsToMany => {
                let (through_def, _) = self.join_metadata()?;

                let mut statements = vec![QueryBuilder::delete(&through_def.table_name)
                    .filter(Filter::eq(
                        self.meta.foreign_key.clone(),
                        self.owner_key.clone(),
                    ))
                    .to_sql_with_params()?];
                for key in keys {
                    statements.push(self.join_insert(&through_def, key)?);
                }
                self.db.run_batch(statements).await
            }
            kind => Err(OrmError::Relationship(format!(
                "association '{}' -> '{}' of kind {:?} is not a collection",
                self.meta.source, self.meta.target, kind
            ))),
        }
    }

    fn join_metadata(&self) -> OrmResult<(ModelDefinition, String)> {
        let through = self.meta.through.as_deref().ok_or_else(|| {
            OrmError::Relationship(format!(
                "association '{}' -> '{}' has no through model",
                self.meta.source, self.meta.target
            ))
        })?;
        let target_key = self.meta.target_key.clone().ok_or_else(|| {
            OrmError::Relationship(format!(
                "association '{}' -> '{}' has no target key",
                self.meta.source, self.meta.target
            ))
        })?;
        Ok((self.db.registry().definition(through)?, target_key))
    }

    fn join_insert(
        &self,
        through_def: &ModelDefinition,
        target_key: Value,
    ) -> OrmResult<(String, Vec<Value>)> {
        let join_target_key = self.meta.target_key.as_deref().ok_or_else(|| {
            OrmError::Relationship(format!(
                "association '{}' -> '{}' has no target key",
                self.meta.source, self.meta.target
            ))
        })?;

        let mut builder = QueryBuilder::insert(&through_def.table_name)
            .set(&self.meta.foreign_key, self.owner_key.clone())
            .set(join_target_key, target_key);
        if through_def.timestamps {
            let now = timestamp_value(current_timestamp());
            builder = builder.set(CREATED_AT, now.clone()).set(UPDATED_AT, now);
        }
        builder.to_sql_with_params()
    }
}
