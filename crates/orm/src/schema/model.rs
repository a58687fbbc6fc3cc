//! Model Definitions - define-time validation and metadata resolution

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::field::{FieldDefinition, FieldType};
use crate::error::{OrmError, OrmResult};

/// Column name injected by the timestamps option
pub const CREATED_AT: &str = "createdAt";
/// Column name injected by the timestamps option
pub const UPDATED_AT: &str = "updatedAt";
/// Column name injected by the paranoid option
pub const DELETED_AT: &str = "deletedAt";

/// A model-level validation rule running over the full pending value set
#[derive(Clone)]
pub struct ModelRule {
    pub name: String,
    pub check: Arc<dyn Fn(&HashMap<String, Value>) -> Result<(), String> + Send + Sync>,
}

impl fmt::Debug for ModelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelRule({})", self.name)
    }
}

/// Options accepted by `define`
#[derive(Debug, Clone)]
pub struct ModelOptions {
    /// Overrides the default table resolution (naive pluralization)
    pub table_name: Option<String>,
    /// Inject and manage createdAt/updatedAt (default true)
    pub timestamps: bool,
    /// Soft-delete mode: inject deletedAt and redirect destroy (default false)
    pub paranoid: bool,
    /// Permit more than one primary-key field
    pub composite_primary_key: bool,
    /// Model-level validators, run after every field-level rule
    pub validators: Vec<ModelRule>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelOptions {
    pub fn new() -> Self {
        Self {
            table_name: None,
            timestamps: true,
            paranoid: false,
            composite_primary_key: false,
            validators: Vec::new(),
        }
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    pub fn composite_primary_key(mut self) -> Self {
        self.composite_primary_key = true;
        self
    }

    /// Attach a model-level validator
    pub fn validate<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(ModelRule {
            name: name.into(),
            check: Arc::new(check),
        });
        self
    }
}

/// A validated model definition held by the registry
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub table_name: String,
    /// Declaration-ordered fields, including injected ones
    pub fields: Vec<FieldDefinition>,
    pub timestamps: bool,
    pub paranoid: bool,
    pub composite_primary_key: bool,
    pub validators: Vec<ModelRule>,
}

impl ModelDefinition {
    /// Validate a definition and resolve its metadata
    ///
    /// Rules observed at define time:
    /// - a field named `id` must be marked primary key;
    /// - at most one primary-key field unless the definition is composite;
    /// - with no key and no `id` field, a BigInt `id` key is injected;
    /// - timestamps/paranoid options inject their managed columns.
    pub fn new(
        name: impl Into<String>,
        mut fields: Vec<FieldDefinition>,
        options: ModelOptions,
    ) -> OrmResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(OrmError::Schema("model name cannot be empty".to_string()));
        }

        if let Some(id_field) = fields.iter().find(|f| f.name == "id") {
            if !id_field.primary_key {
                return Err(OrmError::Schema(format!(
                    "a field called 'id' was added to model '{}' but not marked with 'primaryKey: true'",
                    name
                )));
            }
        }

        let key_count = fields.iter().filter(|f| f.primary_key).count();
        if key_count > 1 && !options.composite_primary_key {
            return Err(OrmError::Schema(format!(
                "model '{}' declares {} primary key fields; declare a composite key or keep a single one",
                name, key_count
            )));
        }
        if key_count == 0 {
            fields.insert(
                0,
                FieldDefinition::new("id", FieldType::BigInt)
                    .allow_null(false)
                    .primary_key()
                    .auto_generated(),
            );
        }

        if options.timestamps {
            for column in [CREATED_AT, UPDATED_AT] {
                if !fields.iter().any(|f| f.name == column) {
                    fields.push(FieldDefinition::new(column, FieldType::DateTime).auto_generated());
                }
            }
        }
        if options.paranoid && !fields.iter().any(|f| f.name == DELETED_AT) {
            fields.push(FieldDefinition::new(DELETED_AT, FieldType::DateTime).auto_generated());
        }

        let table_name = options
            .table_name
            .unwrap_or_else(|| format!("{}s", name));

        Ok(Self {
            name,
            table_name,
            fields,
            timestamps: options.timestamps,
            paranoid: options.paranoid,
            composite_primary_key: options.composite_primary_key,
            validators: options.validators,
        })
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// All primary-key fields, in declaration order
    pub fn primary_key_fields(&self) -> Vec<&FieldDefinition> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    /// The single primary-key column for row-addressing operations
    ///
    /// Fails for composite keys, which cannot be addressed by one value.
    pub fn primary_key(&self) -> OrmResult<&str> {
        let keys = self.primary_key_fields();
        match keys.as_slice() {
            [single] => Ok(single.name.as_str()),
            _ => Err(OrmError::MissingPrimaryKey),
        }
    }

    /// The default projection: every declared column, in order
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Add a column unless one with that name already exists
    ///
    /// Association wiring calls this; re-declaring the same edge must not
    /// produce duplicate columns.
    pub(crate) fn add_field_if_absent(&mut self, field: FieldDefinition) -> bool {
        if self.has_field(&field.name) {
            return false;
        }
        self.fields.push(field);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("username", FieldType::String),
            FieldDefinition::new("birthdate", FieldType::DateTime),
            FieldDefinition::new("email", FieldType::String),
        ]
    }

    #[test]
    fn test_id_field_must_be_primary_key() {
        let mut fields = plain_fields();
        fields.insert(0, FieldDefinition::new("id", FieldType::BigInt));

        let err = ModelDefinition::new("user", fields, ModelOptions::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'id'"));
        assert!(message.contains("primaryKey:"));
    }

    #[test]
    fn test_explicit_id_primary_key_is_accepted() {
        let mut fields = plain_fields();
        fields.insert(
            0,
            FieldDefinition::new("id", FieldType::BigInt)
                .allow_null(false)
                .primary_key(),
        );

        let def =
            ModelDefinition::new("user", fields, ModelOptions::new().table_name("user")).unwrap();
        assert_eq!(def.table_name, "user");
        assert_eq!(def.primary_key().unwrap(), "id");
        assert!(!def.field("id").unwrap().auto_generated);
    }

    #[test]
    fn test_key_injected_when_none_declared() {
        let def = ModelDefinition::new("user", plain_fields(), ModelOptions::new()).unwrap();

        let id = def.field("id").unwrap();
        assert!(id.primary_key);
        assert!(id.auto_generated);
        assert_eq!(id.field_type, FieldType::BigInt);
        assert_eq!(def.fields[0].name, "id");
    }

    #[test]
    fn test_table_name_pluralizes_by_default() {
        let def = ModelDefinition::new("user", plain_fields(), ModelOptions::new()).unwrap();
        assert_eq!(def.table_name, "users");
    }

    #[test]
    fn test_multiple_keys_require_composite_declaration() {
        let fields = vec![
            FieldDefinition::new("orderId", FieldType::BigInt).primary_key(),
            FieldDefinition::new("lineNo", FieldType::Integer).primary_key(),
        ];

        assert!(ModelDefinition::new("orderLine", fields.clone(), ModelOptions::new()).is_err());

        let def = ModelDefinition::new(
            "orderLine",
            fields,
            ModelOptions::new().composite_primary_key(),
        )
        .unwrap();
        assert_eq!(def.primary_key_fields().len(), 2);
        assert!(def.primary_key().is_err());
    }

    #[test]
    fn test_timestamp_and_paranoid_columns_injected() {
        let def = ModelDefinition::new(
            "book",
            vec![FieldDefinition::new("title", FieldType::String).allow_null(false)],
            ModelOptions::new().paranoid(true),
        )
        .unwrap();

        for column in [CREATED_AT, UPDATED_AT, DELETED_AT] {
            let field = def.field(column).unwrap();
            assert!(field.auto_generated);
            assert_eq!(field.field_type, FieldType::DateTime);
        }
    }

    #[test]
    fn test_timestamps_off_injects_nothing() {
        let def = ModelDefinition::new(
            "user",
            plain_fields(),
            ModelOptions::new().timestamps(false),
        )
        .unwrap();

        assert!(!def.has_field(CREATED_AT));
        assert!(!def.has_field(UPDATED_AT));
        assert!(!def.has_field(DELETED_AT));
    }

    #[test]
    fn test_add_field_if_absent_is_idempotent() {
        let mut def = ModelDefinition::new("user", plain_fields(), ModelOptions::new()).unwrap();

        assert!(def.add_field_if_absent(FieldDefinition::new("companyId", FieldType::BigInt)));
        assert!(!def.add_field_if_absent(FieldDefinition::new("companyId", FieldType::BigInt)));
        assert_eq!(
            def.fields.iter().filter(|f| f.name == "companyId").count(),
            1
        );
    }
}
