//! Instance Validation - field rules, not-null constraints, model rules
//!
//! Validation runs to completion before any statement reaches the
//! connection: field-level rules in declaration order, then model-level
//! rules. The first failure wins.

use std::collections::HashMap;

use serde_json::Value;

use super::model::ModelDefinition;
use crate::error::{OrmError, OrmResult};

/// Validate a pending value set against a model definition
pub fn validate(def: &ModelDefinition, values: &HashMap<String, Value>) -> OrmResult<()> {
    for field in &def.fields {
        let value = values.get(&field.name).filter(|v| !v.is_null());

        match value {
            None => {
                // Server-assigned columns are filled by the core, never the caller.
                if !field.allow_null && !field.auto_generated {
                    return Err(OrmError::Validation(format!(
                        "notNull violation: {}.{} cannot be null",
                        def.name, field.name
                    )));
                }
            }
            Some(value) => {
                for rule in &field.rules {
                    rule.check(&field.name, value)?;
                }
            }
        }
    }

    for rule in &def.validators {
        (rule.check)(values).map_err(OrmError::Validation)?;
    }

    Ok(())
}
