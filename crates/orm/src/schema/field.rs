//! Field Metadata - column types, constraints, and field-level rules

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OrmError, OrmResult};

/// Column types recognized by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    BigInt,
    Integer,
    Float,
    String,
    Boolean,
    Date,
    DateTime,
    Json,
}

/// A single field-level validation rule
///
/// Rules run only against present, non-null values; the not-null
/// constraint is carried by [`FieldDefinition::allow_null`].
#[derive(Clone)]
pub enum FieldRule {
    /// Value must match the pattern (the "is" rule)
    Is(Regex),
    /// String length must fall within the inclusive range
    Len { min: usize, max: usize },
    /// Arbitrary predicate returning an error message on failure
    Custom(Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>),
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Is(pattern) => write!(f, "Is({})", pattern.as_str()),
            FieldRule::Len { min, max } => write!(f, "Len {{ min: {}, max: {} }}", min, max),
            FieldRule::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl FieldRule {
    /// Rule name used in failure messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldRule::Is(_) => "is",
            FieldRule::Len { .. } => "len",
            FieldRule::Custom(_) => "custom",
        }
    }

    /// Check a non-null value against this rule
    pub fn check(&self, field: &str, value: &Value) -> OrmResult<()> {
        let failed = |rule: &FieldRule| {
            Err(OrmError::Validation(format!(
                "Validation {} on {} failed",
                rule.name(),
                field
            )))
        };

        match self {
            FieldRule::Is(pattern) => match value.as_str() {
                Some(s) if pattern.is_match(s) => Ok(()),
                _ => failed(self),
            },
            FieldRule::Len { min, max } => match value.as_str() {
                Some(s) if s.len() >= *min && s.len() <= *max => Ok(()),
                _ => failed(self),
            },
            FieldRule::Custom(check) => check(value).map_err(OrmError::Validation),
        }
    }
}

/// One column of a model definition
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    /// Whether NULL/absent values pass validation
    pub allow_null: bool,
    pub primary_key: bool,
    /// Server-assigned fields (injected keys, timestamps) skip the
    /// not-null check and are stripped from user payloads
    pub auto_generated: bool,
    pub rules: Vec<FieldRule>,
}

impl FieldDefinition {
    /// Create a nullable, non-key field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            allow_null: true,
            primary_key: false,
            auto_generated: false,
            rules: Vec::new(),
        }
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub(crate) fn auto_generated(mut self) -> Self {
        self.auto_generated = true;
        self
    }

    /// Attach a pattern ("is") rule
    pub fn matches(mut self, pattern: Regex) -> Self {
        self.rules.push(FieldRule::Is(pattern));
        self
    }

    /// Attach a length rule
    pub fn len(mut self, min: usize, max: usize) -> Self {
        self.rules.push(FieldRule::Len { min, max });
        self
    }

    /// Attach an arbitrary rule
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }
}
