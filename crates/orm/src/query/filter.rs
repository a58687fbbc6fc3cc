//! Filter Expressions - operator trees compiled to parameterized predicates
//!
//! A filter is a tagged tree: leaves pair a column with an operator and a
//! value, inner nodes combine children with AND/OR/NOT. Compilation walks
//! the tree recursively, appending bind values and numbering placeholders
//! from wherever the surrounding statement left off.

use serde_json::Value;

use super::types::Operator;
use crate::error::{OrmError, OrmResult};

/// A boolean predicate over one row
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Leaf {
        field: String,
        op: Operator,
        value: Value,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    fn leaf(field: impl Into<String>, op: Operator, value: Value) -> Self {
        Filter::Leaf {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Eq, value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Ne, value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Gt, value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Gte, value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Lt, value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Lte, value.into())
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::leaf(field, Operator::Like, Value::String(pattern.into()))
    }

    pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::leaf(field, Operator::NotLike, Value::String(pattern.into()))
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::leaf(field, Operator::Is, Value::Null)
    }

    pub fn in_list<V: Into<Value>>(field: impl Into<String>, values: Vec<V>) -> Self {
        Self::leaf(
            field,
            Operator::In,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: Vec<V>) -> Self {
        Self::leaf(
            field,
            Operator::NotIn,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::leaf(
            field,
            Operator::Between,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    pub fn and(children: Vec<Filter>) -> Self {
        Filter::And(children)
    }

    pub fn or(children: Vec<Filter>) -> Self {
        Filter::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Filter) -> Self {
        Filter::Not(Box::new(child))
    }

    /// Compile to predicate SQL, appending bind values to `params`
    ///
    /// Placeholder numbering continues from the current length of
    /// `params`, so a filter can follow SET-clause binds in one statement.
    pub(crate) fn compile(&self, params: &mut Vec<Value>) -> OrmResult<String> {
        match self {
            Filter::Leaf { field, op, value } => Self::compile_leaf(field, *op, value, params),
            Filter::And(children) => Self::compile_children(children, " AND ", "1 = 1", params),
            Filter::Or(children) => Self::compile_children(children, " OR ", "1 = 0", params),
            Filter::Not(child) => Ok(format!("NOT ({})", child.compile(params)?)),
        }
    }

    fn compile_children(
        children: &[Filter],
        separator: &str,
        empty: &str,
        params: &mut Vec<Value>,
    ) -> OrmResult<String> {
        if children.is_empty() {
            return Ok(empty.to_string());
        }

        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            let sql = child.compile(params)?;
            // Composite children keep their own parentheses so operator
            // precedence follows the tree, not SQL defaults.
            if matches!(child, Filter::Leaf { .. } | Filter::Not(_)) {
                parts.push(sql);
            } else {
                parts.push(format!("({})", sql));
            }
        }
        Ok(parts.join(separator))
    }

    fn compile_leaf(
        field: &str,
        op: Operator,
        value: &Value,
        params: &mut Vec<Value>,
    ) -> OrmResult<String> {
        let mut bind = |value: &Value| {
            params.push(value.clone());
            format!("${}", params.len())
        };

        match op {
            Operator::Is => match value {
                Value::Null => Ok(format!("{} IS NULL", field)),
                _ => Err(OrmError::Query(format!(
                    "IS operator on '{}' accepts only null",
                    field
                ))),
            },
            Operator::In | Operator::NotIn => {
                let values = value.as_array().ok_or_else(|| {
                    OrmError::Query(format!("{} operator on '{}' requires a list", op, field))
                })?;
                if values.is_empty() {
                    // An empty list matches nothing (IN) or everything (NOT IN).
                    return Ok(match op {
                        Operator::In => "1 = 0".to_string(),
                        _ => "1 = 1".to_string(),
                    });
                }
                let placeholders: Vec<String> = values.iter().map(&mut bind).collect();
                Ok(format!("{} {} ({})", field, op, placeholders.join(", ")))
            }
            Operator::Between => {
                let values = value.as_array().filter(|v| v.len() == 2).ok_or_else(|| {
                    OrmError::Query(format!(
                        "BETWEEN operator on '{}' requires exactly two bounds",
                        field
                    ))
                })?;
                let low = bind(&values[0]);
                let high = bind(&values[1]);
                Ok(format!("{} BETWEEN {} AND {}", field, low, high))
            }
            _ => Ok(format!("{} {} {}", field, op, bind(value))),
        }
    }
}
