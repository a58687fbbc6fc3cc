//! Query Builder - structured statement construction

use serde_json::Value;

use super::filter::Filter;
use super::types::{Attribute, JoinClause, OrderDirection, QueryType};

/// Builder translating a structured specification into one SQL statement
/// plus its positional parameter list
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) kind: QueryType,
    pub(crate) table: String,
    pub(crate) columns: Vec<Attribute>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) filter: Option<Filter>,
    pub(crate) group_by: Vec<String>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) set_values: Vec<(String, Value)>,
}

impl QueryBuilder {
    fn new(kind: QueryType, table: &str) -> Self {
        Self {
            kind,
            table: table.to_string(),
            columns: Vec::new(),
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_values: Vec::new(),
        }
    }

    pub fn select(table: &str) -> Self {
        Self::new(QueryType::Select, table)
    }

    pub fn insert(table: &str) -> Self {
        Self::new(QueryType::Insert, table)
    }

    pub fn update(table: &str) -> Self {
        Self::new(QueryType::Update, table)
    }

    pub fn delete(table: &str) -> Self {
        Self::new(QueryType::Delete, table)
    }

    /// Set the projection; an empty projection selects `*`
    pub fn columns(mut self, columns: Vec<Attribute>) -> Self {
        self.columns = columns;
        self
    }

    /// AND a predicate into the WHERE clause
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(existing) => Filter::and(vec![existing, filter]),
        });
        self
    }

    pub fn inner_join(mut self, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(JoinClause {
            table: table.to_string(),
            on: (left.to_string(), right.to_string()),
        });
        self
    }

    pub fn group_by(mut self, columns: Vec<String>) -> Self {
        self.group_by = columns;
        self
    }

    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Bind a column value for INSERT/UPDATE
    pub fn set(mut self, column: &str, value: Value) -> Self {
        self.set_values.push((column.to_string(), value));
        self
    }
}
