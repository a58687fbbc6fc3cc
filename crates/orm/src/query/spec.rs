//! Query Specifications - caller-facing find/count inputs

use super::filter::Filter;
use super::types::{OrderDirection, Projection};

/// Structured input for `find_all`, `find_one`, and `count`
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Row predicate; absent means every row
    pub filter: Option<Filter>,
    /// Attribute selection; absent means the model's full column set
    pub attributes: Option<Projection>,
    pub group: Vec<String>,
    pub order: Vec<(String, OrderDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Include soft-deleted rows of paranoid models
    pub include_deleted: bool,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a predicate into the specification
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(existing) => Filter::and(vec![existing, filter]),
        });
        self
    }

    pub fn attributes(mut self, projection: Projection) -> Self {
        self.attributes = Some(projection);
        self
    }

    pub fn group(mut self, columns: Vec<String>) -> Self {
        self.group = columns;
        self
    }

    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order.push((column.to_string(), direction));
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

    /// Disable the implicit `deletedAt IS NULL` predicate
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}
