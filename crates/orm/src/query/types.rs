//! Query Types - operators, projections, and statement kinds

use std::fmt;

/// Leaf operators accepted in filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    /// IS, only meaningful against NULL
    Is,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::Ne => write!(f, "!="),
            Operator::Is => write!(f, "IS"),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
            Operator::Like => write!(f, "LIKE"),
            Operator::NotLike => write!(f, "NOT LIKE"),
            Operator::In => write!(f, "IN"),
            Operator::NotIn => write!(f, "NOT IN"),
            Operator::Between => write!(f, "BETWEEN"),
        }
    }
}

/// Statement kinds, also used to declare raw-query result shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// One projected column: plain, aliased, or a computed function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Column(String),
    Aliased { column: String, alias: String },
    Function { function: String, column: String, alias: String },
}

impl Attribute {
    pub fn column(name: impl Into<String>) -> Self {
        Attribute::Column(name.into())
    }

    pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Attribute::Aliased {
            column: column.into(),
            alias: alias.into(),
        }
    }

    /// A function projection, e.g. `COUNT(username) AS users_count`
    pub fn function(
        function: impl Into<String>,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Attribute::Function {
            function: function.into(),
            column: column.into(),
            alias: alias.into(),
        }
    }

    /// Whether this projection is an aggregate computation
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Attribute::Function { .. })
    }

    /// The column name this attribute reads from, if any
    pub fn source_column(&self) -> Option<&str> {
        match self {
            Attribute::Column(column) => Some(column),
            Attribute::Aliased { column, .. } => Some(column),
            Attribute::Function { .. } => None,
        }
    }

    /// The name this attribute takes in result rows
    pub fn result_name(&self) -> &str {
        match self {
            Attribute::Column(column) => column,
            Attribute::Aliased { alias, .. } => alias,
            Attribute::Function { alias, .. } => alias,
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        match self {
            Attribute::Column(column) => column.clone(),
            Attribute::Aliased { column, alias } => format!("{} AS {}", column, alias),
            Attribute::Function {
                function,
                column,
                alias,
            } => format!("{}({}) AS {}", function, column, alias),
        }
    }
}

/// Attribute selection for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Exactly these attributes, nothing else
    Columns(Vec<Attribute>),
    /// The model's default column set plus these computed attributes
    Include(Vec<Attribute>),
}

/// Inner-join clause between two tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub table: String,
    /// (left column, right column) equated in the ON condition
    pub on: (String, String),
}
