//! Query Builder SQL generation
//!
//! Statements are assembled clause by clause with `$n` placeholders;
//! every bound value lands in one positional parameter list, SET clauses
//! first, WHERE predicates after.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::QueryType;
use crate::error::{OrmError, OrmResult};

impl QueryBuilder {
    /// Generate the SQL text and its parameter list
    pub fn to_sql_with_params(&self) -> OrmResult<(String, Vec<Value>)> {
        match self.kind {
            QueryType::Select => self.build_select(),
            QueryType::Insert => self.build_insert(),
            QueryType::Update => self.build_update(),
            QueryType::Delete => self.build_delete(),
        }
    }

    fn build_select(&self) -> OrmResult<(String, Vec<Value>)> {
        self.check_grouping()?;

        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} ON {} = {}",
                join.table, join.on.0, join.on.1
            ));
        }

        self.build_where(&mut sql, &mut params)?;

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok((sql, params))
    }

    /// Standard grouping rule: every selected non-aggregate column must
    /// appear in the GROUP BY list
    fn check_grouping(&self) -> OrmResult<()> {
        if self.group_by.is_empty() {
            return Ok(());
        }
        for attribute in &self.columns {
            if let Some(column) = attribute.source_column() {
                if !self.group_by.iter().any(|g| g == column) {
                    return Err(OrmError::Query(format!(
                        "column '{}' must appear in the GROUP BY clause or be used in an aggregate function",
                        column
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_insert(&self) -> OrmResult<(String, Vec<Value>)> {
        if self.set_values.is_empty() {
            return Err(OrmError::Query(format!(
                "INSERT into '{}' has no values",
                self.table
            )));
        }

        let mut params = Vec::new();
        let columns: Vec<&str> = self.set_values.iter().map(|(c, _)| c.as_str()).collect();
        let placeholders: Vec<String> = self
            .set_values
            .iter()
            .map(|(_, value)| {
                params.push(value.clone());
                format!("${}", params.len())
            })
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, params))
    }

    fn build_update(&self) -> OrmResult<(String, Vec<Value>)> {
        if self.set_values.is_empty() {
            return Err(OrmError::Query(format!(
                "UPDATE of '{}' has no SET clause",
                self.table
            )));
        }

        let mut params = Vec::new();
        let assignments: Vec<String> = self
            .set_values
            .iter()
            .map(|(column, value)| {
                params.push(value.clone());
                format!("{} = ${}", column, params.len())
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        self.build_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn build_delete(&self) -> OrmResult<(String, Vec<Value>)> {
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut params = Vec::new();
        self.build_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn build_where(&self, sql: &mut String, params: &mut Vec<Value>) -> OrmResult<()> {
        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.compile(params)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Filter;
    use crate::query::types::{Attribute, OrderDirection};
    use serde_json::json;

    #[test]
    fn test_select_star() {
        let (sql, params) = QueryBuilder::select("users").to_sql_with_params().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_with_projection_and_filter() {
        let (sql, params) = QueryBuilder::select("user")
            .columns(vec![
                Attribute::column("username"),
                Attribute::aliased("username", "login"),
            ])
            .filter(Filter::eq("id", 1))
            .to_sql_with_params()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT username, username AS login FROM user WHERE id = $1"
        );
        assert_eq!(params, vec![json!(1)]);
    }

    #[test]
    fn test_chained_filters_are_anded() {
        let (sql, _) = QueryBuilder::select("user")
            .filter(Filter::eq("username", "user"))
            .filter(Filter::is_null("deletedAt"))
            .to_sql_with_params()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM user WHERE username = $1 AND deletedAt IS NULL"
        );
    }

    #[test]
    fn test_aggregate_with_group() {
        let (sql, _) = QueryBuilder::select("user")
            .columns(vec![
                Attribute::column("username"),
                Attribute::function("COUNT", "username", "users_count"),
            ])
            .group_by(vec!["username".to_string()])
            .to_sql_with_params()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT username, COUNT(username) AS users_count FROM user GROUP BY username"
        );
    }

    #[test]
    fn test_ungrouped_column_is_rejected() {
        let err = QueryBuilder::select("user")
            .columns(vec![
                Attribute::column("username"),
                Attribute::column("email"),
                Attribute::function("COUNT", "username", "users_count"),
            ])
            .group_by(vec!["username".to_string()])
            .to_sql_with_params()
            .unwrap_err();
        assert!(err.to_string().contains("'email'"));
        assert!(err.to_string().contains("GROUP BY"));
    }

    #[test]
    fn test_aggregate_without_group_is_allowed() {
        let (sql, _) = QueryBuilder::select("user")
            .columns(vec![Attribute::function("COUNT", "*", "count")])
            .to_sql_with_params()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS count FROM user");
    }

    #[test]
    fn test_order_limit_offset() {
        let (sql, _) = QueryBuilder::select("users")
            .order_by("name", OrderDirection::Asc)
            .order_by("id", OrderDirection::Desc)
            .limit(10)
            .offset(20)
            .to_sql_with_params()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users ORDER BY name ASC, id DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_inner_join() {
        let (sql, params) = QueryBuilder::select("users")
            .columns(vec![Attribute::aliased("users.id", "id")])
            .inner_join("companyUsers", "companyUsers.userId", "users.id")
            .filter(Filter::eq("companyUsers.companyId", 1))
            .to_sql_with_params()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT users.id AS id FROM users INNER JOIN companyUsers ON companyUsers.userId = users.id WHERE companyUsers.companyId = $1"
        );
        assert_eq!(params, vec![json!(1)]);
    }

    #[test]
    fn test_insert_binds_in_declaration_order() {
        let (sql, params) = QueryBuilder::insert("books")
            .set("id", json!(1))
            .set("title", json!("Refactoring. Second Edition."))
            .to_sql_with_params()
            .unwrap();
        assert_eq!(sql, "INSERT INTO books (id, title) VALUES ($1, $2)");
        assert_eq!(params, vec![json!(1), json!("Refactoring. Second Edition.")]);
    }

    #[test]
    fn test_insert_binds_null_values() {
        let (sql, params) = QueryBuilder::insert("users")
            .set("id", json!(1))
            .set("email", Value::Null)
            .to_sql_with_params()
            .unwrap();
        assert_eq!(sql, "INSERT INTO users (id, email) VALUES ($1, $2)");
        assert_eq!(params[1], Value::Null);
    }

    #[test]
    fn test_update_numbers_where_after_set() {
        let (sql, params) = QueryBuilder::update("books")
            .set("title", json!("New title"))
            .filter(Filter::eq("id", 1))
            .to_sql_with_params()
            .unwrap();
        assert_eq!(sql, "UPDATE books SET title = $1 WHERE id = $2");
        assert_eq!(params, vec![json!("New title"), json!(1)]);
    }

    #[test]
    fn test_delete_without_filter_targets_all_rows() {
        let (sql, params) = QueryBuilder::delete("user").to_sql_with_params().unwrap();
        assert_eq!(sql, "DELETE FROM user");
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_insert_is_rejected() {
        assert!(QueryBuilder::insert("users").to_sql_with_params().is_err());
        assert!(QueryBuilder::update("users").to_sql_with_params().is_err());
    }
}
