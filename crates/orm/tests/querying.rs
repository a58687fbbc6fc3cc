//! Querying behavior: attribute projection, aliases, aggregates with
//! grouping, and operator-tree filter composition.

mod support;

use serde_json::json;

use relata_orm::{
    Attribute, Database, FieldDefinition, FieldType, Filter, Model, ModelOptions, Projection,
    QuerySpec,
};
use support::{row, MockConnection};

fn user_model(db: &Database) -> Model {
    db.define(
        "user",
        vec![
            FieldDefinition::new("id", FieldType::BigInt)
                .allow_null(false)
                .primary_key(),
            FieldDefinition::new("username", FieldType::String),
            FieldDefinition::new("birthdate", FieldType::DateTime),
            FieldDefinition::new("email", FieldType::String),
        ],
        ModelOptions::new().table_name("user").timestamps(false),
    )
    .unwrap()
}

#[tokio::test]
async fn select_single_attribute_leaves_the_rest_unset() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("username", json!("user"))])]);
    let users = user
        .find_all(
            QuerySpec::new()
                .attributes(Projection::Columns(vec![Attribute::column("username")])),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("username").unwrap(), &json!("user"));
    assert!(users[0].get("id").is_none());
    assert!(users[0].get("birthdate").is_none());
    assert!(users[0].get("email").is_none());

    assert_eq!(conn.statements(), vec!["SELECT username FROM user"]);
}

#[tokio::test]
async fn select_attribute_under_an_alias() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("login", json!("user"))])]);
    let users = user
        .find_all(QuerySpec::new().attributes(Projection::Columns(vec![Attribute::aliased(
            "username", "login",
        )])))
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert!(users[0].get("username").is_none());
    assert_eq!(users[0].get("login").unwrap(), &json!("user"));

    assert_eq!(conn.statements(), vec!["SELECT username AS login FROM user"]);
}

#[tokio::test]
async fn select_count_aggregate_only() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("users_count", json!(1))])]);
    let users = user
        .find_all(
            QuerySpec::new().attributes(Projection::Columns(vec![Attribute::function(
                "COUNT",
                "username",
                "users_count",
            )])),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert!(users[0].get("id").is_none());
    assert!(users[0].get("username").is_none());
    assert_eq!(users[0].get("users_count").unwrap(), &json!(1));

    assert_eq!(
        conn.statements(),
        vec!["SELECT COUNT(username) AS users_count FROM user"]
    );
}

#[tokio::test]
async fn include_appends_the_aggregate_to_the_default_columns() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[
        ("id", json!("1")),
        ("username", json!("user")),
        ("birthdate", json!("1989-01-01")),
        ("email", json!("user@company.com")),
        ("users_count", json!(1)),
    ])]);

    let users = user
        .find_all(
            QuerySpec::new()
                .attributes(Projection::Include(vec![Attribute::function(
                    "COUNT",
                    "username",
                    "users_count",
                )]))
                .group(vec![
                    "username".to_string(),
                    "birthdate".to_string(),
                    "email".to_string(),
                    "id".to_string(),
                ]),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("id").unwrap(), &json!("1"));
    assert_eq!(users[0].get("username").unwrap(), &json!("user"));
    assert_eq!(users[0].get("email").unwrap(), &json!("user@company.com"));
    assert_eq!(users[0].get("users_count").unwrap(), &json!(1));

    assert_eq!(
        conn.statements(),
        vec![
            "SELECT id, username, birthdate, email, COUNT(username) AS users_count \
             FROM user GROUP BY username, birthdate, email, id"
        ]
    );
}

#[tokio::test]
async fn grouping_must_name_every_selected_column() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    let err = user
        .find_all(
            QuerySpec::new()
                .attributes(Projection::Include(vec![Attribute::function(
                    "COUNT",
                    "username",
                    "users_count",
                )]))
                .group(vec!["username".to_string()]),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("GROUP BY"));
    assert_eq!(conn.call_count(), 0);
}

#[tokio::test]
async fn find_all_by_missing_id_returns_nothing() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(Vec::new());
    let users = user
        .find_all(QuerySpec::new().filter(Filter::eq("id", 1)))
        .await
        .unwrap();
    assert!(users.is_empty());

    assert_eq!(
        conn.statements(),
        vec!["SELECT id, username, birthdate, email FROM user WHERE id = $1"]
    );
}

#[tokio::test]
async fn find_all_by_id_returns_the_row() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[
        ("id", json!("1")),
        ("username", json!("user")),
        ("birthdate", json!("1989-01-01")),
        ("email", json!("user@company.com")),
    ])]);

    let users = user
        .find_all(QuerySpec::new().filter(Filter::eq("id", 1)))
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("id").unwrap(), &json!("1"));
}

#[tokio::test]
async fn multiple_top_level_keys_combine_with_and() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("id", json!("1"))])]);
    let users = user
        .find_all(
            QuerySpec::new()
                .filter(Filter::eq("username", "user"))
                .filter(Filter::eq("email", "user@company.com")),
        )
        .await
        .unwrap();
    assert_eq!(users.len(), 1);

    let calls = conn.calls();
    assert_eq!(
        calls[0].0,
        "SELECT id, username, birthdate, email FROM user WHERE username = $1 AND email = $2"
    );
    assert_eq!(calls[0].1, vec![json!("user"), json!("user@company.com")]);
}

#[tokio::test]
async fn explicit_or_combines_its_children() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    // One row matches on username alone; it comes back exactly once.
    conn.respond_rows(vec![row(&[("id", json!("1")), ("username", json!("user"))])]);
    let users = user
        .find_all(QuerySpec::new().filter(Filter::or(vec![
            Filter::eq("username", "user"),
            Filter::eq("email", "user1@company.com"),
        ])))
        .await
        .unwrap();
    assert_eq!(users.len(), 1);

    assert_eq!(
        conn.statements(),
        vec!["SELECT id, username, birthdate, email FROM user WHERE username = $1 OR email = $2"]
    );
}

#[tokio::test]
async fn nested_operator_tree_on_one_field() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("id", json!("1"))])]);
    let users = user
        .find_all(QuerySpec::new().filter(Filter::or(vec![
            Filter::is_null("username"),
            Filter::eq("username", "user"),
        ])))
        .await
        .unwrap();
    assert_eq!(users.len(), 1);

    assert_eq!(
        conn.statements(),
        vec![
            "SELECT id, username, birthdate, email FROM user \
             WHERE username IS NULL OR username = $1"
        ]
    );
}

#[tokio::test]
async fn find_one_limits_to_a_single_row() {
    let conn = MockConnection::new();
    let db = Database::new(conn.clone());
    let user = user_model(&db);

    conn.respond_rows(vec![row(&[("id", json!("1"))])]);
    let found = user
        .find_one(QuerySpec::new().filter(Filter::eq("id", 1)))
        .await
        .unwrap();
    assert!(found.is_some());

    assert_eq!(
        conn.statements(),
        vec!["SELECT id, username, birthdate, email FROM user WHERE id = $1 LIMIT 1"]
    );

    conn.respond_rows(Vec::new());
    let missing = user
        .find_one(QuerySpec::new().filter(Filter::eq("id", 2)))
        .await
        .unwrap();
    assert!(missing.is_none());
}
