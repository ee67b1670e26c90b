use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlrow::{Column, ColumnType, Database, Index, Record, SqlError, TableDefinition};

#[derive(Debug, Serialize, Deserialize)]
enum Status {
    Active,
    Suspended { reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct Account {
    id: i64,
    email: String,
    nickname: Option<String>,
    balance: f64,
    verified: bool,
    status: Status,
    tags: Vec<String>,
    settings: BTreeMap<String, String>,
    #[serde(with = "serde_bytes")]
    avatar: Vec<u8>,
}

impl Record for Account {
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }

    fn indexes() -> Vec<Index> {
        vec![
            Index::new("account_email", ["email"]).unique(),
            Index::new("account_nick_balance", ["nickname", "balance"]),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Edge {
    from: u32,
    to: u32,
    weight: Option<f32>,
}

impl Record for Edge {
    fn table_name() -> String {
        "edges".into()
    }

    fn primary_key() -> &'static [&'static str] {
        &["to", "from"]
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Misdeclared {
    id: i64,
}

impl Record for Misdeclared {
    fn primary_key() -> &'static [&'static str] {
        &["uuid"]
    }

    fn indexes() -> Vec<Index> {
        vec![Index::new("by_owner", ["owner", "id"])]
    }
}

#[test]
fn inferred_columns_follow_field_kinds() {
    let table = TableDefinition::build::<Account>().expect("build");
    let columns: Vec<(&str, Column)> = table
        .columns()
        .iter()
        .map(|(name, column)| (name.as_str(), *column))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("avatar", Column::new(ColumnType::Blob, false)),
            ("balance", Column::new(ColumnType::Real, false)),
            ("email", Column::new(ColumnType::Text, false)),
            ("id", Column::new(ColumnType::Int, false)),
            ("nickname", Column::new(ColumnType::Text, true)),
            ("settings", Column::new(ColumnType::Text, false)),
            ("status", Column::new(ColumnType::Text, false)),
            ("tags", Column::new(ColumnType::Text, false)),
            ("verified", Column::new(ColumnType::Int, false)),
        ]
    );
}

#[test]
fn introspection_agrees_with_build() {
    let db = Database::in_memory();
    assert_eq!(db.introspect("Account").expect("missing table"), None);

    let expected = TableDefinition::build::<Account>().expect("build");
    db.create(&expected).expect("create");
    let live = db.table::<Account>().expect("introspect").expect("table exists");
    assert_eq!(live, expected);
    assert_eq!(live.indexes(), expected.indexes());
    assert_eq!(
        live.indexes()[1].columns,
        vec!["nickname".to_string(), "balance".to_string()]
    );
}

#[test]
fn composite_keys_keep_declared_order() {
    let db = Database::in_memory();
    assert!(db.ensure::<Edge>().expect("create"));
    let live = db.introspect("edges").expect("introspect").expect("exists");
    assert_eq!(live.primary_key(), ["to".to_string(), "from".to_string()]);
    assert_eq!(live, TableDefinition::build::<Edge>().expect("build"));
    assert!(!db.ensure::<Edge>().expect("idempotent"));
}

#[test]
fn constraint_indexes_are_not_reported() {
    let db = Database::in_memory();
    db.exec(
        "CREATE TABLE \"edges\" (\"from\" INTEGER NOT NULL, \"to\" INTEGER NOT NULL UNIQUE, \
         \"weight\" REAL NULL, PRIMARY KEY (\"to\", \"from\"))",
        &[],
    )
    .expect("create");
    let live = db.introspect("edges").expect("introspect").expect("exists");
    assert!(live.indexes().is_empty());
    assert!(!db.ensure::<Edge>().expect("equivalent table"));
}

#[test]
fn differing_live_tables_are_mismatches() {
    let db = Database::in_memory();
    db.exec(
        "CREATE TABLE \"edges\" (\"from\" INTEGER NOT NULL, \"to\" INTEGER NOT NULL, \
         \"weight\" TEXT NULL, PRIMARY KEY (\"to\", \"from\"))",
        &[],
    )
    .expect("create");
    let err = db.ensure::<Edge>().expect_err("weight type differs");
    assert!(matches!(err, SqlError::SchemaMismatch { ref table } if table == "edges"));
}

#[test]
fn undeclared_key_fields_fail_sorted() {
    match TableDefinition::build::<Misdeclared>() {
        Err(SqlError::InvalidColumns(names)) => assert_eq!(names, ["owner", "uuid"]),
        other => panic!("expected InvalidColumns, got {other:?}"),
    }
    let db = Database::in_memory();
    let err = db.ensure::<Misdeclared>().expect_err("invalid declaration");
    assert_eq!(err.code(), "InvalidColumns");
}
