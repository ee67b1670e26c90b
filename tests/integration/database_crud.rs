use std::sync::Once;

use serde::{Deserialize, Serialize};
use sqlrow::{Database, Operator, Order, Predicate, Query, Record, Row, SqlError, Value};
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqlrow=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    id: u32,
    name: Option<String>,
}

impl Record for Person {
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

fn person(id: u32, name: &str) -> Person {
    Person {
        id,
        name: Some(name.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Membership {
    group: String,
    member: Option<String>,
    level: i32,
}

impl Record for Membership {
    fn table_name() -> String {
        "memberships".into()
    }

    fn primary_key() -> &'static [&'static str] {
        &["group", "member"]
    }
}

#[test]
fn people_scenario() {
    init_tracing();
    let dir = tempdir().expect("temp dir");
    let db = Database::open(dir.path().join("people.sqlite"));
    assert!(db.ensure::<Person>().expect("create table"));

    let ddl: Vec<Ddl> = db
        .query(
            "SELECT sql FROM sqlite_master WHERE name = ?",
            &[Value::from("Person")],
        )
        .expect("read ddl");
    assert_eq!(
        ddl,
        vec![Ddl {
            sql: r#"CREATE TABLE "Person" ("id" INTEGER NOT NULL, "name" TEXT NULL, PRIMARY KEY ("id"))"#
                .into()
        }]
    );

    db.insert(&person(1, "John Doe")).expect("insert john");
    db.insert(&person(2, "Fulano de Tal")).expect("insert fulano");

    let by_name: Vec<Person> = db
        .select(&Query::new().order_by(Order::asc("name")))
        .expect("order by name");
    assert_eq!(by_name, vec![person(2, "Fulano de Tal"), person(1, "John Doe")]);

    let second: Vec<Person> = db
        .select(&Query::new().limit(1).offset(1))
        .expect("second page");
    assert_eq!(second, vec![person(2, "Fulano de Tal")]);

    let deleted = db
        .delete(&Person { id: 1, name: None })
        .expect("delete by key");
    assert_eq!(deleted, 1);
    let rest: Vec<Person> = db.select(&Query::new()).expect("select all");
    assert_eq!(rest, vec![person(2, "Fulano de Tal")]);
}

#[derive(Debug, PartialEq, Deserialize)]
struct Ddl {
    sql: String,
}

#[test]
fn null_key_fields_match_null_rows() {
    init_tracing();
    let db = Database::in_memory();
    db.ensure::<Membership>().expect("create");

    let orphan = Membership {
        group: "admins".into(),
        member: None,
        level: 1,
    };
    let named = Membership {
        group: "admins".into(),
        member: Some("ana".into()),
        level: 2,
    };
    db.insert(&orphan).expect("insert orphan");
    db.insert(&named).expect("insert named");

    let promoted = Membership { level: 9, ..orphan.clone() };
    assert_eq!(db.update(&promoted).expect("update orphan"), 1);

    let rows: Vec<Membership> = db
        .select(&Query::new().filter(Predicate::is_null("member")))
        .expect("select orphans");
    assert_eq!(rows, vec![promoted.clone()]);

    assert_eq!(db.delete(&promoted).expect("delete orphan"), 1);
    let remaining: Vec<Membership> = db.select(&Query::new()).expect("select all");
    assert_eq!(remaining, vec![named]);
}

#[test]
fn bulk_updates_and_deletes() {
    init_tracing();
    let db = Database::in_memory();
    db.ensure::<Person>().expect("create");
    for id in 1..=5 {
        db.insert(&person(id, &format!("p{id}"))).expect("insert");
    }

    let mut set = Row::new();
    set.set("name", Value::from("renamed"));
    let renamed = db
        .update_where::<Person>(set, Some(&Predicate::is_in("id", [2u32, 4])))
        .expect("rename");
    assert_eq!(renamed, 2);

    let matched: Vec<Person> = db
        .select(
            &Query::new()
                .filter(Predicate::compare("name", Operator::Like, "ren%"))
                .order_by(Order::desc("id")),
        )
        .expect("like");
    assert_eq!(matched, vec![person(4, "renamed"), person(2, "renamed")]);

    assert_eq!(
        db.update_where::<Person>(Row::new(), None).expect("empty set"),
        0
    );

    let removed = db
        .delete_where::<Person>(Some(
            &Predicate::compare("id", Operator::Gt, 3).or(Predicate::eq("id", 1)),
        ))
        .expect("delete some");
    assert_eq!(removed, 3);
    let ids: Vec<u32> = db
        .select::<Person>(&Query::new().order_by(Order::asc("id")))
        .expect("select rest")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn constraint_failures_surface_as_engine_errors() {
    let db = Database::in_memory();
    db.ensure::<Person>().expect("create");
    db.insert(&person(7, "first")).expect("insert");
    let err = db.insert(&person(7, "again")).expect_err("duplicate key");
    assert!(matches!(err, SqlError::Engine { .. }), "{err:?}");
    assert_eq!(db.select::<Person>(&Query::new()).expect("select").len(), 1);
}

#[test]
fn reopened_files_keep_rows() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("reopen.sqlite");
    {
        let db = Database::open(&path);
        db.ensure::<Person>().expect("create");
        db.insert(&person(3, "kept")).expect("insert");
        db.close().expect("close");
    }
    let db = Database::open(&path);
    assert!(!db.ensure::<Person>().expect("already created"));
    let rows: Vec<Person> = db.select(&Query::new()).expect("select");
    assert_eq!(rows, vec![person(3, "kept")]);
}
