use std::collections::BTreeMap;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use sqlrow::codec::{decode, encode};
use sqlrow::{Column, ColumnType, Database, Query, Record, SqlError, TableDefinition, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Shade {
    Light,
    Dark,
    Custom(u8, u8, u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Meters(f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Everything {
    id: i64,
    flag: bool,
    tiny: i8,
    small: u16,
    medium: i32,
    large: u32,
    ratio: f32,
    distance: Meters,
    letter: char,
    label: String,
    maybe_label: Option<String>,
    maybe_number: Option<i64>,
    shade: Shade,
    maybe_shade: Option<Shade>,
    origin: Point,
    path: Vec<Point>,
    counts: BTreeMap<String, u32>,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

impl Record for Everything {
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

fn arb_shade() -> impl Strategy<Value = Shade> {
    prop_oneof![
        Just(Shade::Light),
        Just(Shade::Dark),
        any::<(u8, u8, u8)>().prop_map(|(r, g, b)| Shade::Custom(r, g, b)),
    ]
}

fn arb_point() -> impl Strategy<Value = Point> {
    any::<(i32, i32)>().prop_map(|(x, y)| Point { x, y })
}

fn finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_map(|f| if f.is_finite() { f } else { 0.0 })
}

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_map(|f| if f.is_finite() { f } else { 0.0 })
}

prop_compose! {
    fn arb_everything()(
        id in any::<i64>(),
        flag in any::<bool>(),
        tiny in any::<i8>(),
        small in any::<u16>(),
        medium in any::<i32>(),
        large in any::<u32>(),
        ratio in finite_f32(),
        distance in finite_f64(),
        letter in any::<char>(),
        label in ".{0,24}",
        maybe_label in proptest::option::of("[a-z ]{0,12}"),
        maybe_number in proptest::option::of(any::<i64>()),
        shade in arb_shade(),
        maybe_shade in proptest::option::of(arb_shade()),
        origin in arb_point(),
        path in prop::collection::vec(arb_point(), 0..4),
        counts in prop::collection::btree_map("[a-z]{1,6}", any::<u32>(), 0..4),
        payload in prop::collection::vec(any::<u8>(), 0..32),
    ) -> Everything {
        Everything {
            id,
            flag,
            tiny,
            small,
            medium,
            large,
            ratio,
            distance: Meters(distance),
            letter,
            label,
            maybe_label,
            maybe_number,
            shade,
            maybe_shade,
            origin,
            path,
            counts,
            payload,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_codec_round_trips(record in arb_everything()) {
        let row = encode(&record).expect("encode");
        prop_assert_eq!(row.len(), 18);
        let back: Everything = decode(&row).expect("decode");
        prop_assert_eq!(back, record);
    }

    #[test]
    fn prop_records_survive_the_database(records in prop::collection::vec(arb_everything(), 1..6)) {
        let db = Database::in_memory();
        db.ensure::<Everything>().expect("create");
        let mut unique = BTreeMap::new();
        for record in records {
            unique.insert(record.id, record);
        }
        for record in unique.values() {
            db.insert(record).expect("insert");
        }
        let stored: Vec<Everything> = db
            .select(&Query::new().order_by(sqlrow::Order::asc("id")))
            .expect("select");
        prop_assert_eq!(stored, unique.into_values().collect::<Vec<_>>());
    }
}

#[test]
fn stored_forms_match_storage_classes() {
    let record = Everything {
        id: 1,
        flag: true,
        tiny: -3,
        small: 9,
        medium: 0,
        large: 7,
        ratio: 0.5,
        distance: Meters(2.25),
        letter: 'é',
        label: "label".into(),
        maybe_label: None,
        maybe_number: Some(5),
        shade: Shade::Dark,
        maybe_shade: Some(Shade::Custom(1, 2, 3)),
        origin: Point { x: 1, y: -1 },
        path: vec![],
        counts: BTreeMap::from([("a".to_string(), 1)]),
        payload: vec![0, 255],
    };
    let row = encode(&record).expect("encode");
    assert_eq!(row.get("flag"), Some(&Value::Int(-1)));
    assert_eq!(row.get("distance"), Some(&Value::Real(2.25)));
    assert_eq!(row.get("letter"), Some(&Value::Text("é".into())));
    assert_eq!(row.get("maybe_label"), Some(&Value::Null));
    assert_eq!(row.get("shade"), Some(&Value::Text("Dark".into())));
    assert_eq!(
        row.get("maybe_shade"),
        Some(&Value::Text(r#"{"Custom":[1,2,3]}"#.into()))
    );
    assert_eq!(
        row.get("origin"),
        Some(&Value::Text(r#"{"x":1,"y":-1}"#.into()))
    );
    assert_eq!(row.get("path"), Some(&Value::Text("[]".into())));
    assert_eq!(row.get("payload"), Some(&Value::Blob(vec![0, 255])));
}

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    id: i64,
    hits: u64,
}

impl Record for Counter {}

#[test]
fn oversized_unsigned_values_are_not_representable() {
    let err = encode(&Counter {
        id: 1,
        hits: u64::MAX,
    })
    .expect_err("u64 overflow");
    assert!(matches!(err, SqlError::NotRepresentable(_)), "{err:?}");
    let fits = encode(&Counter {
        id: 1,
        hits: i64::MAX as u64,
    })
    .expect("fits");
    assert_eq!(fits.get("hits"), Some(&Value::Int(i64::MAX)));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
struct Handle(String);

impl TryFrom<String> for Handle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.starts_with('@') {
            Ok(Handle(value))
        } else {
            Err(format!("handle '{value}' must start with '@'"))
        }
    }
}

impl From<Handle> for String {
    fn from(value: Handle) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: i64,
    handle: Handle,
    alias: Option<Handle>,
}

impl Record for Profile {
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
}

#[test]
fn registered_types_round_trip() {
    sqlrow::register(Handle("@sample".into())).expect("register");

    let table = TableDefinition::build::<Profile>().expect("build");
    assert_eq!(
        table.column("handle"),
        Some(&Column::new(ColumnType::Text, false))
    );
    assert_eq!(
        table.column("alias"),
        Some(&Column::new(ColumnType::Text, true))
    );

    let profiles = vec![
        Profile {
            id: 1,
            handle: Handle("@ada".into()),
            alias: Some(Handle("@countess".into())),
        },
        Profile {
            id: 2,
            handle: Handle("@grace".into()),
            alias: None,
        },
    ];

    let row = encode(&profiles[0]).expect("encode");
    assert_eq!(row.get("handle"), Some(&Value::Text("@ada".into())));
    let back: Profile = decode(&row).expect("decode");
    assert_eq!(back, profiles[0]);

    let db = Database::in_memory();
    assert!(db.ensure::<Profile>().expect("create"));
    for profile in &profiles {
        db.insert(profile).expect("insert");
    }
    let stored: Vec<Profile> = db
        .select(&Query::new().order_by(sqlrow::Order::asc("id")))
        .expect("select");
    assert_eq!(stored, profiles);

    let mut invalid = sqlrow::Row::new();
    invalid.set("handle", Value::from("nobody"));
    db.update_where::<Profile>(invalid, None).expect("raw write");
    let err = db.select::<Profile>(&Query::new()).expect_err("rejected handle");
    assert_eq!(err.code(), "Serialization");
}
