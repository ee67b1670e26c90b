//! Typed record mapping for SQLite.
//!
//! A serde struct implementing [`Record`] is enough to create its table,
//! insert and update rows, and select them back with compiled predicates:
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use sqlrow::{Database, Order, Query, Record};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Person {
//!     id: u32,
//!     name: Option<String>,
//! }
//!
//! impl Record for Person {
//!     fn primary_key() -> &'static [&'static str] {
//!         &["id"]
//!     }
//! }
//!
//! # fn main() -> sqlrow::Result<()> {
//! let db = Database::open("people.db");
//! db.ensure::<Person>()?;
//! db.insert(&Person { id: 1, name: Some("John Doe".into()) })?;
//! let people: Vec<Person> = db.select(&Query::new().order_by(Order::asc("name")))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod db;
pub mod query;
pub mod schema;
pub mod types;
mod walker;

pub use codec::Row;
pub use db::{Database, JournalMode, OpenOptions, Synchronous};
pub use query::{Operator, Order, Predicate, Query, Value};
pub use schema::{register, Column, ColumnType, Index, Record, TableDefinition};
pub use types::{Result, SqlError};
