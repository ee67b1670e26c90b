#![forbid(unsafe_code)]

//! Execution engine: connection lifecycle, raw statements and CRUD.

mod catalog;
mod config;
mod database;


pub use config::{JournalMode, OpenOptions, Synchronous};
pub use database::Database;
