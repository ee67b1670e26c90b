#![forbid(unsafe_code)]

//! Row codec: records to and from ordered column/value lists.

mod row;

pub use row::Row;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::query::Value;
use crate::schema::{Record, TableDefinition};
use crate::types::Result;
use crate::walker;

/// Encodes `record` against its inferred table definition.
pub fn encode<T: Record>(record: &T) -> Result<Row> {
    let table = TableDefinition::build::<T>()?;
    encode_with(&table, record)
}

/// Encodes `record`, pre-seeding every nullable column of `table` to NULL so
/// fields skipped during serialization still get a column.
pub fn encode_with<T: Serialize + ?Sized>(table: &TableDefinition, record: &T) -> Result<Row> {
    let mut row: Row = table
        .nullable_columns()
        .map(|name| (name.to_owned(), Value::Null))
        .collect();
    walker::encode_into(record, &mut row)?;
    Ok(row)
}

/// Decodes a record from a complete row.
pub fn decode<T: DeserializeOwned>(row: &Row) -> Result<T> {
    walker::decode_row(row)
}
