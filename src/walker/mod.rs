#![forbid(unsafe_code)]

//! Field walker.
//!
//! One traversal of a record's named fields, driven through serde in three
//! modes: schema probe (what columns would this record produce), encode
//! (record into row) and decode (row into record).

mod decode;
mod encode;
mod probe;

use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};

use crate::codec::Row;
use crate::types::{Result, SqlError};

use decode::RowDecoder;
pub(crate) use encode::{encode_field, encode_into};
pub(crate) use probe::probe_columns;

/// Key deserializer handed to derived field identifiers.
pub(crate) fn name_deserializer(name: &'static str) -> StrDeserializer<'static, SqlError> {
    name.into_deserializer()
}

/// Builds a `T` from a materialized row.
pub(crate) fn decode_row<T: DeserializeOwned>(row: &Row) -> Result<T> {
    T::deserialize(RowDecoder::new(row))
}
