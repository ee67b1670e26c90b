//! Value-mode walk, encoding direction.

use serde::ser::{self, Impossible, Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use crate::codec::Row;
use crate::query::Value;
use crate::types::{Result, SqlError};

const NOT_A_RECORD: &str = "records must serialize as structs with named fields";

/// Encodes a single field value into its bound form.
///
/// Scalars map onto their storage class directly; compound shapes fall back
/// to JSON text.
pub(crate) fn encode_field<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    match value.serialize(FieldEncoder) {
        Ok(bound) => Ok(bound),
        Err(FieldError::Opaque) => Ok(Value::Text(serde_json::to_string(value)?)),
        Err(FieldError::Failed(err)) => Err(err),
    }
}

/// Walks `record`'s fields, overwriting or appending one entry per field.
pub(crate) fn encode_into<T: Serialize + ?Sized>(record: &T, row: &mut Row) -> Result<()> {
    record.serialize(RowEncoder { row })
}

#[derive(Debug, Error)]
enum FieldError {
    /// Shape has no scalar form; the caller serializes it as JSON instead.
    #[error("value needs opaque encoding")]
    Opaque,
    #[error(transparent)]
    Failed(#[from] SqlError),
}

impl ser::Error for FieldError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        FieldError::Failed(SqlError::Serialization(msg.to_string()))
    }
}

struct FieldEncoder;

type FieldResult = std::result::Result<Value, FieldError>;

impl Serializer for FieldEncoder {
    type Ok = Value;
    type Error = FieldError;
    type SerializeSeq = Impossible<Value, FieldError>;
    type SerializeTuple = Impossible<Value, FieldError>;
    type SerializeTupleStruct = Impossible<Value, FieldError>;
    type SerializeTupleVariant = Impossible<Value, FieldError>;
    type SerializeMap = Impossible<Value, FieldError>;
    type SerializeStruct = Impossible<Value, FieldError>;
    type SerializeStructVariant = Impossible<Value, FieldError>;

    fn serialize_bool(self, v: bool) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_i8(self, v: i8) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> FieldResult {
        Ok(Value::try_from(v)?)
    }

    fn serialize_f32(self, v: f32) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> FieldResult {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> FieldResult {
        Ok(Value::from(v))
    }

    fn serialize_none(self) -> FieldResult {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> FieldResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> FieldResult {
        Err(FieldError::Opaque)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> FieldResult {
        Err(FieldError::Opaque)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> FieldResult {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> FieldResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> FieldResult {
        Err(FieldError::Opaque)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self::SerializeSeq, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, FieldError> {
        Err(FieldError::Opaque)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, FieldError> {
        Err(FieldError::Opaque)
    }
}

/// Top-level encoder: accepts exactly one struct and routes its fields into the row.
struct RowEncoder<'a> {
    row: &'a mut Row,
}

fn not_a_record<T>() -> Result<T> {
    Err(SqlError::not_representable(NOT_A_RECORD))
}

impl<'a> Serializer for RowEncoder<'a> {
    type Ok = ();
    type Error = SqlError;
    type SerializeSeq = Impossible<(), SqlError>;
    type SerializeTuple = Impossible<(), SqlError>;
    type SerializeTupleStruct = Impossible<(), SqlError>;
    type SerializeTupleVariant = Impossible<(), SqlError>;
    type SerializeMap = Impossible<(), SqlError>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), SqlError>;

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<()> {
        not_a_record()
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        not_a_record()
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        not_a_record()
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        not_a_record()
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        not_a_record()
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        not_a_record()
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        not_a_record()
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        not_a_record()
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        not_a_record()
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        not_a_record()
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        not_a_record()
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        not_a_record()
    }

    fn serialize_str(self, _v: &str) -> Result<()> {
        not_a_record()
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        not_a_record()
    }

    fn serialize_none(self) -> Result<()> {
        not_a_record()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<()> {
        not_a_record()
    }

    fn serialize_unit(self) -> Result<()> {
        not_a_record()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        not_a_record()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        not_a_record()
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<()> {
        not_a_record()
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        not_a_record()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        not_a_record()
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        not_a_record()
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        not_a_record()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        not_a_record()
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        not_a_record()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        not_a_record()
    }
}

impl<'a> SerializeStruct for RowEncoder<'a> {
    type Ok = ();
    type Error = SqlError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let bound = encode_field(value)?;
        self.row.set(key, bound);
        Ok(())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
