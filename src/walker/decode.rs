//! Value-mode walk, decoding direction.

use std::borrow::Cow;

use serde::de::value::StrDeserializer;
use serde::de::{DeserializeSeed, IntoDeserializer, MapAccess, Visitor};
use serde::Deserializer;

use crate::codec::Row;
use crate::query::Value;
use crate::types::{Result, SqlError};

use super::name_deserializer;

/// Deserializes a record from a fully materialized row.
pub(crate) struct RowDecoder<'de> {
    row: &'de Row,
}

impl<'de> RowDecoder<'de> {
    pub(crate) fn new(row: &'de Row) -> Self {
        Self { row }
    }
}

impl<'de> Deserializer<'de> for RowDecoder<'de> {
    type Error = SqlError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(SqlError::not_representable(
            "rows decode only into structs with named fields",
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_map(RowFields {
            row: self.row,
            fields: fields.iter(),
            current: None,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

struct RowFields<'de> {
    row: &'de Row,
    fields: std::slice::Iter<'static, &'static str>,
    current: Option<&'static str>,
}

impl<'de> MapAccess<'de> for RowFields<'de> {
    type Error = SqlError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.fields.next() {
            Some(&name) => {
                self.current = Some(name);
                seed.deserialize(name_deserializer(name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let name = self
            .current
            .take()
            .ok_or_else(|| SqlError::Serialization("value requested before key".into()))?;
        let value = self
            .row
            .get(name)
            .ok_or_else(|| SqlError::ColumnNotFound(name.to_owned()))?;
        seed.deserialize(FieldDecoder::new(name, value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Converts one stored value into whatever shape the field asks for.
#[derive(Clone, Copy)]
pub(crate) struct FieldDecoder<'de> {
    column: &'static str,
    value: &'de Value,
}

impl<'de> FieldDecoder<'de> {
    pub(crate) fn new(column: &'static str, value: &'de Value) -> Self {
        Self { column, value }
    }

    fn unexpected(&self, expected: &str) -> SqlError {
        let found = match self.value {
            Value::Null => "NULL",
            Value::Blob(_) => "BLOB",
            Value::Int(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
        };
        SqlError::Serialization(format!(
            "column '{}': expected {expected}, found {found}",
            self.column
        ))
    }

    fn integer(&self) -> Result<i64> {
        match self.value {
            Value::Int(v) => Ok(*v),
            Value::Real(v) if v.fract() == 0.0 => {
                // i64::MIN is exact as a double; i64::MAX rounds up to 2^63.
                if *v >= -9.223372036854776e18 && *v < 9.223372036854776e18 {
                    Ok(*v as i64)
                } else {
                    Err(SqlError::not_representable(format!(
                        "column '{}': {v} out of range for i64",
                        self.column
                    )))
                }
            }
            Value::Text(s) => s.trim().parse().map_err(|_| self.unexpected("integer")),
            _ => Err(self.unexpected("integer")),
        }
    }

    fn narrow<T: TryFrom<i64>>(&self) -> Result<T> {
        let wide = self.integer()?;
        T::try_from(wide).map_err(|_| {
            SqlError::not_representable(format!(
                "column '{}': {wide} out of range for {}",
                self.column,
                std::any::type_name::<T>()
            ))
        })
    }

    fn real(&self) -> Result<f64> {
        match self.value {
            Value::Real(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Text(s) => s.trim().parse().map_err(|_| self.unexpected("real")),
            _ => Err(self.unexpected("real")),
        }
    }

    fn text(&self) -> Result<Cow<'de, str>> {
        match self.value {
            Value::Text(s) => Ok(Cow::Borrowed(s.as_str())),
            Value::Int(v) => Ok(Cow::Owned(v.to_string())),
            Value::Real(v) => Ok(Cow::Owned(v.to_string())),
            Value::Blob(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| self.unexpected("UTF-8 text")),
            Value::Null => Err(self.unexpected("text")),
        }
    }

    /// JSON reader over an opaque column.
    fn opaque(&self) -> Result<serde_json::Deserializer<serde_json::de::SliceRead<'de>>> {
        match self.value {
            Value::Text(s) => Ok(serde_json::Deserializer::from_slice(s.as_bytes())),
            Value::Blob(bytes) => Ok(serde_json::Deserializer::from_slice(bytes)),
            _ => Err(self.unexpected("JSON text")),
        }
    }
}

macro_rules! decode_int {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                visitor.$visit(self.narrow()?)
            }
        )*
    };
}

macro_rules! decode_opaque {
    ($($method:ident($($arg:ident: $ty:ty),*)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, $($arg: $ty,)* visitor: V) -> Result<V::Value> {
                let mut json = self.opaque()?;
                let value = (&mut json).$method($($arg,)* visitor)?;
                json.end()?;
                Ok(value)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for FieldDecoder<'de> {
    type Error = SqlError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Int(v) => visitor.visit_i64(*v),
            Value::Real(v) => visitor.visit_f64(*v),
            Value::Text(s) => visitor.visit_borrowed_str(s),
            Value::Blob(bytes) => visitor.visit_borrowed_bytes(bytes),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.integer()? != 0)
    }

    decode_int! {
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.real()? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.real()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let text = self.text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.unexpected("single character")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.text()? {
            Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
            Cow::Owned(s) => visitor.visit_string(s),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Blob(bytes) => visitor.visit_borrowed_bytes(bytes),
            Value::Text(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            _ => Err(self.unexpected("bytes")),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if let Value::Text(s) = self.value {
            if variants.contains(&s.as_str()) {
                let variant: StrDeserializer<'_, SqlError> = s.as_str().into_deserializer();
                return visitor.visit_enum(variant);
            }
        }
        let mut json = self.opaque()?;
        let value = (&mut json).deserialize_enum(name, variants, visitor)?;
        json.end()?;
        Ok(value)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    decode_opaque! {
        deserialize_unit(),
        deserialize_unit_struct(name: &'static str),
        deserialize_seq(),
        deserialize_tuple(len: usize),
        deserialize_tuple_struct(name: &'static str, len: usize),
        deserialize_map(),
        deserialize_struct(name: &'static str, fields: &'static [&'static str]),
    }
}
