//! Schema-probe walk.
//!
//! Drives a record's `Deserialize` impl with dummy values while noting the
//! storage class each field asks for. Nested structures are still walked so
//! the parent receives a well-formed value, but only the top-level field
//! gets a column.

use serde::de::{DeserializeOwned, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::Deserializer;
use tracing::trace;

use crate::schema::placeholder;
use crate::schema::{Column, ColumnType};
use crate::types::{Result, SqlError};

use super::decode::FieldDecoder;
use super::name_deserializer;

const PROBE_TEXT: &str = "probe";
const PLACEHOLDER_COLUMN: &str = "placeholder";

/// Probes `T`, returning its columns in field declaration order.
pub(crate) fn probe_columns<T: DeserializeOwned>() -> Result<Vec<(String, Column)>> {
    let mut columns = Vec::new();
    T::deserialize(RecordProbe {
        columns: &mut columns,
    })?;
    Ok(columns)
}

/// Probes one value, preferring a registered placeholder for its type.
fn probe_seed<'de, S: DeserializeSeed<'de>>(seed: S) -> Result<(S::Value, Column)> {
    let (key, optional) = placeholder::field_key(std::any::type_name::<S::Value>());
    if let Some(sample) = placeholder::lookup(key) {
        trace!(type_name = key, "probe resolved from placeholder");
        let value = seed.deserialize(FieldDecoder::new(PLACEHOLDER_COLUMN, &sample.value))?;
        return Ok((value, Column::new(sample.column, optional)));
    }
    let mut probe = FieldProbe::default();
    match seed.deserialize(&mut probe) {
        Ok(value) => match probe.column_type {
            Some(column_type) => Ok((value, Column::new(column_type, probe.nullable))),
            None => Err(SqlError::MissingPlaceholder(key)),
        },
        Err(err @ SqlError::MissingPlaceholder(_)) => Err(err),
        Err(err) => {
            trace!(type_name = key, error = %err, "probe could not shape field");
            Err(SqlError::MissingPlaceholder(key))
        }
    }
}

struct RecordProbe<'a> {
    columns: &'a mut Vec<(String, Column)>,
}

impl<'de, 'a> Deserializer<'de> for RecordProbe<'a> {
    type Error = SqlError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(SqlError::not_representable(
            "records must deserialize as structs with named fields",
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_map(ProbeFields {
            fields,
            next: 0,
            columns: Some(self.columns),
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Yields every declared field once; records columns only at the top level.
struct ProbeFields<'a> {
    fields: &'static [&'static str],
    next: usize,
    columns: Option<&'a mut Vec<(String, Column)>>,
}

impl<'a> ProbeFields<'a> {
    fn nested(fields: &'static [&'static str]) -> Self {
        Self {
            fields,
            next: 0,
            columns: None,
        }
    }
}

impl<'de, 'a> MapAccess<'de> for ProbeFields<'a> {
    type Error = SqlError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.fields.get(self.next) {
            Some(&name) => seed.deserialize(name_deserializer(name)).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let name = self
            .fields
            .get(self.next)
            .copied()
            .ok_or_else(|| SqlError::Serialization("value requested past last field".into()))?;
        self.next += 1;
        let (value, column) = probe_seed(seed)?;
        if let Some(columns) = self.columns.as_deref_mut() {
            columns.push((name.to_owned(), column));
        }
        Ok(value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len() - self.next)
    }
}

/// Fixed-length sequence of probed elements.
struct ProbeSeq {
    remaining: usize,
}

impl<'de> SeqAccess<'de> for ProbeSeq {
    type Error = SqlError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        probe_seed(seed).map(|(value, _)| Some(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Selects the first declared variant of an enum.
struct ProbeVariant {
    name: &'static str,
}

impl<'de> EnumAccess<'de> for ProbeVariant {
    type Error = SqlError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let variant = seed.deserialize(name_deserializer(self.name))?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for ProbeVariant {
    type Error = SqlError;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        probe_seed(seed).map(|(value, _)| value)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(ProbeSeq { remaining: len })
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_map(ProbeFields::nested(fields))
    }
}

/// Per-field probe state.
#[derive(Default)]
struct FieldProbe {
    column_type: Option<ColumnType>,
    nullable: bool,
}

impl FieldProbe {
    fn shape(&mut self, column_type: ColumnType) {
        self.column_type = Some(column_type);
    }
}

macro_rules! probe_int {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                self.shape(ColumnType::Int);
                visitor.$visit(1)
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for &'a mut FieldProbe {
    type Error = SqlError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(SqlError::Serialization(
            "self-describing field cannot be probed".into(),
        ))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Int);
        visitor.visit_bool(true)
    }

    probe_int! {
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
        self.shape(ColumnType::Real);
        visitor.visit_f32(1.0)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Real);
        visitor.visit_f64(1.0)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_char('x')
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_str(PROBE_TEXT)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Blob);
        visitor.visit_bytes(&[])
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        // Ask for the inner value too so its storage class is captured.
        self.nullable = true;
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_seq(ProbeSeq { remaining: 0 })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_seq(ProbeSeq { remaining: len })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_map(ProbeFields::nested(&[]))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        visitor.visit_map(ProbeFields::nested(fields))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.shape(ColumnType::Text);
        let first = variants
            .first()
            .copied()
            .ok_or_else(|| SqlError::not_representable(format!("enum {name} has no variants")))?;
        visitor.visit_enum(ProbeVariant { name: first })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(PROBE_TEXT)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}
