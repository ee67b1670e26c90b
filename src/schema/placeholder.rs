//! Process-wide placeholder registry.
//!
//! Some field types cannot be shaped by the schema probe alone: their
//! `Deserialize` impl rejects the probe's dummy values (validated newtypes,
//! `try_from` conversions) or asks for self-describing input
//! (`deserialize_any`, untagged enums). Registering one representative value
//! per such type lets the probe record its column and hand the parent a
//! valid instance.
//!
//! Entries are keyed by [`std::any::type_name`], stored in their encoded
//! [`Value`] form and never removed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{trace, warn};

use crate::query::Value;
use crate::schema::ColumnType;
use crate::types::{Result, SqlError};
use crate::walker::encode_field;

const OPTION_PREFIX: &str = "core::option::Option<";

/// Registered sample in encoded form.
#[derive(Debug)]
pub(crate) struct Placeholder {
    pub(crate) column: ColumnType,
    pub(crate) value: Value,
}

type Registry = RwLock<HashMap<&'static str, &'static Placeholder>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers `sample` as the placeholder for its type.
///
/// Returns `Ok(false)` when the type already has a placeholder; the existing
/// entry is kept. Register before the first probe of any record that needs
/// it.
pub fn register<T: Serialize>(sample: T) -> Result<bool> {
    let key = std::any::type_name::<T>();
    if registry().read().contains_key(key) {
        warn!(type_name = key, "placeholder already registered; ignoring");
        return Ok(false);
    }
    let value = encode_field(&sample)?;
    let column = value.column_type().ok_or_else(|| {
        SqlError::not_representable(format!("placeholder for {key} encodes as NULL"))
    })?;
    let mut map = registry().write();
    match map.entry(key) {
        Entry::Occupied(_) => Ok(false),
        Entry::Vacant(slot) => {
            trace!(type_name = key, column = %column, "registered placeholder");
            slot.insert(Box::leak(Box::new(Placeholder { column, value })));
            Ok(true)
        }
    }
}

/// Returns true when a placeholder exists for `T`.
pub fn is_registered<T: ?Sized>() -> bool {
    registry()
        .read()
        .contains_key(std::any::type_name::<T>())
}

pub(crate) fn lookup(key: &str) -> Option<&'static Placeholder> {
    registry().read().get(key).copied()
}

/// Strips `Option<..>` wrappers from a field's type name, reporting whether
/// any were present.
pub(crate) fn field_key(type_name: &'static str) -> (&'static str, bool) {
    let mut key = type_name;
    let mut optional = false;
    while let Some(inner) = key
        .strip_prefix(OPTION_PREFIX)
        .and_then(|rest| rest.strip_suffix('>'))
    {
        key = inner;
        optional = true;
    }
    (key, optional)
}
