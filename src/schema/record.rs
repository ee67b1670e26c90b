use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::schema::Index;

/// A serde struct persisted one-to-one as a table row.
///
/// The serde derive is the field declaration: the schema probe, the row
/// encoder and the row decoder all walk the same field list, so the table
/// definition and the codec cannot drift apart.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Person {
///     id: u32,
///     name: Option<String>,
/// }
///
/// impl Record for Person {
///     fn primary_key() -> &'static [&'static str] {
///         &["id"]
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Table backing this record. Defaults to the unqualified type name.
    fn table_name() -> String {
        short_type_name::<Self>()
    }

    /// Primary-key field names in key order. Empty means whole-row
    /// identity operations (`update`, `delete` of a record) are unavailable.
    fn primary_key() -> &'static [&'static str] {
        &[]
    }

    /// Secondary indexes created alongside the table.
    fn indexes() -> Vec<Index> {
        Vec::new()
    }
}

/// Unqualified type name with generic arguments stripped.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split_once('<').map_or(full, |(head, _)| head);
    base.rsplit("::").next().unwrap_or(base).to_owned()
}
