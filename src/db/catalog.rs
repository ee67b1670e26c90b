//! Live-schema introspection through SQLite's catalog pragmas.

use serde::Deserialize;
use tracing::trace;

use crate::query::Value;
use crate::schema::{Column, ColumnType, Index, TableDefinition};
use crate::types::Result;

use super::Database;

/// Index created by an explicit `CREATE INDEX`, as opposed to ones backing
/// `UNIQUE` or `PRIMARY KEY` constraints.
const USER_INDEX_ORIGIN: &str = "c";

#[derive(Debug, Deserialize)]
struct ColumnInfo {
    name: String,
    #[serde(rename = "type")]
    declared: String,
    notnull: bool,
    pk: i64,
}

#[derive(Debug, Deserialize)]
struct IndexInfo {
    name: String,
    unique: bool,
    origin: String,
}

#[derive(Debug, Deserialize)]
struct IndexColumnInfo {
    seqno: i64,
    name: Option<String>,
}

/// Reconstructs the definition of `table`, or `None` when it does not exist.
pub(crate) fn introspect(db: &Database, table: &str) -> Result<Option<TableDefinition>> {
    let name = [Value::from(table)];
    let infos: Vec<ColumnInfo> = db.query(
        "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)",
        &name,
    )?;
    if infos.is_empty() {
        trace!(table, "table not found in catalog");
        return Ok(None);
    }

    let mut keyed: Vec<(i64, String)> = infos
        .iter()
        .filter(|info| info.pk > 0)
        .map(|info| (info.pk, info.name.clone()))
        .collect();
    keyed.sort_unstable();
    let primary_key: Vec<String> = keyed.into_iter().map(|(_, name)| name).collect();

    let columns: Vec<(String, Column)> = infos
        .into_iter()
        .map(|info| {
            let column_type = ColumnType::from_declared(&info.declared);
            (info.name, Column::new(column_type, !info.notnull))
        })
        .collect();

    let listed: Vec<IndexInfo> = db.query(
        "SELECT name, \"unique\", origin FROM pragma_index_list(?1)",
        &name,
    )?;
    let mut indexes = Vec::new();
    for info in listed.into_iter().filter(|info| info.origin == USER_INDEX_ORIGIN) {
        let mut parts: Vec<IndexColumnInfo> = db.query(
            "SELECT seqno, name FROM pragma_index_info(?1)",
            &[Value::from(info.name.as_str())],
        )?;
        parts.sort_unstable_by_key(|part| part.seqno);
        // Expression index terms have no column name and are skipped.
        let columns: Vec<String> = parts.into_iter().filter_map(|part| part.name).collect();
        let index = Index::new(info.name, columns);
        indexes.push(if info.unique { index.unique() } else { index });
    }

    trace!(table, columns = columns.len(), indexes = indexes.len(), "introspected table");
    TableDefinition::new(table, columns, primary_key, indexes).map(Some)
}
