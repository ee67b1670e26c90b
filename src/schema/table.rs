use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::query::sql::{quote_ident, quote_list};
use crate::schema::{Column, Index, Record};
use crate::types::{Result, SqlError};
use crate::walker::probe_columns;

/// Immutable description of a table: columns, primary key and indexes.
///
/// Construction validates that every key and index column exists. Equality
/// ignores primary-key and index declaration order but not the column order
/// inside an index.
#[derive(Clone, Debug)]
pub struct TableDefinition {
    name: String,
    columns: BTreeMap<String, Column>,
    primary_key: Vec<String>,
    indexes: Vec<Index>,
}

impl TableDefinition {
    /// Builds a definition from parts, rejecting key or index columns that
    /// are not among `columns`.
    pub fn new<C, K>(
        name: impl Into<String>,
        columns: C,
        primary_key: K,
        mut indexes: Vec<Index>,
    ) -> Result<Self>
    where
        C: IntoIterator<Item = (String, Column)>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let columns: BTreeMap<String, Column> = columns.into_iter().collect();
        let primary_key: Vec<String> = primary_key.into_iter().map(Into::into).collect();
        let invalid: BTreeSet<&str> = primary_key
            .iter()
            .chain(indexes.iter().flat_map(|index| index.columns.iter()))
            .map(String::as_str)
            .filter(|name| !columns.contains_key(*name))
            .collect();
        if !invalid.is_empty() {
            return Err(SqlError::InvalidColumns(
                invalid.into_iter().map(str::to_owned).collect(),
            ));
        }
        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            name: name.into(),
            columns,
            primary_key,
            indexes,
        })
    }

    /// Infers the definition of `T` by probing its fields.
    pub fn build<T: Record>() -> Result<Self> {
        let name = T::table_name();
        let columns = probe_columns::<T>()?;
        trace!(table = %name, columns = columns.len(), "probed record schema");
        Self::new(
            name,
            columns,
            T::primary_key().iter().copied(),
            T::indexes(),
        )
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns keyed by name.
    pub fn columns(&self) -> &BTreeMap<String, Column> {
        &self.columns
    }

    /// Looks up a single column.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Primary-key columns in key order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Indexes sorted by name.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Names of nullable columns.
    pub fn nullable_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, column)| column.nullable)
            .map(|(name, _)| name.as_str())
    }

    /// Sorted, de-duplicated subset of `names` that are not columns here.
    pub fn unknown_columns<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unknown: BTreeSet<&str> = names
            .into_iter()
            .filter(|name| !self.columns.contains_key(*name))
            .collect();
        unknown.into_iter().map(str::to_owned).collect()
    }

    /// `CREATE TABLE` text: column definitions sorted by name, then the
    /// primary-key clause when one is declared.
    pub fn create_table_sql(&self) -> String {
        let mut definitions: Vec<String> = self
            .columns
            .iter()
            .map(|(name, column)| format!("{} {}", quote_ident(name), column.definition()))
            .collect();
        if !self.primary_key.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", quote_list(&self.primary_key)));
        }
        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.name),
            definitions.join(", ")
        )
    }

    /// One `CREATE [UNIQUE] INDEX` statement per index, in name order.
    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE {}INDEX {} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    quote_ident(&index.name),
                    quote_ident(&self.name),
                    quote_list(&index.columns)
                )
            })
            .collect()
    }

    fn sorted_key(&self) -> Vec<&str> {
        let mut key: Vec<&str> = self.primary_key.iter().map(String::as_str).collect();
        key.sort_unstable();
        key
    }
}

impl PartialEq for TableDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.indexes == other.indexes
            && self.sorted_key() == other.sorted_key()
    }
}

impl Eq for TableDefinition {}
