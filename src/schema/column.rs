use std::fmt;

/// Storage class a column is declared with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ColumnType {
    /// Raw bytes.
    Blob,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Real,
    /// UTF-8 text.
    Text,
}

impl ColumnType {
    /// SQL affinity keyword used in `CREATE TABLE`.
    pub const fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Blob => "BLOB",
            ColumnType::Int => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Resolves a declared column type the way SQLite assigns affinity.
    /// NUMERIC affinity has no counterpart here and maps to `Real`.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("INT") {
            ColumnType::Int
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| declared.contains(t)) {
            ColumnType::Text
        } else if declared.is_empty() || declared.contains("BLOB") {
            ColumnType::Blob
        } else {
            ColumnType::Real
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Column shape discovered by the schema probe or read back from the catalog.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Column {
    /// Declared storage class.
    pub column_type: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl Column {
    /// Builds a column description.
    pub const fn new(column_type: ColumnType, nullable: bool) -> Self {
        Self {
            column_type,
            nullable,
        }
    }

    /// Column definition fragment following the quoted name.
    pub(crate) fn definition(&self) -> String {
        let null = if self.nullable { "NULL" } else { "NOT NULL" };
        format!("{} {null}", self.column_type)
    }
}
