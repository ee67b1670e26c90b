#![forbid(unsafe_code)]

//! Shared error taxonomy.

use std::fmt;

use thiserror::Error;

/// Errors surfaced by schema inference, the row codec and the execution engine.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Failure reported by SQLite, carried verbatim with its extended result code.
    #[error("sqlite error {code}: {message}")]
    Engine {
        /// Extended SQLite result code.
        code: i32,
        /// Engine-provided message.
        message: String,
    },
    /// Declared key or index fields that the record never reports.
    #[error("invalid columns: {}", .0.join(", "))]
    InvalidColumns(Vec<String>),
    /// Schema probe reached a field type it cannot shape without a registered placeholder.
    #[error("missing placeholder for field type {0}")]
    MissingPlaceholder(&'static str),
    /// Decode requested a column the row does not carry.
    #[error("column '{0}' not found in row")]
    ColumnNotFound(String),
    /// Whole-record update/delete on a type without a primary key.
    #[error("{0} declares no primary key")]
    NoPrimaryKey(String),
    /// Value cannot be expressed as a row or column.
    #[error("not representable: {0}")]
    NotRepresentable(String),
    /// Live table differs from the definition inferred for its record type.
    #[error("table '{table}' does not match its record definition")]
    SchemaMismatch {
        /// Table name.
        table: String,
    },
    /// Opaque column could not be encoded or decoded as JSON.
    #[error("opaque column codec: {0}")]
    Json(#[from] serde_json::Error),
    /// Custom error raised by a type's serde implementation.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SqlError>;

impl SqlError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            SqlError::Engine { .. } => "EngineError",
            SqlError::InvalidColumns(_) => "InvalidColumns",
            SqlError::MissingPlaceholder(_) => "MissingPlaceholder",
            SqlError::ColumnNotFound(_) => "ColumnNotFound",
            SqlError::NoPrimaryKey(_) => "NoPrimaryKey",
            SqlError::NotRepresentable(_) => "NotRepresentable",
            SqlError::SchemaMismatch { .. } => "SchemaMismatch",
            SqlError::Json(_) => "Json",
            SqlError::Serialization(_) => "Serialization",
        }
    }

    pub(crate) fn not_representable(msg: impl Into<String>) -> Self {
        SqlError::NotRepresentable(msg.into())
    }
}

impl From<rusqlite::Error> for SqlError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(inner, message) => SqlError::Engine {
                code: inner.extended_code,
                message: message.unwrap_or_else(|| inner.to_string()),
            },
            other => SqlError::Engine {
                code: rusqlite::ffi::SQLITE_ERROR,
                message: other.to_string(),
            },
        }
    }
}

impl serde::ser::Error for SqlError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SqlError::Serialization(msg.to_string())
    }
}

impl serde::de::Error for SqlError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SqlError::Serialization(msg.to_string())
    }
}

/// Convenience wrapper that formats errors with their codes.
pub struct SqlErrorWithCode<'a>(pub &'a SqlError);

impl fmt::Display for SqlErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}
