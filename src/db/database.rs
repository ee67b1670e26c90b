use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, Statement as Prepared};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{self, Row};
use crate::query::{Predicate, Query, Statement, Value};
use crate::schema::{Record, TableDefinition};
use crate::types::{Result, SqlError, SqlErrorWithCode};

use super::catalog;
use super::OpenOptions;

const MEMORY_PATH: &str = ":memory:";

/// Execution engine owning a single SQLite connection.
///
/// The connection is opened lazily by the first operation and serialized
/// behind a mutex, so a `Database` can be shared across threads. Statements
/// are never wrapped in transactions here.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    options: OpenOptions,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Engine over the database file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, OpenOptions::default())
    }

    /// Engine over `path` with explicit options.
    pub fn with_options(path: impl AsRef<Path>, options: OpenOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            conn: Mutex::new(None),
        }
    }

    /// Engine over a private in-memory database. Its contents are lost when
    /// the connection closes.
    pub fn in_memory() -> Self {
        Self::open(MEMORY_PATH)
    }

    /// Location this engine opens.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options applied at connect time.
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// Opens the connection if it is not open yet.
    pub fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.open_connection()?);
        }
        Ok(())
    }

    /// Closes the connection; the next operation reopens it.
    pub fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, err)| SqlError::from(err))?;
        debug!(path = %self.path.display(), "closed connection");
        Ok(())
    }

    /// True while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    fn open_connection(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(&self.path, self.options.flags())?;
        if let Some(timeout) = self.options.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if let Some(mode) = self.options.journal_mode {
            // journal_mode reports the resulting mode as a row.
            let applied: String =
                conn.pragma_update_and_check(None, "journal_mode", mode.as_str(), |row| row.get(0))?;
            debug!(requested = %mode, applied = %applied, "journal mode");
        }
        if let Some(level) = self.options.synchronous {
            conn.pragma_update(None, "synchronous", level.as_str())?;
        }
        debug!(path = %self.path.display(), read_only = self.options.read_only, "opened connection");
        Ok(conn)
    }

    fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            *guard = Some(self.open_connection()?);
        }
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(SqlError::Engine {
                code: rusqlite::ffi::SQLITE_MISUSE,
                message: "connection unavailable".into(),
            }),
        }
    }

    /// Runs a statement to completion, returning the number of rows it
    /// inserted, updated or deleted.
    ///
    /// Rows written by triggers or foreign-key actions are not counted.
    /// Statements that modify nothing, DDL and queries included, report 0.
    pub fn exec(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.with_connection(|conn| {
            debug!(sql, params = params.len(), "exec");
            let before = total_changes(conn)?;
            {
                let mut stmt = prepare(conn, sql, params)?;
                let mut rows = stmt.raw_query();
                while rows.next()?.is_some() {}
            }
            // changes() keeps the last DML count, so only trust it when the
            // running total moved.
            if total_changes(conn)? == before {
                Ok(0)
            } else {
                Ok(conn.changes())
            }
        })
        .inspect_err(|err| debug!(sql, error = %SqlErrorWithCode(err), "exec failed"))
    }

    /// Runs a query and decodes every result row into `T`.
    ///
    /// Either all rows are returned or the call fails.
    pub fn query<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        self.with_connection(|conn| {
            debug!(sql, params = params.len(), "query");
            let mut stmt = prepare(conn, sql, params)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
            let mut rows = stmt.raw_query();
            let mut records = Vec::new();
            while let Some(raw) = rows.next()? {
                let mut row = Row::new();
                for (idx, name) in names.iter().enumerate() {
                    row.set(name, Value::from(raw.get_ref(idx)?));
                }
                records.push(codec::decode(&row)?);
            }
            Ok(records)
        })
        .inspect_err(|err| debug!(sql, error = %SqlErrorWithCode(err), "query failed"))
    }

    fn run(&self, statement: Statement) -> Result<u64> {
        self.exec(&statement.sql, &statement.params)
    }

    /// Creates the table and its indexes, returning rows affected.
    pub fn create(&self, table: &TableDefinition) -> Result<u64> {
        let mut affected = self.exec(&table.create_table_sql(), &[])?;
        for sql in table.create_index_sql() {
            affected += self.exec(&sql, &[])?;
        }
        Ok(affected)
    }

    /// Reads the live definition of `table`, `None` when it does not exist.
    pub fn introspect(&self, table: &str) -> Result<Option<TableDefinition>> {
        catalog::introspect(self, table)
    }

    /// Live definition of `T`'s table.
    pub fn table<T: Record>(&self) -> Result<Option<TableDefinition>> {
        self.introspect(&T::table_name())
    }

    /// Creates `T`'s table unless it already exists.
    ///
    /// Returns `true` when the table was created. An existing table that
    /// differs from `T`'s definition fails with
    /// [`SqlError::SchemaMismatch`].
    pub fn ensure<T: Record>(&self) -> Result<bool> {
        let expected = TableDefinition::build::<T>()?;
        match self.introspect(expected.name())? {
            None => {
                self.create(&expected)?;
                Ok(true)
            }
            Some(live) if live == expected => Ok(false),
            Some(_) => Err(SqlError::SchemaMismatch {
                table: expected.name().to_owned(),
            }),
        }
    }

    /// Inserts one record.
    pub fn insert<T: Record>(&self, record: &T) -> Result<u64> {
        let table = TableDefinition::build::<T>()?;
        let row = codec::encode_with(&table, record)?;
        self.run(Statement::insert(table.name(), row))
    }

    /// Selects the records matching `query`.
    pub fn select<T: Record>(&self, query: &Query) -> Result<Vec<T>> {
        let table = TableDefinition::build::<T>()?;
        validate(&table, query.columns())?;
        let statement = Statement::select(table.name(), query);
        self.query(&statement.sql, &statement.params)
    }

    /// Sets columns on every row matching `predicate`.
    ///
    /// An empty `set` issues no statement and returns zero.
    pub fn update_where<T: Record>(&self, set: Row, predicate: Option<&Predicate>) -> Result<u64> {
        if set.is_empty() {
            return Ok(0);
        }
        let table = TableDefinition::build::<T>()?;
        validate(
            &table,
            set.names()
                .chain(predicate.into_iter().flat_map(Predicate::columns)),
        )?;
        match Statement::update(table.name(), set, predicate) {
            Some(statement) => self.run(statement),
            None => Ok(0),
        }
    }

    /// Writes every non-key field of `record` to the row with its key.
    pub fn update<T: Record>(&self, record: &T) -> Result<u64> {
        let table = TableDefinition::build::<T>()?;
        let mut set = codec::encode_with(&table, record)?;
        let key = key_predicate(&table, |column| set.remove(column))?;
        self.update_where::<T>(set, Some(&key))
    }

    /// Deletes every row matching `predicate`, or all rows when `None`.
    pub fn delete_where<T: Record>(&self, predicate: Option<&Predicate>) -> Result<u64> {
        let table = TableDefinition::build::<T>()?;
        validate(&table, predicate.into_iter().flat_map(Predicate::columns))?;
        self.run(Statement::delete(table.name(), predicate))
    }

    /// Deletes the row whose key matches `record`'s.
    pub fn delete<T: Record>(&self, record: &T) -> Result<u64> {
        let table = TableDefinition::build::<T>()?;
        let row = codec::encode_with(&table, record)?;
        let key = key_predicate(&table, |column| row.get(column).cloned())?;
        self.delete_where::<T>(Some(&key))
    }
}

fn prepare<'c>(conn: &'c Connection, sql: &str, params: &[Value]) -> Result<Prepared<'c>> {
    let mut stmt = conn.prepare(sql)?;
    let expected = stmt.parameter_count();
    if expected != params.len() {
        return Err(rusqlite::Error::InvalidParameterCount(params.len(), expected).into());
    }
    for (idx, value) in params.iter().enumerate() {
        stmt.raw_bind_parameter(idx + 1, value)?;
    }
    Ok(stmt)
}

fn total_changes(conn: &Connection) -> Result<u64> {
    let total: i64 = conn.query_row("SELECT total_changes()", [], |row| row.get(0))?;
    Ok(u64::try_from(total).unwrap_or_default())
}

fn validate<'a>(table: &TableDefinition, columns: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let unknown = table.unknown_columns(columns);
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(SqlError::InvalidColumns(unknown))
    }
}

/// Conjunction over the primary key: equality for present values, `IS NULL`
/// for null or missing ones.
fn key_predicate(
    table: &TableDefinition,
    mut value_of: impl FnMut(&str) -> Option<Value>,
) -> Result<Predicate> {
    let terms = table.primary_key().iter().map(|column| match value_of(column) {
        Some(value) if !value.is_null() => Predicate::eq(column.as_str(), value),
        _ => Predicate::is_null(column.as_str()),
    });
    Predicate::all(terms)
        .ok_or_else(|| SqlError::NoPrimaryKey(table.name().to_owned()))
}
