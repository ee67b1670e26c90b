//! Statement text assembly.

use crate::codec::Row;
use crate::query::{Order, Predicate, Query, Value};

/// Quotes an identifier, doubling embedded quote characters.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Comma-separated quoted identifiers.
pub fn quote_list<I>(names: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| quote_ident(name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// SQL text plus its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    fn push_where(&mut self, predicate: Option<&Predicate>) {
        if let Some(predicate) = predicate {
            let (clause, params) = predicate.compile();
            self.sql.push_str(" WHERE ");
            self.sql.push_str(&clause);
            self.params.extend(params);
        }
    }

    /// `INSERT INTO table (cols) VALUES (?, ...)`.
    pub fn insert(table: &str, row: Row) -> Self {
        let (columns, params) = row.into_parts();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            quote_list(&columns),
            placeholders(params.len())
        );
        Self::new(sql, params)
    }

    /// `SELECT * FROM table` with the query's clauses.
    pub fn select(table: &str, query: &Query) -> Self {
        let mut statement = Self::new(format!("SELECT * FROM {}", quote_ident(table)), Vec::new());
        statement.push_where(query.predicate.as_ref());
        if !query.order.is_empty() {
            let terms: Vec<String> = query.order.iter().map(Order::clause).collect();
            statement.sql.push_str(" ORDER BY ");
            statement.sql.push_str(&terms.join(", "));
        }
        if query.limit > 0 {
            statement.sql.push_str(&format!(" LIMIT {}", query.limit));
            if query.offset > 0 {
                statement.sql.push_str(&format!(" OFFSET {}", query.offset));
            }
        }
        statement
    }

    /// `UPDATE table SET col = ?, ...`; set parameters precede predicate ones.
    /// `None` when `set` is empty.
    pub fn update(table: &str, set: Row, predicate: Option<&Predicate>) -> Option<Self> {
        if set.is_empty() {
            return None;
        }
        let (columns, params) = set.into_parts();
        let assignments: Vec<String> = columns
            .iter()
            .map(|column| format!("{} = ?", quote_ident(column)))
            .collect();
        let mut statement = Self::new(
            format!("UPDATE {} SET {}", quote_ident(table), assignments.join(", ")),
            params,
        );
        statement.push_where(predicate);
        Some(statement)
    }

    /// `DELETE FROM table [WHERE ...]`.
    pub fn delete(table: &str, predicate: Option<&Predicate>) -> Self {
        let mut statement = Self::new(format!("DELETE FROM {}", quote_ident(table)), Vec::new());
        statement.push_where(predicate);
        statement
    }
}
