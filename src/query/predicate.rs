//! WHERE expressions and their compilation to parameterized SQL.

use std::fmt;

use crate::query::sql::quote_ident;
use crate::query::Value;

/// Binary comparison operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `LIKE`
    Like,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<>`
    Ne,
}

impl Operator {
    /// SQL spelling of the operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Le => "<=",
            Operator::Lt => "<",
            Operator::Like => "LIKE",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Ne => "<>",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Immutable WHERE expression tree.
///
/// Conjunctions and disjunctions compile without parentheses, so mixed
/// `AND`/`OR` trees follow SQLite's operator precedence rather than the
/// tree shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `L AND R`
    And(Box<Predicate>, Box<Predicate>),
    /// `L OR R`
    Or(Box<Predicate>, Box<Predicate>),
    /// `NOT E`
    Not(Box<Predicate>),
    /// `col IS NULL`
    IsNull(String),
    /// `col IN (?, ...)`, one parameter per value.
    In(String, Vec<Value>),
    /// `col <op> ?`
    Compare(String, Operator, Value),
}

impl Predicate {
    /// `column <op> value`.
    pub fn compare(column: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Predicate::Compare(column.into(), op, value.into())
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Eq, value)
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Predicate::IsNull(column.into())
    }

    /// `column IN (values...)`.
    pub fn is_in<I>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Predicate::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// `self AND other`.
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`.
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`.
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Left-folds `predicates` into an `AND` chain; `None` when empty.
    pub fn all<I: IntoIterator<Item = Predicate>>(predicates: I) -> Option<Self> {
        predicates.into_iter().reduce(Predicate::and)
    }

    /// Compiles to SQL text and positional parameters in placeholder order.
    pub fn compile(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write(&mut sql, &mut params);
        (sql, params)
    }

    fn write(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::And(left, right) => {
                left.write(sql, params);
                sql.push_str(" AND ");
                right.write(sql, params);
            }
            Predicate::Or(left, right) => {
                left.write(sql, params);
                sql.push_str(" OR ");
                right.write(sql, params);
            }
            Predicate::Not(inner) => {
                sql.push_str("NOT ");
                inner.write(sql, params);
            }
            Predicate::IsNull(column) => {
                sql.push_str(&quote_ident(column));
                sql.push_str(" IS NULL");
            }
            Predicate::In(column, values) => {
                let marks = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{} IN ({marks})", quote_ident(column)));
                params.extend(values.iter().cloned());
            }
            Predicate::Compare(column, op, value) => {
                sql.push_str(&format!("{} {op} ?", quote_ident(column)));
                params.push(value.clone());
            }
        }
    }

    /// Every column referenced by the expression, in tree order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
            Predicate::IsNull(column)
            | Predicate::In(column, _)
            | Predicate::Compare(column, _, _) => out.push(column),
        }
    }
}
