use crate::query::sql::quote_ident;

/// One ORDER BY term.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Order {
    /// `col ASC`
    Ascending(String),
    /// `col DESC`
    Descending(String),
}

impl Order {
    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Order::Ascending(column.into())
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Order::Descending(column.into())
    }

    /// Column this term sorts by.
    pub fn column(&self) -> &str {
        match self {
            Order::Ascending(column) | Order::Descending(column) => column,
        }
    }

    pub(crate) fn clause(&self) -> String {
        match self {
            Order::Ascending(column) => format!("{} ASC", quote_ident(column)),
            Order::Descending(column) => format!("{} DESC", quote_ident(column)),
        }
    }
}
