//! Fluent select builder.

use crate::query::{Order, Predicate};

/// Filter, ordering and paging for a `select`.
///
/// A `limit` of zero means unlimited; `offset` only applies when a limit is
/// set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// WHERE expression.
    pub predicate: Option<Predicate>,
    /// ORDER BY terms, applied in order.
    pub order: Vec<Order>,
    /// Maximum rows returned; zero for no limit.
    pub limit: u64,
    /// Rows skipped before the first returned row.
    pub offset: u64,
}

impl Query {
    /// Creates a query selecting every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WHERE expression, AND-ing it onto any existing one.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Appends an ORDER BY term.
    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Limits the number of rows returned.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Skips rows before the first returned one.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Columns named by the filter and ordering.
    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.predicate
            .iter()
            .flat_map(Predicate::columns)
            .chain(self.order.iter().map(Order::column))
    }
}
