#![forbid(unsafe_code)]

//! Bound values, WHERE/ORDER BY expressions and statement assembly.

/// Select builder.
pub mod builder;

/// ORDER BY terms.
pub mod order;

/// WHERE expression tree and its compiler.
pub mod predicate;

/// Identifier quoting and statement text.
pub mod sql;

/// Storage-class values bound to statements.
pub mod value;

pub use builder::Query;
pub use order::Order;
pub use predicate::{Operator, Predicate};
pub use sql::Statement;
pub use value::Value;
