#![forbid(unsafe_code)]

//! Table definitions inferred from record types.

mod column;
mod index;
pub mod placeholder;
mod record;
mod table;

pub use column::{Column, ColumnType};
pub use index::Index;
pub use placeholder::register;
pub use record::Record;
pub use table::TableDefinition;
