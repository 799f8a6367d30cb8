//! Composable query and sort model
//!
//! Filters are immutable expression trees built from per-operator
//! constructors and combined with [`Filter::and`] / [`Filter::or`]. The SQL
//! layer translates a tree into predicate text at call time; nothing here
//! touches storage.

pub mod filter;
pub mod sort;

pub use filter::{CompareOp, Comparison, Filter};
pub use sort::{Sort, SortDirection};
