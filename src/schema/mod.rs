//! Schema model and registry
//!
//! A feature type declares its relational shape once, at startup, through
//! the [`Record`] trait and a [`TableBuilder`]. The resulting
//! [`TableDescriptor`] is registered into a [`SchemaRegistry`], which wires
//! parent/child links and computes the dependency orderings used for table
//! creation (parent-first) and deletion (child-first).
//!
//! Descriptors are immutable after registration. The registry is an
//! explicit object owned by the orchestrator - there is no global state,
//! so independent databases (and tests) never share schema.

pub mod column;
pub mod registry;
pub mod table;

pub use column::{ColumnDescriptor, ColumnRole};
pub use registry::SchemaRegistry;
pub use table::row;
pub use table::{ForeignKey, Record, RelationKind, TableBuilder, TableDescriptor};
