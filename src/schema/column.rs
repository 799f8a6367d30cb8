//! Column descriptors

use crate::value::ValueType;

/// Role a column plays inside its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnRole {
    /// Plain data column
    #[default]
    Data,

    /// Primary key column (exactly one per table)
    Primary,

    /// Foreign key column linking to the parent table (at most one)
    Foreign,
}

/// One declared column of a table
///
/// Owned exclusively by its [`TableDescriptor`](super::TableDescriptor);
/// built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as it appears in SQL
    pub name: String,

    /// Declared semantic type
    pub value_type: ValueType,

    /// Primary/foreign/data role
    pub role: ColumnRole,
}

impl ColumnDescriptor {
    /// Create a plain data column
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            role: ColumnRole::Data,
        }
    }

    /// Whether this is the primary key column
    pub fn is_primary(&self) -> bool {
        self.role == ColumnRole::Primary
    }

    /// Whether this is the foreign key column
    pub fn is_foreign(&self) -> bool {
        self.role == ColumnRole::Foreign
    }
}
