//! Table descriptors and the `Record` declaration trait
//!
//! The original data model marked classes and fields with annotations and
//! derived the schema reflectively at runtime. Here a feature type declares
//! its shape once through [`TableBuilder`], validated at build time, so a
//! mis-declared type fails at registration instead of mid-ingest.

use super::column::{ColumnDescriptor, ColumnRole};
use crate::error::{SchemaError, SchemaResult};
use crate::value::{RowMap, Value, ValueType};

/// Direction of a parent/child relation
///
/// Decides join and cascade direction: a `BelongsTo` child is joined and
/// cascade-deleted through its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The parent owns this row (cascade delete applies)
    Owns,

    /// This row belongs to its parent (joins walk upward through this link)
    BelongsTo,
}

/// A table's single foreign key link to its parent table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Name of the foreign key column in the child table
    pub column: String,

    /// Name of the parent table
    pub parent_table: String,

    /// Relation direction
    pub relation: RelationKind,
}

/// The relational shape of one feature type
///
/// Built once per type via [`TableBuilder`], registered into the
/// [`SchemaRegistry`](super::SchemaRegistry), immutable thereafter.
/// Invariants: exactly one primary key; at most one foreign key
/// (single-parent model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,

    /// Columns in declaration order: primary key first, foreign key (if
    /// any) second, remaining columns after
    pub columns: Vec<ColumnDescriptor>,

    /// Name of the primary key column
    pub primary_key: String,

    /// Foreign key link, if this table has a parent
    pub foreign_key: Option<ForeignKey>,

    /// Names of tables whose foreign key points here (wired by the registry)
    pub children: Vec<String>,
}

impl TableDescriptor {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Builder for [`TableDescriptor`]
///
/// A later `primary_key` call demotes an earlier one to a plain data
/// column (last declaration wins). A second foreign key is an error.
#[derive(Debug, Default)]
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDescriptor>,
    foreign_key: Option<ForeignKey>,
    duplicate_foreign: bool,
}

impl TableBuilder {
    /// Start a table declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare the primary key column
    pub fn primary_key(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        for col in &mut self.columns {
            if col.role == ColumnRole::Primary {
                col.role = ColumnRole::Data;
            }
        }
        self.columns.push(ColumnDescriptor {
            name: name.into(),
            value_type,
            role: ColumnRole::Primary,
        });
        self
    }

    /// Declare the foreign key column and its parent table
    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        parent_table: impl Into<String>,
        relation: RelationKind,
    ) -> Self {
        let name = name.into();
        if self.foreign_key.is_some() {
            self.duplicate_foreign = true;
            return self;
        }
        self.foreign_key = Some(ForeignKey {
            column: name.clone(),
            parent_table: parent_table.into(),
            relation,
        });
        self.columns.push(ColumnDescriptor {
            name,
            value_type,
            role: ColumnRole::Foreign,
        });
        self
    }

    /// Declare a `BelongsTo` foreign key (the common case)
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        value_type: ValueType,
        parent_table: impl Into<String>,
    ) -> Self {
        self.foreign_key(name, value_type, parent_table, RelationKind::BelongsTo)
    }

    /// Declare a plain data column
    pub fn column(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.columns.push(ColumnDescriptor::new(name, value_type));
        self
    }

    /// Validate and produce the descriptor
    ///
    /// Column order is normalized to primary key, foreign key, remaining
    /// columns - the order the SQL layer emits them in.
    pub fn build(self) -> SchemaResult<TableDescriptor> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTableName);
        }

        if self.duplicate_foreign {
            return Err(SchemaError::MultipleForeignKeys { table: self.name });
        }

        let primary_key = self
            .columns
            .iter()
            .find(|c| c.is_primary())
            .map(|c| c.name.clone())
            .ok_or_else(|| SchemaError::MissingPrimaryKey {
                table: self.name.clone(),
            })?;

        let mut columns = Vec::with_capacity(self.columns.len());
        let mut rest = Vec::new();
        let mut foreign_col = None;
        for col in self.columns {
            match col.role {
                ColumnRole::Primary => columns.push(col),
                ColumnRole::Foreign => foreign_col = Some(col),
                ColumnRole::Data => rest.push(col),
            }
        }
        if let Some(col) = foreign_col {
            columns.push(col);
        }
        columns.extend(rest);

        Ok(TableDescriptor {
            name: self.name,
            columns,
            primary_key,
            foreign_key: self.foreign_key,
            children: Vec::new(),
        })
    }
}

/// A feature type that maps to one relational table
///
/// Implementations declare their schema once (`descriptor`) and provide
/// value-level conversions in both directions. `to_row` must emit values
/// in descriptor column order: primary key, foreign key (if any), then
/// the remaining columns.
pub trait Record: Sized + Send + 'static {
    /// Table name (must match `descriptor().name`)
    const TABLE: &'static str;

    /// The declared relational shape of this type
    fn descriptor() -> SchemaResult<TableDescriptor>;

    /// This instance's primary key value
    fn primary_key(&self) -> Value;

    /// All column values in descriptor order
    fn to_row(&self) -> Vec<(String, Value)>;

    /// Materialize an instance from a raw result row
    fn from_row(row: &RowMap) -> SchemaResult<Self>;
}

/// Typed accessors over raw result rows, used by `Record::from_row`
/// implementations
pub mod row {
    use super::*;

    fn require<'a>(row: &'a RowMap, table: &str, column: &str) -> SchemaResult<&'a Value> {
        row.get(column).ok_or_else(|| SchemaError::MissingColumn {
            table: table.to_owned(),
            column: column.to_owned(),
        })
    }

    fn mismatch(table: &str, column: &str, expected: &'static str, value: &Value) -> SchemaError {
        SchemaError::ColumnType {
            table: table.to_owned(),
            column: column.to_owned(),
            expected,
            found: value.type_name(),
        }
    }

    /// Required integer column
    pub fn integer(row: &RowMap, table: &str, column: &str) -> SchemaResult<i64> {
        let value = require(row, table, column)?;
        value
            .as_integer()
            .ok_or_else(|| mismatch(table, column, "integer", value))
    }

    /// Required real column (integers widen)
    pub fn real(row: &RowMap, table: &str, column: &str) -> SchemaResult<f64> {
        let value = require(row, table, column)?;
        value
            .as_real()
            .ok_or_else(|| mismatch(table, column, "real", value))
    }

    /// Required text column
    pub fn text(row: &RowMap, table: &str, column: &str) -> SchemaResult<String> {
        let value = require(row, table, column)?;
        value
            .as_text()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(table, column, "text", value))
    }

    /// Required boolean column (integer 0/1 accepted, as SQLite stores it)
    pub fn boolean(row: &RowMap, table: &str, column: &str) -> SchemaResult<bool> {
        let value = require(row, table, column)?;
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            other => Err(mismatch(table, column, "boolean", other)),
        }
    }

    /// Optional real column (missing or null yields None)
    pub fn real_opt(row: &RowMap, table: &str, column: &str) -> SchemaResult<Option<f64>> {
        match row.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_real()
                .map(Some)
                .ok_or_else(|| mismatch(table, column, "real", value)),
        }
    }

    /// Optional text column (missing or null yields None)
    pub fn text_opt(row: &RowMap, table: &str, column: &str) -> SchemaResult<Option<String>> {
        match row.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_text()
                .map(|s| Some(s.to_owned()))
                .ok_or_else(|| mismatch(table, column, "text", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_orders_pk_fk_first() {
        let desc = TableBuilder::new("runways")
            .column("length_ft", ValueType::Integer)
            .primary_key("id", ValueType::Integer)
            .belongs_to("airport_id", ValueType::Integer, "airports")
            .column("surface", ValueType::String)
            .build()
            .unwrap();

        assert_eq!(desc.columns[0].name, "id");
        assert!(desc.columns[0].is_primary());
        assert_eq!(desc.columns[1].name, "airport_id");
        assert!(desc.columns[1].is_foreign());
        assert_eq!(desc.columns[2].name, "length_ft");
        assert_eq!(desc.primary_key, "id");
    }

    #[test]
    fn test_missing_primary_key_is_fatal() {
        let err = TableBuilder::new("navaids")
            .column("ident", ValueType::String)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingPrimaryKey {
                table: "navaids".into()
            }
        );
    }

    #[test]
    fn test_duplicate_primary_key_last_wins() {
        let desc = TableBuilder::new("airports")
            .primary_key("old_id", ValueType::Integer)
            .primary_key("id", ValueType::Integer)
            .build()
            .unwrap();
        assert_eq!(desc.primary_key, "id");
        // The demoted column survives as plain data
        assert!(desc.column("old_id").is_some());
        assert!(!desc.column("old_id").unwrap().is_primary());
    }

    #[test]
    fn test_second_foreign_key_is_fatal() {
        let err = TableBuilder::new("runways")
            .primary_key("id", ValueType::Integer)
            .belongs_to("airport_id", ValueType::Integer, "airports")
            .belongs_to("navaid_id", ValueType::Integer, "navaids")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MultipleForeignKeys {
                table: "runways".into()
            }
        );
    }

    #[test]
    fn test_empty_table_name_is_fatal() {
        let err = TableBuilder::new("")
            .primary_key("id", ValueType::Integer)
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::EmptyTableName);
    }
}
