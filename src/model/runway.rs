//! Runway feature type

use crate::error::SchemaResult;
use crate::schema::{row, Record, TableBuilder, TableDescriptor};
use crate::value::{Row, RowMap, Value, ValueType};

/// One runway record, owned by its airport
///
/// During ingestion a runway may arrive before its airport's full record;
/// the pipeline inserts a placeholder airport key so the foreign key holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    /// Surrogate primary key
    pub id: i64,

    /// Owning airport (foreign key)
    pub airport_id: i64,

    /// Paired designator (e.g. "10L/28R")
    pub designator: String,

    /// Length in feet
    pub length_ft: i64,

    /// Width in feet
    pub width_ft: i64,

    /// Surface type code (e.g. "ASPH", "TURF"), when reported
    pub surface: Option<String>,
}

impl Record for Runway {
    const TABLE: &'static str = "runways";

    fn descriptor() -> SchemaResult<TableDescriptor> {
        TableBuilder::new(Self::TABLE)
            .primary_key("id", ValueType::Integer)
            .belongs_to("airport_id", ValueType::Integer, "airports")
            .column("designator", ValueType::String)
            .column("length_ft", ValueType::Integer)
            .column("width_ft", ValueType::Integer)
            .column("surface", ValueType::String)
            .build()
    }

    fn primary_key(&self) -> Value {
        Value::Integer(self.id)
    }

    fn to_row(&self) -> Row {
        vec![
            ("id".to_owned(), Value::Integer(self.id)),
            ("airport_id".to_owned(), Value::Integer(self.airport_id)),
            ("designator".to_owned(), Value::Text(self.designator.clone())),
            ("length_ft".to_owned(), Value::Integer(self.length_ft)),
            ("width_ft".to_owned(), Value::Integer(self.width_ft)),
            ("surface".to_owned(), Value::from(self.surface.clone())),
        ]
    }

    fn from_row(r: &RowMap) -> SchemaResult<Self> {
        Ok(Self {
            id: row::integer(r, Self::TABLE, "id")?,
            airport_id: row::integer(r, Self::TABLE, "airport_id")?,
            designator: row::text(r, Self::TABLE, "designator")?,
            length_ft: row::integer(r, Self::TABLE, "length_ft")?,
            width_ft: row::integer(r, Self::TABLE, "width_ft")?,
            surface: row::text_opt(r, Self::TABLE, "surface")?,
        })
    }
}
