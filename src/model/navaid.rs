//! Navigation aid feature type

use crate::error::SchemaResult;
use crate::schema::{row, Record, TableBuilder, TableDescriptor};
use crate::value::{Row, RowMap, Value, ValueType};

/// One navigation aid record (VOR, NDB, TACAN, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct Navaid {
    /// Surrogate primary key
    pub id: i64,

    /// Station identifier (e.g. "SFO")
    pub ident: String,

    /// Facility type code (e.g. "VOR/DME", "NDB")
    pub navaid_type: String,

    /// Frequency in kHz
    pub frequency_khz: f64,

    /// Latitude in decimal degrees, north positive
    pub latitude: f64,

    /// Longitude in decimal degrees, east positive
    pub longitude: f64,

    /// Site elevation in feet MSL, when surveyed
    pub elevation: Option<f64>,
}

impl Record for Navaid {
    const TABLE: &'static str = "navaids";

    fn descriptor() -> SchemaResult<TableDescriptor> {
        TableBuilder::new(Self::TABLE)
            .primary_key("id", ValueType::Integer)
            .column("ident", ValueType::String)
            .column("navaid_type", ValueType::String)
            .column("frequency_khz", ValueType::Double)
            .column("latitude", ValueType::Double)
            .column("longitude", ValueType::Double)
            .column("elevation", ValueType::Double)
            .build()
    }

    fn primary_key(&self) -> Value {
        Value::Integer(self.id)
    }

    fn to_row(&self) -> Row {
        vec![
            ("id".to_owned(), Value::Integer(self.id)),
            ("ident".to_owned(), Value::Text(self.ident.clone())),
            ("navaid_type".to_owned(), Value::Text(self.navaid_type.clone())),
            ("frequency_khz".to_owned(), Value::Real(self.frequency_khz)),
            ("latitude".to_owned(), Value::Real(self.latitude)),
            ("longitude".to_owned(), Value::Real(self.longitude)),
            ("elevation".to_owned(), Value::from(self.elevation)),
        ]
    }

    fn from_row(r: &RowMap) -> SchemaResult<Self> {
        Ok(Self {
            id: row::integer(r, Self::TABLE, "id")?,
            ident: row::text(r, Self::TABLE, "ident")?,
            navaid_type: row::text(r, Self::TABLE, "navaid_type")?,
            frequency_khz: row::real(r, Self::TABLE, "frequency_khz")?,
            latitude: row::real(r, Self::TABLE, "latitude")?,
            longitude: row::real(r, Self::TABLE, "longitude")?,
            elevation: row::real_opt(r, Self::TABLE, "elevation")?,
        })
    }
}
