//! Airport feature type

use crate::error::SchemaResult;
use crate::schema::{row, Record, TableBuilder, TableDescriptor};
use crate::value::{Row, RowMap, Value, ValueType};

/// One airport record (AIXM AirportHeliport / NASR APT)
#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    /// Surrogate primary key
    pub id: i64,

    /// ICAO identifier (e.g. "KSFO")
    pub icao_ident: String,

    /// Official name
    pub name: String,

    /// Associated city, when the source provides one
    pub city: Option<String>,

    /// Field elevation in feet MSL
    pub field_elevation: f64,

    /// Latitude in decimal degrees, north positive
    pub latitude: f64,

    /// Longitude in decimal degrees, east positive
    pub longitude: f64,

    /// Whether the field has an operating control tower
    pub towered: bool,
}

impl Record for Airport {
    const TABLE: &'static str = "airports";

    fn descriptor() -> SchemaResult<TableDescriptor> {
        TableBuilder::new(Self::TABLE)
            .primary_key("id", ValueType::Integer)
            .column("icao_ident", ValueType::String)
            .column("name", ValueType::Text)
            .column("city", ValueType::String)
            .column("field_elevation", ValueType::Double)
            .column("latitude", ValueType::Double)
            .column("longitude", ValueType::Double)
            .column("towered", ValueType::Boolean)
            .build()
    }

    fn primary_key(&self) -> Value {
        Value::Integer(self.id)
    }

    fn to_row(&self) -> Row {
        vec![
            ("id".to_owned(), Value::Integer(self.id)),
            ("icao_ident".to_owned(), Value::Text(self.icao_ident.clone())),
            ("name".to_owned(), Value::Text(self.name.clone())),
            ("city".to_owned(), Value::from(self.city.clone())),
            ("field_elevation".to_owned(), Value::Real(self.field_elevation)),
            ("latitude".to_owned(), Value::Real(self.latitude)),
            ("longitude".to_owned(), Value::Real(self.longitude)),
            ("towered".to_owned(), Value::Boolean(self.towered)),
        ]
    }

    fn from_row(r: &RowMap) -> SchemaResult<Self> {
        Ok(Self {
            id: row::integer(r, Self::TABLE, "id")?,
            icao_ident: row::text(r, Self::TABLE, "icao_ident")?,
            name: row::text(r, Self::TABLE, "name")?,
            city: row::text_opt(r, Self::TABLE, "city")?,
            field_elevation: row::real(r, Self::TABLE, "field_elevation")?,
            latitude: row::real(r, Self::TABLE, "latitude")?,
            longitude: row::real(r, Self::TABLE, "longitude")?,
            towered: row::boolean(r, Self::TABLE, "towered")?,
        })
    }
}
