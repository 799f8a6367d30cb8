//! Sort specifications

use crate::schema::Record;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (SQL `ASC`)
    #[default]
    Ascending,

    /// Descending (SQL `DESC`)
    Descending,
}

impl SortDirection {
    /// SQL spelling of the direction
    pub fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Order results by one attribute of one table
///
/// Stateless; constructed fresh per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Table the attribute belongs to
    pub table: String,

    /// Attribute (column) name
    pub attribute: String,

    /// Direction
    pub direction: SortDirection,
}

impl Sort {
    /// Sort ascending by an attribute of the given feature type
    pub fn ascending<R: Record>(attribute: &str) -> Self {
        Self {
            table: R::TABLE.to_owned(),
            attribute: attribute.to_owned(),
            direction: SortDirection::Ascending,
        }
    }

    /// Sort descending by an attribute of the given feature type
    pub fn descending<R: Record>(attribute: &str) -> Self {
        Self {
            table: R::TABLE.to_owned(),
            attribute: attribute.to_owned(),
            direction: SortDirection::Descending,
        }
    }
}
