//! Runtime values and column value types
//!
//! `Value` is the dynamically-typed literal that flows between feature
//! records, the batching pipeline, and the SQL layer. `ValueType` is the
//! declared semantic type of a column, mapped to a concrete SQL type name
//! by the active dialect.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Semantic type of a declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Whole numbers (identifiers, counts)
    Integer,

    /// Single-precision reals
    Float,

    /// Double-precision reals (coordinates, elevations)
    Double,

    /// Short strings (identifiers, codes)
    String,

    /// True/false flags
    Boolean,

    /// Free-form text (remarks, descriptions)
    Text,
}

/// A runtime literal bound to a column
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating-point value (covers Float and Double columns)
    Real(f64),

    /// String or free-text value
    Text(String),

    /// Boolean value
    Boolean(bool),
}

impl Value {
    /// Human-readable name of the variant, used in type-mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
        }
    }

    /// Whether this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Extract an integer, if this value holds one
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a real, widening integers
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Extract a string slice, if this value holds text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Extract a boolean, if this value holds one
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

// Values key placeholder sets and batch maps, so they need Eq/Hash.
// Reals hash by bit pattern; NaN never appears in ingested data.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Integer(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            Self::Real(v) => {
                2u8.hash(state);
                v.to_bits().hash(state);
            }
            Self::Text(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Self::Boolean(v) => {
                4u8.hash(state);
                v.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One raw query result row: attribute name -> value
pub type RowMap = HashMap<String, Value>;

/// One outgoing row: column values in descriptor order (primary key first,
/// foreign key second if present, remaining columns after)
pub type Row = Vec<(String, Value)>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42i64).as_integer(), Some(42));
        assert_eq!(Value::from(1.5).as_real(), Some(1.5));
        assert_eq!(Value::from("KSFO").as_text(), Some("KSFO"));
        assert_eq!(Value::from(true).as_boolean(), Some(true));
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_integer_widens_to_real() {
        assert_eq!(Value::Integer(3).as_real(), Some(3.0));
    }

    #[test]
    fn test_values_key_hash_sets() {
        let mut keys = HashSet::new();
        keys.insert(Value::Integer(1));
        keys.insert(Value::Integer(1));
        keys.insert(Value::Text("KSFO".into()));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_real_equality_by_bits() {
        assert_eq!(Value::Real(2.5), Value::Real(2.5));
        assert_ne!(Value::Real(2.5), Value::Integer(2));
    }
}
