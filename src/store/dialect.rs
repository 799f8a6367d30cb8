//! SQL dialects
//!
//! A dialect supplies the two things that differ between SQL-family
//! backends: column type names and literal value formatting. Everything
//! else (statement shapes, join construction, key ordering) is shared in
//! [`sql`](super::sql).

use crate::value::{Value, ValueType};

/// Backend-specific SQL formatting
pub trait Dialect: Send + Sync {
    /// SQL type name for a declared column type
    fn type_name(&self, value_type: ValueType) -> &'static str;

    /// Render a literal value as SQL text
    fn format_value(&self, value: &Value) -> String;
}

/// SQLite dialect
///
/// Booleans are stored as integers 0/1; strings are single-quoted with
/// embedded quotes doubled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn type_name(&self, value_type: ValueType) -> &'static str {
        match value_type {
            ValueType::Integer => "INTEGER",
            ValueType::Float | ValueType::Double => "REAL",
            ValueType::String | ValueType::Text => "TEXT",
            ValueType::Boolean => "INTEGER",
        }
    }

    fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_owned(),
            Value::Integer(v) => v.to_string(),
            Value::Real(v) => {
                // Keep a decimal point so the literal stays REAL
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{:.1}", v)
                } else {
                    v.to_string()
                }
            }
            Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => if *v { "1" } else { "0" }.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let d = SqliteDialect;
        assert_eq!(d.type_name(ValueType::Integer), "INTEGER");
        assert_eq!(d.type_name(ValueType::Double), "REAL");
        assert_eq!(d.type_name(ValueType::String), "TEXT");
        assert_eq!(d.type_name(ValueType::Boolean), "INTEGER");
    }

    #[test]
    fn test_literal_formatting() {
        let d = SqliteDialect;
        assert_eq!(d.format_value(&Value::Null), "NULL");
        assert_eq!(d.format_value(&Value::Integer(42)), "42");
        assert_eq!(d.format_value(&Value::Real(13.5)), "13.5");
        assert_eq!(d.format_value(&Value::Real(2.0)), "2.0");
        assert_eq!(d.format_value(&Value::Boolean(true)), "1");
        assert_eq!(
            d.format_value(&Value::Text("O'Hare".into())),
            "'O''Hare'"
        );
    }
}
