use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal value produced by evaluating a query pattern.
///
/// Patterns stay unevaluated expressions until translation time; this is what
/// they evaluate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    /// String content, either a keyword or analyzed text depending on the field.
    Text(String),
    /// Date and time in UTC.
    DateTime(chrono::DateTime<chrono::Utc>),
}

impl DataValue {
    /// Returns true if this is the `Null` variant.
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Returns the text value if this is a Text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value if this is an Int64 variant.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DataValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float64(f) => Some(*f),
            DataValue::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Bool variant.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the datetime value if this is a DateTime variant.
    pub fn as_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            DataValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns true for Int64 and Float64.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataValue::Int64(_) | DataValue::Float64(_))
    }

    /// Name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataValue::Null => "null",
            DataValue::Bool(_) => "bool",
            DataValue::Int64(_) => "int64",
            DataValue::Float64(_) => "float64",
            DataValue::Text(_) => "text",
            DataValue::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "null"),
            DataValue::Bool(b) => write!(f, "{b}"),
            DataValue::Int64(i) => write!(f, "{i}"),
            DataValue::Float64(v) => write!(f, "{v}"),
            DataValue::Text(s) => write!(f, "\"{s}\""),
            DataValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int64(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int64(value as i64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float64(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DataValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DataValue::DateTime(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DataValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(DataValue::from("abc").as_text(), Some("abc"));
        assert_eq!(DataValue::from(3i64).as_float(), Some(3.0));
        assert!(DataValue::from(None::<i64>).is_null());
        assert!(DataValue::Float64(1.5).is_numeric());
        assert!(!DataValue::Bool(true).is_numeric());
    }
}
