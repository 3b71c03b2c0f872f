//! Core type definitions for column types and cell values.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::parse;
use crate::error::ScourError;

/// Declared semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Finite floating-point numbers.
    Numeric,
    /// Free text.
    Text,
    /// Date and/or time values.
    DateTime,
    /// Boolean values (true/false).
    Boolean,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::DateTime => "datetime",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "numeric" | "number" | "float" | "integer" => Ok(ColumnType::Numeric),
            "text" | "string" => Ok(ColumnType::Text),
            "datetime" | "date" => Ok(ColumnType::DateTime),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            _ => Err(ScourError::InvalidStrategy {
                kind: "column type",
                name: s.to_string(),
            }),
        }
    }
}

/// A single cell value.
///
/// `Missing` is the missing marker; numbers are always finite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Missing,
    Boolean(bool),
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "numeric",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
        }
    }

    /// Convert this value to the given column type.
    ///
    /// Returns `None` when no conversion exists. Missing stays missing.
    pub fn coerce_to(&self, column_type: ColumnType) -> Option<Value> {
        match (self, column_type) {
            (Value::Missing, _) => Some(Value::Missing),
            (_, ColumnType::Text) => Some(Value::Text(self.to_string())),
            (Value::Number(n), ColumnType::Numeric) => n.is_finite().then(|| self.clone()),
            (Value::Boolean(b), ColumnType::Numeric) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
            (Value::Text(s), ColumnType::Numeric) => parse::parse_number(s).map(Value::Number),
            (Value::DateTime(_), ColumnType::DateTime) => Some(self.clone()),
            (Value::Text(s), ColumnType::DateTime) => {
                parse::parse_datetime(s, None).map(Value::DateTime)
            }
            (Value::Boolean(_), ColumnType::Boolean) => Some(self.clone()),
            (Value::Text(s), ColumnType::Boolean) => parse::parse_bool(s).map(Value::Boolean),
            (Value::Number(n), ColumnType::Boolean) if *n == 0.0 || *n == 1.0 => {
                Some(Value::Boolean(*n == 1.0))
            }
            _ => None,
        }
    }

    /// Hashable identity used for duplicate detection, grouping and mode.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Missing => ValueKey::Missing,
            Value::Boolean(b) => ValueKey::Boolean(*b),
            // -0.0 and 0.0 compare equal, so they must hash equal
            Value::Number(n) => ValueKey::Number(if *n == 0.0 { 0 } else { n.to_bits() }),
            Value::Text(s) => ValueKey::Text(s.clone()),
            Value::DateTime(dt) => ValueKey::DateTime(*dt),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::DateTime(dt) => {
                if dt.time() == NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Missing
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Hashable, totally comparable form of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Missing,
    Boolean(bool),
    Number(u64),
    Text(String),
    DateTime(NaiveDateTime),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_coerce_non_finite_number() {
        assert_eq!(Value::Number(f64::NAN).coerce_to(ColumnType::Numeric), None);
        assert_eq!(Value::Number(f64::NEG_INFINITY).coerce_to(ColumnType::Numeric), None);
        assert_eq!(Value::Number(2.5).coerce_to(ColumnType::Numeric), Some(Value::Number(2.5)));
    }

    #[test]
    fn test_coerce_text_to_numeric() {
        let v = Value::text(" 1,250 ");
        assert_eq!(v.coerce_to(ColumnType::Numeric), Some(Value::Number(1250.0)));
        assert_eq!(Value::text("abc").coerce_to(ColumnType::Numeric), None);
    }

    #[test]
    fn test_coerce_missing_is_missing() {
        assert_eq!(Value::Missing.coerce_to(ColumnType::DateTime), Some(Value::Missing));
    }

    #[test]
    fn test_display_datetime() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(Value::DateTime(date).to_string(), "2020-01-05");
        assert_eq!(Value::Number(100.0).to_string(), "100");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_key_zero_sign() {
        assert_eq!(Value::Number(0.0).key(), Value::Number(-0.0).key());
    }

    #[test]
    fn test_non_finite_becomes_missing() {
        assert_eq!(Value::from(f64::NAN), Value::Missing);
    }

    #[test]
    fn test_column_type_from_str() {
        assert_eq!("Numeric".parse::<ColumnType>().unwrap(), ColumnType::Numeric);
        assert!("complex".parse::<ColumnType>().is_err());
    }
}
