//! Column type conversion with a configurable error policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScourError};
use crate::schema::parse::{is_null_value, parse_datetime, parse_number, parse_with_format};
use crate::schema::{ColumnType, Dataset, Value};

/// What to do with a value that cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Replace it with the missing marker and continue.
    Coerce,
    /// Fail the whole operation.
    #[default]
    Raise,
}

impl FromStr for ErrorPolicy {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "coerce" => Ok(ErrorPolicy::Coerce),
            "raise" => Ok(ErrorPolicy::Raise),
            _ => Err(ScourError::InvalidStrategy {
                kind: "error policy",
                name: s.to_string(),
            }),
        }
    }
}

/// Converts column values to numeric or datetime.
pub struct TypeCoercer;

impl TypeCoercer {
    /// Convert a column to numeric.
    ///
    /// Text is parsed after stripping whitespace and thousands separators;
    /// booleans become 1/0; missing-marker words become missing.
    pub fn to_numeric(dataset: &Dataset, column: &str, errors: ErrorPolicy) -> Result<Dataset> {
        convert_column(dataset, column, ColumnType::Numeric, errors, |value| match value {
            Value::Number(_) => Some(value.clone()),
            Value::Boolean(b) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
            Value::Text(s) => parse_number(s).map(Value::Number),
            _ => None,
        })
    }

    /// Convert a column to datetime.
    ///
    /// Under `Raise` a supplied `format` is the only format tried; without one,
    /// the accepted formats are tried. Under `Coerce` the supplied format is tried
    /// first and the accepted formats after it.
    pub fn to_datetime(
        dataset: &Dataset,
        column: &str,
        format: Option<&str>,
        errors: ErrorPolicy,
    ) -> Result<Dataset> {
        convert_column(dataset, column, ColumnType::DateTime, errors, |value| match value {
            Value::DateTime(_) => Some(value.clone()),
            Value::Text(s) => match (format, errors) {
                (Some(fmt), ErrorPolicy::Raise) => parse_with_format(s, fmt),
                (fmt, _) => parse_datetime(s, fmt),
            }
            .map(Value::DateTime),
            _ => None,
        })
    }
}

fn convert_column(
    dataset: &Dataset,
    column: &str,
    target: ColumnType,
    errors: ErrorPolicy,
    convert: impl Fn(&Value) -> Option<Value>,
) -> Result<Dataset> {
    let col = dataset.column_index(column)?;
    let mut out = dataset.clone();
    let mut coerced = 0usize;

    for (row_idx, row) in out.rows_mut().iter_mut().enumerate() {
        let value = &row[col];
        if value.is_missing() || value.as_str().is_some_and(is_null_value) {
            row[col] = Value::Missing;
            continue;
        }

        match convert(value) {
            Some(converted) => row[col] = converted,
            None => match errors {
                ErrorPolicy::Coerce => {
                    row[col] = Value::Missing;
                    coerced += 1;
                }
                ErrorPolicy::Raise => {
                    return Err(ScourError::TypeConversion {
                        column: column.to_string(),
                        row: row_idx,
                        value: value.to_string(),
                        target: target.name(),
                    });
                }
            },
        }
    }

    out.set_column_type(col, target);
    debug!(column, target = target.name(), coerced, "converted column");
    Ok(out)
}
