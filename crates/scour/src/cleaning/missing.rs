//! Missing-value detection and repair.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScourError};
use crate::schema::{ColumnType, Dataset, NumericStatistics, Value, ValueKey};

/// Fill value(s) for the constant strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    /// One value for every targeted column.
    Single(Value),
    /// A value per column; targeted columns without an entry are left alone.
    PerColumn(IndexMap<String, Value>),
}

impl FillValue {
    fn for_column(&self, column: &str) -> Option<&Value> {
        match self {
            FillValue::Single(v) => Some(v),
            FillValue::PerColumn(map) => map.get(column),
        }
    }
}

impl From<Value> for FillValue {
    fn from(value: Value) -> Self {
        FillValue::Single(value)
    }
}

/// How to repair missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum MissingStrategy {
    /// Remove any row with a missing value in the targeted columns.
    Drop,
    /// Fill with the column mean (numeric columns only).
    Mean,
    /// Fill with the column median (numeric columns only).
    Median,
    /// Fill with the most frequent value; ties go to the first encountered.
    Mode,
    /// Fill with a caller-supplied value.
    Constant { value: FillValue },
    /// Propagate the nearest preceding non-missing value.
    ForwardFill,
    /// Propagate the nearest following non-missing value.
    BackwardFill,
}

impl MissingStrategy {
    /// Build a strategy from its name; `constant` needs `fill_value`.
    pub fn from_name(name: &str, fill_value: Option<FillValue>) -> Result<Self> {
        let strategy = match name.trim().to_lowercase().as_str() {
            "drop" => MissingStrategy::Drop,
            "mean" => MissingStrategy::Mean,
            "median" => MissingStrategy::Median,
            "mode" => MissingStrategy::Mode,
            "ffill" | "forward-fill" | "forward_fill" => MissingStrategy::ForwardFill,
            "bfill" | "backward-fill" | "backward_fill" => MissingStrategy::BackwardFill,
            "constant" => match fill_value {
                Some(value) => MissingStrategy::Constant { value },
                None => {
                    return Err(ScourError::InvalidStrategy {
                        kind: "missing-value strategy (constant requires a fill value)",
                        name: name.to_string(),
                    });
                }
            },
            _ => {
                return Err(ScourError::InvalidStrategy {
                    kind: "missing-value strategy",
                    name: name.to_string(),
                });
            }
        };
        Ok(strategy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MissingStrategy::Drop => "drop",
            MissingStrategy::Mean => "mean",
            MissingStrategy::Median => "median",
            MissingStrategy::Mode => "mode",
            MissingStrategy::Constant { .. } => "constant",
            MissingStrategy::ForwardFill => "forward-fill",
            MissingStrategy::BackwardFill => "backward-fill",
        }
    }
}

impl FromStr for MissingStrategy {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s, None)
    }
}

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSummary {
    pub column: String,
    pub missing_count: usize,
    /// Percentage of rows, rounded to two decimals.
    pub missing_percentage: f64,
}

/// Detects and repairs missing values.
pub struct MissingValueHandler;

impl MissingValueHandler {
    /// Count missing values per column.
    pub fn detect(dataset: &Dataset) -> Vec<MissingSummary> {
        let rows = dataset.row_count();
        (0..dataset.column_count())
            .map(|col| {
                let missing_count = dataset.column_values(col).filter(|v| v.is_missing()).count();
                let missing_percentage = if rows == 0 {
                    0.0
                } else {
                    ((missing_count as f64 / rows as f64) * 10_000.0).round() / 100.0
                };
                MissingSummary {
                    column: dataset.column_name(col).unwrap_or_default().to_string(),
                    missing_count,
                    missing_percentage,
                }
            })
            .collect()
    }

    /// Repair missing values in the selected columns (`None` = all columns).
    ///
    /// With `None`, mean and median target only the numeric columns; naming a
    /// non-numeric column explicitly is an error.
    pub fn handle(
        dataset: &Dataset,
        strategy: &MissingStrategy,
        columns: Option<&[&str]>,
    ) -> Result<Dataset> {
        let mut targets = dataset.resolve_columns(columns)?;

        if matches!(strategy, MissingStrategy::Mean | MissingStrategy::Median) {
            if let Some(names) = columns {
                for name in names {
                    dataset.require_column(name, ColumnType::Numeric)?;
                }
            } else {
                targets = dataset.numeric_columns();
            }
        }

        if let MissingStrategy::Constant {
            value: FillValue::PerColumn(map),
        } = strategy
        {
            for name in map.keys() {
                dataset.column_index(name)?;
            }
        }

        if dataset.is_empty() {
            return Ok(dataset.clone());
        }

        match strategy {
            MissingStrategy::Drop => {
                let mask: Vec<bool> = dataset
                    .rows()
                    .iter()
                    .map(|row| targets.iter().all(|&c| !row[c].is_missing()))
                    .collect();
                Ok(dataset.filter_rows(&mask))
            }
            MissingStrategy::Mean | MissingStrategy::Median => {
                let mut out = dataset.clone();
                for &col in &targets {
                    let stats = NumericStatistics::from_values(&dataset.numeric_values(col));
                    let fill = stats.map(|s| {
                        if matches!(strategy, MissingStrategy::Mean) {
                            s.mean
                        } else {
                            s.median
                        }
                    });
                    if let Some(fill) = fill {
                        fill_missing(&mut out, col, &Value::Number(fill));
                    }
                }
                Ok(out)
            }
            MissingStrategy::Mode => {
                let mut out = dataset.clone();
                for &col in &targets {
                    if let Some(fill) = mode(dataset.column_values(col)) {
                        fill_missing(&mut out, col, &fill);
                    }
                }
                Ok(out)
            }
            MissingStrategy::Constant { value } => {
                let mut out = dataset.clone();
                for &col in &targets {
                    let name = dataset.column_name(col).unwrap_or_default();
                    let Some(raw) = value.for_column(name) else {
                        continue;
                    };
                    let column_type = dataset.column_type(name)?;
                    let fill = raw.coerce_to(column_type).ok_or_else(|| {
                        let row = dataset
                            .column_values(col)
                            .position(Value::is_missing)
                            .unwrap_or(0);
                        ScourError::TypeConversion {
                            column: name.to_string(),
                            row,
                            value: raw.to_string(),
                            target: column_type.name(),
                        }
                    })?;
                    fill_missing(&mut out, col, &fill);
                }
                Ok(out)
            }
            MissingStrategy::ForwardFill => {
                let mut out = dataset.clone();
                for &col in &targets {
                    let mut last: Option<Value> = None;
                    for row in out.rows_mut() {
                        if row[col].is_missing() {
                            if let Some(ref v) = last {
                                row[col] = v.clone();
                            }
                        } else {
                            last = Some(row[col].clone());
                        }
                    }
                }
                Ok(out)
            }
            MissingStrategy::BackwardFill => {
                let mut out = dataset.clone();
                for &col in &targets {
                    let mut next: Option<Value> = None;
                    for row in out.rows_mut().iter_mut().rev() {
                        if row[col].is_missing() {
                            if let Some(ref v) = next {
                                row[col] = v.clone();
                            }
                        } else {
                            next = Some(row[col].clone());
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

fn fill_missing(dataset: &mut Dataset, col: usize, fill: &Value) {
    for row in dataset.rows_mut() {
        if row[col].is_missing() {
            row[col] = fill.clone();
        }
    }
}

/// Most frequent non-missing value; the first encountered wins a tie.
pub(crate) fn mode<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: IndexMap<ValueKey, (usize, &Value)> = IndexMap::new();
    for value in values.filter(|v| !v.is_missing()) {
        counts.entry(value.key()).or_insert((0, value)).0 += 1;
    }

    let mut best: Option<(usize, &Value)> = None;
    for (count, value) in counts.values() {
        if best.is_none_or(|(best_count, _)| *count > best_count) {
            best = Some((*count, *value));
        }
    }
    best.map(|(_, v)| v.clone())
}
