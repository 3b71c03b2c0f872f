//! Summary statistics and group-by aggregation.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScourError};
use crate::schema::{ColumnDescriptor, ColumnType, Dataset, Value, ValueKey, percentile};

/// Aggregation function applied to each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Count => "count",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
        }
    }

    /// Evaluate over non-missing values. Sum and count of nothing are 0.
    pub fn evaluate(&self, values: &[f64]) -> Option<f64> {
        match self {
            AggFunc::Sum => Some(values.iter().sum()),
            AggFunc::Count => Some(values.len() as f64),
            _ if values.is_empty() => None,
            AggFunc::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            AggFunc::Min => values.iter().copied().reduce(f64::min),
            AggFunc::Max => values.iter().copied().reduce(f64::max),
        }
    }

    fn needs_numeric(&self) -> bool {
        !matches!(self, AggFunc::Count)
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggFunc {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "mean" | "avg" | "average" => Ok(AggFunc::Mean),
            "count" => Ok(AggFunc::Count),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            _ => Err(ScourError::InvalidStrategy {
                kind: "aggregation function",
                name: s.to_string(),
            }),
        }
    }
}

/// Descriptive statistics over the non-missing values of a numeric column.
///
/// Every field except `count` and `sum` is `None` when there are no values;
/// `std` is the sample standard deviation and needs two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
}

impl SummaryStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let sum: f64 = values.iter().sum();
        if count == 0 {
            return Self {
                count,
                sum,
                mean: None,
                median: None,
                min: None,
                max: None,
                std: None,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mean = sum / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            sum,
            mean: Some(mean),
            median: Some(percentile(&sorted, 0.5)),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            std,
        }
    }
}

/// What to group by and how to aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub group_by: Vec<String>,
    pub target: String,
    pub functions: Vec<AggFunc>,
    /// Order groups by the first aggregate, descending.
    #[serde(default)]
    pub sort: bool,
}

impl AggregationSpec {
    pub fn new(group_by: &[&str], target: &str, functions: &[AggFunc]) -> Self {
        Self {
            group_by: group_by.iter().map(|c| c.to_string()).collect(),
            target: target.to_string(),
            functions: functions.to_vec(),
            sort: false,
        }
    }

    pub fn sorted(mut self) -> Self {
        self.sort = true;
        self
    }
}

/// One group of an aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group-key values, one per group-by column.
    pub key: Vec<Value>,
    /// One result per function, in the order of `AggregationSpec::functions`.
    pub values: Vec<Option<f64>>,
}

/// Result of [`Aggregator::group_and_aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub group_by: Vec<String>,
    /// Declared types of the group-by columns.
    pub key_types: Vec<ColumnType>,
    pub target: String,
    pub functions: Vec<AggFunc>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Result column names: the group-by columns then `<target>_<function>`.
    pub fn column_names(&self) -> Vec<String> {
        self.group_by
            .iter()
            .cloned()
            .chain(self.functions.iter().map(|f| format!("{}_{}", self.target, f)))
            .collect()
    }

    /// Find the group with the given key.
    pub fn lookup(&self, key: &[Value]) -> Option<&AggregateRow> {
        let wanted: Vec<ValueKey> = key.iter().map(Value::key).collect();
        self.rows
            .iter()
            .find(|row| row.key.iter().map(Value::key).eq(wanted.iter().cloned()))
    }

    /// Result of one function for one group.
    pub fn value(&self, key: &[Value], function: AggFunc) -> Option<f64> {
        let idx = self.functions.iter().position(|f| *f == function)?;
        self.lookup(key).and_then(|row| row.values[idx])
    }

    /// Convert to a dataset with one row per group.
    pub fn to_dataset(&self) -> Result<Dataset> {
        let columns = self
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let column_type = self.key_types.get(i).copied().unwrap_or(ColumnType::Numeric);
                ColumnDescriptor::new(name, column_type)
            })
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.key
                    .iter()
                    .cloned()
                    .chain(row.values.iter().map(|v| Value::from(*v)))
                    .collect()
            })
            .collect();
        Dataset::from_rows(columns, rows)
    }
}

/// Computes statistics and grouped aggregates; never modifies its input.
pub struct Aggregator;

impl Aggregator {
    /// Statistics for one numeric column, ignoring missing values.
    pub fn calculate_summary_stats(dataset: &Dataset, column: &str) -> Result<SummaryStatistics> {
        let col = dataset.require_column(column, ColumnType::Numeric)?;
        Ok(SummaryStatistics::from_values(&dataset.numeric_values(col)))
    }

    /// Statistics per column; `None` selects every numeric column.
    pub fn get_column_statistics(
        dataset: &Dataset,
        columns: Option<&[&str]>,
    ) -> Result<IndexMap<String, SummaryStatistics>> {
        let names: Vec<String> = match columns {
            Some(names) => names.iter().map(|n| n.to_string()).collect(),
            None => dataset
                .numeric_columns()
                .into_iter()
                .filter_map(|i| dataset.column_name(i).map(str::to_string))
                .collect(),
        };

        names
            .into_iter()
            .map(|name| {
                let stats = Self::calculate_summary_stats(dataset, &name)?;
                Ok((name, stats))
            })
            .collect()
    }

    /// One row per distinct group key, in first-appearance order unless sorted.
    ///
    /// Rows with a missing group-key value are skipped.
    pub fn group_and_aggregate(dataset: &Dataset, spec: &AggregationSpec) -> Result<AggregateTable> {
        if spec.group_by.is_empty() {
            return Err(ScourError::InvalidColumn {
                column: String::new(),
                reason: "at least one group-by column is required".to_string(),
            });
        }
        if spec.functions.is_empty() {
            return Err(ScourError::InvalidStrategy {
                kind: "aggregation function",
                name: String::new(),
            });
        }

        let key_cols = spec
            .group_by
            .iter()
            .map(|c| dataset.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        let target = if spec.functions.iter().any(AggFunc::needs_numeric) {
            dataset.require_column(&spec.target, ColumnType::Numeric)?
        } else {
            dataset.column_index(&spec.target)?
        };

        let groups = group_rows(dataset, &key_cols, target);

        let mut rows: Vec<AggregateRow> = groups
            .into_values()
            .map(|(key, cells)| {
                let numbers: Vec<f64> = cells.iter().copied().filter_map(Value::as_f64).collect();
                let values = spec
                    .functions
                    .iter()
                    .map(|f| match f {
                        AggFunc::Count => Some(cells.iter().filter(|v| !v.is_missing()).count() as f64),
                        _ => f.evaluate(&numbers),
                    })
                    .collect();
                AggregateRow { key, values }
            })
            .collect();

        if spec.sort {
            rows.sort_by(|a, b| match (a.values[0], b.values[0]) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }

        debug!(groups = rows.len(), target = %spec.target, "aggregated");
        Ok(AggregateTable {
            group_by: spec.group_by.clone(),
            key_types: spec
                .group_by
                .iter()
                .map(|c| dataset.column_type(c))
                .collect::<Result<_>>()?,
            target: spec.target.clone(),
            functions: spec.functions.clone(),
            rows,
        })
    }

    /// Summary statistics of `value_column` for each group of `group_column`.
    pub fn compare_groups(
        dataset: &Dataset,
        group_column: &str,
        value_column: &str,
    ) -> Result<IndexMap<String, SummaryStatistics>> {
        let key_col = dataset.column_index(group_column)?;
        let value_col = dataset.require_column(value_column, ColumnType::Numeric)?;

        Ok(group_rows(dataset, &[key_col], value_col)
            .into_values()
            .map(|(key, cells)| {
                let numbers: Vec<f64> = cells.iter().copied().filter_map(Value::as_f64).collect();
                (key[0].to_string(), SummaryStatistics::from_values(&numbers))
            })
            .collect())
    }
}

/// Target cells per group key, in first-appearance order.
fn group_rows<'a>(
    dataset: &'a Dataset,
    key_cols: &[usize],
    target: usize,
) -> IndexMap<Vec<ValueKey>, (Vec<Value>, Vec<&'a Value>)> {
    let mut groups: IndexMap<Vec<ValueKey>, (Vec<Value>, Vec<&Value>)> = IndexMap::new();
    for row in dataset.rows() {
        if key_cols.iter().any(|&c| row[c].is_missing()) {
            continue;
        }
        let key: Vec<ValueKey> = key_cols.iter().map(|&c| row[c].key()).collect();
        groups
            .entry(key)
            .or_insert_with(|| (key_cols.iter().map(|&c| row[c].clone()).collect(), Vec::new()))
            .1
            .push(&row[target]);
    }
    groups
}
