//! Row filters: equality, numeric range, date range and AND-composites.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaning::check_bounds;
use crate::error::{Result, ScourError};
use crate::schema::parse::parse_datetime;
use crate::schema::{ColumnType, Dataset, Value};

/// A row predicate. Missing values never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterCriterion {
    /// Value equals any of `values`.
    ColumnEquals { column: String, values: Vec<Value> },
    /// Value lies in `[min, max]`; an omitted bound is unconstrained.
    NumericRange {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Date lies in `[start, end]`; an omitted bound is unconstrained.
    DateRange {
        column: String,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
    /// Every criterion must match.
    Composite { criteria: Vec<FilterCriterion> },
}

impl FilterCriterion {
    /// Evaluate the criterion against every row.
    pub fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>> {
        match self {
            FilterCriterion::ColumnEquals { column, values } => {
                let col = dataset.column_index(column)?;
                let column_type = dataset.column_type(column)?;
                let wanted: Vec<_> = values
                    .iter()
                    .filter_map(|v| v.coerce_to(column_type))
                    .filter(|v| !v.is_missing())
                    .map(|v| v.key())
                    .collect();
                Ok(dataset
                    .column_values(col)
                    .map(|v| !v.is_missing() && wanted.contains(&v.key()))
                    .collect())
            }
            FilterCriterion::NumericRange { column, min, max } => {
                let col = dataset.require_column(column, ColumnType::Numeric)?;
                check_bounds(column, *min, *max)?;
                Ok(dataset
                    .column_values(col)
                    .map(|v| v.as_f64().is_some_and(|x| within(x, *min, *max)))
                    .collect())
            }
            FilterCriterion::DateRange { column, start, end } => {
                let col = dataset.column_index(column)?;
                let column_type = dataset.column_type(column)?;
                if !matches!(column_type, ColumnType::DateTime | ColumnType::Text) {
                    return Err(ScourError::wrong_type(column, "datetime", column_type));
                }
                if let (Some(s), Some(e)) = (start, end) {
                    if s > e {
                        return Err(ScourError::InvalidRange {
                            column: column.clone(),
                            reason: format!("start {} is after end {}", s, e),
                        });
                    }
                }
                Ok(dataset
                    .column_values(col)
                    .map(|v| {
                        cell_datetime(v).is_some_and(|dt| {
                            start.is_none_or(|s| dt >= s) && end.is_none_or(|e| dt <= e)
                        })
                    })
                    .collect())
            }
            FilterCriterion::Composite { criteria } => {
                let mut mask = vec![true; dataset.row_count()];
                for criterion in criteria {
                    for (m, keep) in mask.iter_mut().zip(criterion.mask(dataset)?) {
                        *m &= keep;
                    }
                }
                Ok(mask)
            }
        }
    }
}

fn within(x: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|lo| x >= lo) && max.is_none_or(|hi| x <= hi)
}

/// Datetime of a cell: a datetime value, or text parsed under the accepted formats.
pub(crate) fn cell_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Text(s) => parse_datetime(s, None),
        _ => None,
    }
}

/// Per-column condition for [`FilterEngine::filter_by_multiple_criteria`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionSpec {
    /// Membership in a list.
    OneOf(Vec<Value>),
    /// Inclusive bounds; numeric or datetime columns only.
    Between { min: Option<Value>, max: Option<Value> },
    /// Equality with a single value.
    Equals(Value),
}

impl ConditionSpec {
    /// Resolve the condition against a column's declared type.
    pub fn to_criterion(&self, dataset: &Dataset, column: &str) -> Result<FilterCriterion> {
        let column_type = dataset.column_type(column)?;
        let criterion = match self {
            ConditionSpec::Equals(value) => FilterCriterion::ColumnEquals {
                column: column.to_string(),
                values: vec![value.clone()],
            },
            ConditionSpec::OneOf(values) => FilterCriterion::ColumnEquals {
                column: column.to_string(),
                values: values.clone(),
            },
            ConditionSpec::Between { min, max } => match column_type {
                ColumnType::Numeric => FilterCriterion::NumericRange {
                    column: column.to_string(),
                    min: bound(column, min, ColumnType::Numeric)?.and_then(|v| v.as_f64()),
                    max: bound(column, max, ColumnType::Numeric)?.and_then(|v| v.as_f64()),
                },
                ColumnType::DateTime | ColumnType::Text => FilterCriterion::DateRange {
                    column: column.to_string(),
                    start: bound(column, min, ColumnType::DateTime)?.and_then(|v| v.as_datetime()),
                    end: bound(column, max, ColumnType::DateTime)?.and_then(|v| v.as_datetime()),
                },
                ColumnType::Boolean => {
                    return Err(ScourError::wrong_type(column, "numeric or datetime", column_type));
                }
            },
        };
        Ok(criterion)
    }
}

fn bound(column: &str, value: &Option<Value>, target: ColumnType) -> Result<Option<Value>> {
    match value {
        None | Some(Value::Missing) => Ok(None),
        Some(v) => v
            .coerce_to(target)
            .map(Some)
            .ok_or_else(|| ScourError::InvalidRange {
                column: column.to_string(),
                reason: format!("bound '{}' is not a {} value", v, target),
            }),
    }
}

/// Produces row subsets; never modifies its input.
pub struct FilterEngine;

impl FilterEngine {
    /// Keep rows matching the criterion. Zero matches yields an empty dataset.
    pub fn apply(dataset: &Dataset, criterion: &FilterCriterion) -> Result<Dataset> {
        let mask = criterion.mask(dataset)?;
        let result = dataset.filter_rows(&mask);
        debug!(
            rows_in = dataset.row_count(),
            rows_out = result.row_count(),
            "filter applied"
        );
        Ok(result)
    }

    /// Keep rows whose value equals any of `values`.
    pub fn filter_by_column(dataset: &Dataset, column: &str, values: &[Value]) -> Result<Dataset> {
        Self::apply(
            dataset,
            &FilterCriterion::ColumnEquals {
                column: column.to_string(),
                values: values.to_vec(),
            },
        )
    }

    pub fn filter_by_numeric_range(
        dataset: &Dataset,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Dataset> {
        Self::apply(
            dataset,
            &FilterCriterion::NumericRange {
                column: column.to_string(),
                min,
                max,
            },
        )
    }

    /// Works on datetime columns and on text columns holding dates.
    pub fn filter_by_date_range(
        dataset: &Dataset,
        column: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Dataset> {
        Self::apply(
            dataset,
            &FilterCriterion::DateRange {
                column: column.to_string(),
                start,
                end,
            },
        )
    }

    /// Logical AND of one condition per column.
    pub fn filter_by_multiple_criteria(
        dataset: &Dataset,
        conditions: &[(&str, ConditionSpec)],
    ) -> Result<Dataset> {
        let criteria = conditions
            .iter()
            .map(|(column, spec)| spec.to_criterion(dataset, column))
            .collect::<Result<Vec<_>>>()?;
        Self::apply(dataset, &FilterCriterion::Composite { criteria })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![
                ColumnDescriptor::text("country"),
                ColumnDescriptor::numeric("cases"),
                ColumnDescriptor::datetime("date"),
                ColumnDescriptor::text("reported"),
            ],
            vec![
                vec!["UK".into(), 10.into(), date(2020, 1, 1).into(), "2020-01-05".into()],
                vec!["FR".into(), 20.into(), date(2020, 2, 1).into(), "2020-02-05".into()],
                vec!["UK".into(), Value::Missing, date(2020, 3, 1).into(), "unknown".into()],
                vec!["DE".into(), 40.into(), Value::Missing, Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_by_column_or_semantics() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_column(&ds, "country", &["UK".into(), "DE".into()]).unwrap();
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn test_filter_by_column_coerces_filter_value() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_column(&ds, "cases", &["20".into()]).unwrap();
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_column(&ds, "country", &["US".into()]).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.column_count(), 4);
    }

    #[test]
    fn test_filter_unknown_column() {
        let ds = make_dataset();
        assert!(matches!(
            FilterEngine::filter_by_column(&ds, "region", &["x".into()]),
            Err(ScourError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_numeric_range_inclusive() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_numeric_range(&ds, "cases", Some(10.0), Some(20.0)).unwrap();
        assert_eq!(out.row_count(), 2);
        let open = FilterEngine::filter_by_numeric_range(&ds, "cases", Some(15.0), None).unwrap();
        assert_eq!(open.row_count(), 2);
    }

    #[test]
    fn test_numeric_range_inverted() {
        let ds = make_dataset();
        assert!(matches!(
            FilterEngine::filter_by_numeric_range(&ds, "cases", Some(5.0), Some(1.0)),
            Err(ScourError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_date_range() {
        let ds = make_dataset();
        let out =
            FilterEngine::filter_by_date_range(&ds, "date", Some(date(2020, 2, 1)), None).unwrap();
        assert_eq!(out.row_count(), 2);

        let inverted =
            FilterEngine::filter_by_date_range(&ds, "date", Some(date(2021, 1, 1)), Some(date(2020, 1, 1)));
        assert!(matches!(inverted, Err(ScourError::InvalidRange { .. })));
    }

    #[test]
    fn test_date_range_on_text_column() {
        let ds = make_dataset();
        let out =
            FilterEngine::filter_by_date_range(&ds, "reported", None, Some(date(2020, 1, 31))).unwrap();
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn test_multiple_criteria() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_multiple_criteria(
            &ds,
            &[
                ("country", ConditionSpec::OneOf(vec!["UK".into(), "FR".into()])),
                (
                    "cases",
                    ConditionSpec::Between {
                        min: Some(15.into()),
                        max: None,
                    },
                ),
            ],
        )
        .unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.get(0, 0), Some(&Value::text("FR")));
    }

    #[test]
    fn test_between_on_date_column() {
        let ds = make_dataset();
        let out = FilterEngine::filter_by_multiple_criteria(
            &ds,
            &[(
                "date",
                ConditionSpec::Between {
                    min: Some("2020-01-15".into()),
                    max: Some("2020-03-01".into()),
                },
            )],
        )
        .unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn test_condition_spec_from_json() {
        let spec: ConditionSpec = serde_json::from_str(r#"{"min": 10, "max": 20}"#).unwrap();
        assert_eq!(
            spec,
            ConditionSpec::Between {
                min: Some(10.into()),
                max: Some(20.into()),
            }
        );
        let spec: ConditionSpec = serde_json::from_str(r#"["UK", "FR"]"#).unwrap();
        assert!(matches!(spec, ConditionSpec::OneOf(_)));
        let spec: ConditionSpec = serde_json::from_str(r#""UK""#).unwrap();
        assert_eq!(spec, ConditionSpec::Equals("UK".into()));
    }
}
