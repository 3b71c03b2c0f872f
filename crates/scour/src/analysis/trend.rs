//! Time-series trends, growth rates and moving averages.

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filter::cell_datetime;
use crate::error::{Result, ScourError};
use crate::schema::{ColumnType, Dataset, ValueKey};

/// Growth (in percent) beyond which a trend counts as moving.
const STABLE_BAND_PERCENT: f64 = 5.0;

/// One observation of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// `(current - previous) / previous`; undefined for the first point and
    /// after a zero.
    pub growth_rate: Option<f64>,
    pub moving_average: Option<f64>,
}

/// Points sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Build a series from `(timestamp, value)` pairs, sorting stably by timestamp.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDateTime, f64)>) -> Self {
        let mut points: Vec<TrendPoint> = pairs
            .into_iter()
            .map(|(timestamp, value)| TrendPoint {
                timestamp,
                value,
                growth_rate: None,
                moving_average: None,
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn growth_rates(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.growth_rate).collect()
    }

    pub fn moving_averages(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.moving_average).collect()
    }
}

/// Overall direction of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
            Direction::Stable => "stable",
        };
        f.write_str(name)
    }
}

/// First-to-last overview of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub points: usize,
    pub total: f64,
    pub average: f64,
    pub first_value: f64,
    pub last_value: f64,
    /// Percentage change from first to last; undefined when the first value is 0.
    pub growth_percent: Option<f64>,
    pub direction: Direction,
}

impl TrendSummary {
    pub fn from_series(series: &TrendSeries) -> Result<Self> {
        let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
            return Err(ScourError::EmptyDataset(
                "trend summary needs at least one point".to_string(),
            ));
        };

        let total: f64 = series.points.iter().map(|p| p.value).sum();
        let growth_percent =
            (first.value != 0.0).then(|| (last.value - first.value) / first.value * 100.0);
        let direction = match growth_percent {
            Some(g) if g > STABLE_BAND_PERCENT => Direction::Increasing,
            Some(g) if g < -STABLE_BAND_PERCENT => Direction::Decreasing,
            _ => Direction::Stable,
        };

        Ok(Self {
            points: series.len(),
            total,
            average: total / series.len() as f64,
            first_value: first.value,
            last_value: last.value,
            growth_percent,
            direction,
        })
    }
}

/// Trend extraction over a date column and a numeric value column.
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Chronological `(date, value)` series. Equal dates keep their row order.
    ///
    /// The date column may be datetime or text holding dates; rows whose date
    /// or value is missing or unparseable are skipped.
    pub fn calculate_trends(
        dataset: &Dataset,
        date_column: &str,
        value_column: &str,
    ) -> Result<TrendSeries> {
        let (date_col, value_col) = trend_columns(dataset, date_column, value_column)?;
        let series = TrendSeries::from_pairs(
            dataset
                .rows()
                .iter()
                .filter_map(|row| Some((cell_datetime(&row[date_col])?, row[value_col].as_f64()?))),
        );
        debug!(points = series.len(), date_column, value_column, "trend series built");
        Ok(series)
    }

    /// Copy of the series with each point's growth rate set.
    pub fn calculate_growth_rate(series: &TrendSeries) -> TrendSeries {
        let mut out = series.clone();
        let mut previous: Option<f64> = None;
        for point in &mut out.points {
            point.growth_rate = match previous {
                Some(prev) if prev != 0.0 => {
                    Some((point.value - prev) / prev).filter(|rate| rate.is_finite())
                }
                _ => None,
            };
            previous = Some(point.value);
        }
        out
    }

    /// Copy of the series with each point's moving average set.
    ///
    /// Each average covers the point and up to `window - 1` preceding points.
    pub fn calculate_moving_average(series: &TrendSeries, window: usize) -> Result<TrendSeries> {
        let values: Vec<Option<f64>> = series.points.iter().map(|p| Some(p.value)).collect();
        let averages = rolling_mean(&values, window)?;
        let mut out = series.clone();
        for (point, avg) in out.points.iter_mut().zip(averages) {
            point.moving_average = avg;
        }
        Ok(out)
    }

    /// Summary of the whole series.
    pub fn summarize(
        dataset: &Dataset,
        date_column: &str,
        value_column: &str,
    ) -> Result<TrendSummary> {
        TrendSummary::from_series(&Self::calculate_trends(dataset, date_column, value_column)?)
    }

    /// Summary per group, in first-appearance order.
    ///
    /// Rows with a missing group are skipped, as are groups with no dated values.
    pub fn summarize_trends_by(
        dataset: &Dataset,
        date_column: &str,
        value_column: &str,
        group_column: &str,
    ) -> Result<IndexMap<String, TrendSummary>> {
        let (date_col, value_col) = trend_columns(dataset, date_column, value_column)?;
        let group_col = dataset.column_index(group_column)?;

        let mut groups: IndexMap<ValueKey, (String, Vec<(NaiveDateTime, f64)>)> = IndexMap::new();
        for row in dataset.rows() {
            let group = &row[group_col];
            if group.is_missing() {
                continue;
            }
            let entry = groups
                .entry(group.key())
                .or_insert_with(|| (group.to_string(), Vec::new()));
            if let (Some(dt), Some(v)) = (cell_datetime(&row[date_col]), row[value_col].as_f64()) {
                entry.1.push((dt, v));
            }
        }

        groups
            .into_values()
            .filter(|(name, pairs)| {
                if pairs.is_empty() {
                    debug!(group = %name, "group has no dated values, skipped");
                }
                !pairs.is_empty()
            })
            .map(|(name, pairs)| {
                let summary = TrendSummary::from_series(&TrendSeries::from_pairs(pairs))?;
                Ok((name, summary))
            })
            .collect()
    }
}

fn trend_columns(dataset: &Dataset, date_column: &str, value_column: &str) -> Result<(usize, usize)> {
    let date_col = dataset.column_index(date_column)?;
    let date_type = dataset.column_type(date_column)?;
    if !matches!(date_type, ColumnType::DateTime | ColumnType::Text) {
        return Err(ScourError::wrong_type(date_column, "datetime", date_type));
    }
    let value_col = dataset.require_column(value_column, ColumnType::Numeric)?;
    Ok((date_col, value_col))
}

/// Mean of each position and up to `window - 1` predecessors, ignoring missing
/// entries. Leading positions average the shorter window available.
pub(crate) fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(ScourError::InvalidRange {
            column: "window".to_string(),
            reason: "moving-average window must be at least 1".to_string(),
        });
    }

    Ok((0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            if present.is_empty() {
                return None;
            }
            // Divide before summing so values near f64::MAX cannot overflow
            let n = present.len() as f64;
            Some(present.iter().map(|x| x / n).sum::<f64>()).filter(|avg| avg.is_finite())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, Value};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(values: &[f64]) -> TrendSeries {
        TrendSeries::from_pairs(values.iter().enumerate().map(|(i, v)| (day(i as u32 + 1), *v)))
    }

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![
                ColumnDescriptor::text("country"),
                ColumnDescriptor::datetime("date"),
                ColumnDescriptor::numeric("cases"),
            ],
            vec![
                vec!["UK".into(), day(3).into(), 30.into()],
                vec!["FR".into(), day(1).into(), 50.into()],
                vec!["UK".into(), day(1).into(), 10.into()],
                vec!["UK".into(), day(2).into(), Value::Missing],
                vec!["FR".into(), day(2).into(), 40.into()],
                vec!["UK".into(), day(1).into(), 11.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_trends_sorted_and_stable() {
        let ds = make_dataset();
        let s = TrendAnalyzer::calculate_trends(&ds, "date", "cases").unwrap();
        assert_eq!(s.values(), vec![50.0, 10.0, 11.0, 40.0, 30.0]);
        assert!(s.points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_trends_from_text_dates() {
        let ds = Dataset::from_rows(
            vec![ColumnDescriptor::text("date"), ColumnDescriptor::numeric("cases")],
            vec![
                vec!["2020-01-02".into(), 2.into()],
                vec!["2020-01-01".into(), 1.into()],
                vec!["not a date".into(), 9.into()],
            ],
        )
        .unwrap();
        let s = TrendAnalyzer::calculate_trends(&ds, "date", "cases").unwrap();
        assert_eq!(s.values(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_trends_numeric_date_column_rejected() {
        let ds = make_dataset();
        assert!(matches!(
            TrendAnalyzer::calculate_trends(&ds, "cases", "cases"),
            Err(ScourError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_growth_rate_zero_previous() {
        let s = TrendAnalyzer::calculate_growth_rate(&series(&[100.0, 0.0, 50.0]));
        assert_eq!(s.growth_rates(), vec![None, Some(-1.0), None]);
    }

    #[test]
    fn test_moving_average_partial_window() {
        let s = TrendAnalyzer::calculate_moving_average(&series(&[1.0, 2.0, 3.0, 4.0]), 2).unwrap();
        assert_eq!(
            s.moving_averages(),
            vec![Some(1.0), Some(1.5), Some(2.5), Some(3.5)]
        );
    }

    #[test]
    fn test_growth_rate_overflow_is_undefined() {
        let s = TrendAnalyzer::calculate_growth_rate(&series(&[1e-300, 1e300]));
        assert_eq!(s.growth_rates(), vec![None, None]);
    }

    #[test]
    fn test_moving_average_near_max_stays_finite() {
        let s = TrendAnalyzer::calculate_moving_average(&series(&[f64::MAX, f64::MAX]), 2).unwrap();
        assert_eq!(s.moving_averages(), vec![Some(f64::MAX), Some(f64::MAX)]);
    }

    #[test]
    fn test_moving_average_zero_window() {
        assert!(matches!(
            TrendAnalyzer::calculate_moving_average(&series(&[1.0]), 0),
            Err(ScourError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_rolling_mean_skips_missing() {
        let out = rolling_mean(&[None, Some(2.0), None, Some(4.0)], 2).unwrap();
        assert_eq!(out, vec![None, Some(2.0), Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_summary_direction() {
        let up = TrendSummary::from_series(&series(&[100.0, 90.0, 120.0])).unwrap();
        assert_eq!(up.total, 310.0);
        assert_eq!(up.growth_percent, Some(20.0));
        assert_eq!(up.direction, Direction::Increasing);

        let flat = TrendSummary::from_series(&series(&[100.0, 104.0])).unwrap();
        assert_eq!(flat.direction, Direction::Stable);

        let down = TrendSummary::from_series(&series(&[100.0, 50.0])).unwrap();
        assert_eq!(down.direction, Direction::Decreasing);

        let from_zero = TrendSummary::from_series(&series(&[0.0, 50.0])).unwrap();
        assert_eq!(from_zero.growth_percent, None);
        assert_eq!(from_zero.direction, Direction::Stable);
    }

    #[test]
    fn test_summary_empty_series() {
        assert!(matches!(
            TrendSummary::from_series(&TrendSeries::default()),
            Err(ScourError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_summarize_by_group() {
        let ds = make_dataset();
        let by = TrendAnalyzer::summarize_trends_by(&ds, "date", "cases", "country").unwrap();
        assert_eq!(by.keys().collect::<Vec<_>>(), vec!["UK", "FR"]);
        assert_eq!(by["UK"].first_value, 10.0);
        assert_eq!(by["UK"].last_value, 30.0);
        assert_eq!(by["FR"].direction, Direction::Decreasing);
    }
}
