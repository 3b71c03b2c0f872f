//! Range validation and statistical outlier detection.
//!
//! Both produce boolean masks aligned with the dataset's rows and never modify it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScourError};
use crate::schema::{ColumnType, Dataset, NumericStatistics};

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside `[Q1 - k*IQR, Q3 + k*IQR]`.
    #[default]
    Iqr,
    /// `|z| > k` using the population standard deviation.
    Zscore,
}

impl OutlierMethod {
    /// Threshold used when the caller supplies none.
    pub fn default_threshold(&self) -> f64 {
        match self {
            OutlierMethod::Iqr => 1.5,
            OutlierMethod::Zscore => 3.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "iqr",
            OutlierMethod::Zscore => "zscore",
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" | "z_score" => Ok(OutlierMethod::Zscore),
            _ => Err(ScourError::InvalidStrategy {
                kind: "outlier method",
                name: s.to_string(),
            }),
        }
    }
}

/// Flags values inside a valid range.
pub struct RangeValidator;

impl RangeValidator {
    /// True where the value lies in `[min, max]`; missing values are never valid.
    pub fn validate_range(
        dataset: &Dataset,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Vec<bool>> {
        let col = dataset.require_column(column, ColumnType::Numeric)?;
        check_bounds(column, min, max)?;

        Ok(dataset
            .column_values(col)
            .map(|v| match v.as_f64() {
                Some(x) => min.is_none_or(|lo| x >= lo) && max.is_none_or(|hi| x <= hi),
                None => false,
            })
            .collect())
    }
}

/// Flags statistical outliers.
pub struct OutlierDetector;

impl OutlierDetector {
    /// True where the value is an outlier; missing values are never outliers.
    ///
    /// An empty dataset yields an empty mask and a constant column flags nothing.
    pub fn detect_outliers(
        dataset: &Dataset,
        column: &str,
        method: OutlierMethod,
        threshold: Option<f64>,
    ) -> Result<Vec<bool>> {
        let col = dataset.require_column(column, ColumnType::Numeric)?;
        let threshold = threshold.unwrap_or_else(|| method.default_threshold());

        let Some(stats) = NumericStatistics::from_values(&dataset.numeric_values(col)) else {
            return Ok(vec![false; dataset.row_count()]);
        };

        Ok(dataset
            .column_values(col)
            .map(|v| match v.as_f64() {
                Some(x) => match method {
                    OutlierMethod::Iqr => stats.is_outlier_iqr(x, threshold),
                    OutlierMethod::Zscore => stats.std > 0.0 && stats.z_score(x).abs() > threshold,
                },
                None => false,
            })
            .collect())
    }
}

pub(crate) fn check_bounds(column: &str, min: Option<f64>, max: Option<f64>) -> Result<()> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(ScourError::InvalidRange {
                column: column.to_string(),
                reason: format!("min {} is greater than max {}", lo, hi),
            });
        }
    }
    Ok(())
}
