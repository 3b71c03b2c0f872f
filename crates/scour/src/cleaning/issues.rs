//! Data-quality overview of a dataset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::duplicates::DuplicateResolver;
use super::missing::{MissingSummary, MissingValueHandler};
use crate::error::Result;
use crate::schema::{ColumnType, Dataset};

/// Missing values, duplicates and column types found in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssues {
    pub row_count: usize,
    /// Columns with at least one missing value.
    pub missing: Vec<MissingSummary>,
    /// Rows repeating an earlier row across all columns.
    pub duplicate_count: usize,
    pub column_types: IndexMap<String, ColumnType>,
}

impl QualityIssues {
    /// True when no missing values or duplicates were found.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicate_count == 0
    }
}

/// Inspect a dataset for common quality problems.
pub fn detect_issues(dataset: &Dataset) -> Result<QualityIssues> {
    let missing = MissingValueHandler::detect(dataset)
        .into_iter()
        .filter(|m| m.missing_count > 0)
        .collect();
    let duplicate_count = DuplicateResolver::detect(dataset, None)?.len();
    let column_types = dataset
        .descriptors()
        .into_iter()
        .map(|d| (d.name, d.column_type))
        .collect();

    Ok(QualityIssues {
        row_count: dataset.row_count(),
        missing,
        duplicate_count,
        column_types,
    })
}
