//! Audit report accumulated by the cleaning pipeline.

use serde::{Deserialize, Serialize};

/// One applied cleaning stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Operation name.
    pub operation: String,

    /// Description of the change.
    pub description: String,

    /// Columns whose values or rows were affected.
    pub columns: Vec<String>,

    /// Rows removed, or rows with at least one changed cell when none were removed.
    pub rows_affected: usize,

    /// Rows removed by this stage.
    pub rows_removed: usize,

    /// The step exactly as applied.
    pub parameters: serde_json::Value,
}

/// Ordered log of every successful stage of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original_rows: usize,
    pub cleaned_rows: usize,
    /// Original row count minus final row count.
    pub rows_removed: usize,
    pub original_columns: usize,
    pub cleaned_columns: usize,
    pub operations: Vec<ReportEntry>,
    /// Union of affected columns, in first-affected order.
    pub columns_affected: Vec<String>,
}

impl CleaningReport {
    /// Create an empty report for a dataset of the given shape.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            original_rows: rows,
            cleaned_rows: rows,
            rows_removed: 0,
            original_columns: columns,
            cleaned_columns: columns,
            operations: Vec::new(),
            columns_affected: Vec::new(),
        }
    }

    /// Append an entry and update the totals to the new shape.
    pub(crate) fn record(&mut self, entry: ReportEntry, rows: usize, columns: usize) {
        for column in &entry.columns {
            if !self.columns_affected.contains(column) {
                self.columns_affected.push(column.clone());
            }
        }
        self.operations.push(entry);
        self.cleaned_rows = rows;
        self.cleaned_columns = columns;
        self.rows_removed = self.original_rows.saturating_sub(rows);
    }

    /// Number of operations applied.
    pub fn operations_applied(&self) -> usize {
        self.operations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(operation: &str, columns: &[&str], rows_removed: usize) -> ReportEntry {
        ReportEntry {
            operation: operation.to_string(),
            description: String::new(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows_affected: rows_removed,
            rows_removed,
            parameters: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_record_updates_totals() {
        let mut report = CleaningReport::new(10, 3);
        report.record(entry("remove_duplicates", &["a", "b"], 2), 8, 3);
        report.record(entry("handle_missing", &["b", "c"], 1), 7, 3);

        assert_eq!(report.operations_applied(), 2);
        assert_eq!(report.cleaned_rows, 7);
        assert_eq!(report.rows_removed, 3);
        assert_eq!(report.columns_affected, vec!["a", "b", "c"]);
    }
}
