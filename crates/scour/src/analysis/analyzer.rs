//! Chainable analysis session over a dataset.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use tracing::debug;

use super::aggregate::{AggregationSpec, Aggregator, SummaryStatistics};
use super::filter::{ConditionSpec, FilterEngine};
use super::trend::{TrendAnalyzer, TrendSummary, rolling_mean};
use crate::error::Result;
use crate::schema::{ColumnType, Dataset, Value};

/// Applies filters and derived columns in sequence and answers summary queries
/// about the current view.
///
/// A failed step leaves the current view unchanged.
#[derive(Debug, Clone)]
pub struct DataAnalyzer {
    original: Dataset,
    data: Dataset,
    operations: Vec<String>,
}

impl DataAnalyzer {
    pub fn new(data: Dataset) -> Self {
        Self {
            original: data.clone(),
            data,
            operations: Vec::new(),
        }
    }

    /// Keep rows whose `column` equals any of `values`.
    pub fn filter_by(&mut self, column: &str, values: &[Value]) -> Result<&mut Self> {
        self.data = FilterEngine::filter_by_column(&self.data, column, values)?;
        let shown: Vec<String> = values.iter().map(Value::to_string).collect();
        self.log(format!("filter_by('{}', [{}])", column, shown.join(", ")));
        Ok(self)
    }

    pub fn filter_by_date(
        &mut self,
        column: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<&mut Self> {
        self.data = FilterEngine::filter_by_date_range(&self.data, column, start, end)?;
        let show = |d: Option<NaiveDateTime>| d.map_or("..".to_string(), |d| Value::from(d).to_string());
        self.log(format!("filter_by_date('{}', {}, {})", column, show(start), show(end)));
        Ok(self)
    }

    pub fn filter_by_conditions(&mut self, conditions: &[(&str, ConditionSpec)]) -> Result<&mut Self> {
        self.data = FilterEngine::filter_by_multiple_criteria(&self.data, conditions)?;
        let columns: Vec<&str> = conditions.iter().map(|(c, _)| *c).collect();
        self.log(format!("filter_by_conditions({})", columns.join(", ")));
        Ok(self)
    }

    /// Add `<column>_ma`, the moving average of `column` in row order.
    ///
    /// Rows are assumed to already be in chronological order.
    pub fn moving_average(&mut self, column: &str, window: usize) -> Result<&mut Self> {
        let col = self.data.require_column(column, ColumnType::Numeric)?;
        let values: Vec<Option<f64>> = self.data.column_values(col).map(Value::as_f64).collect();
        let averages = rolling_mean(&values, window)?;

        let mut next = self.data.clone();
        next.add_column(
            format!("{}_ma", column),
            ColumnType::Numeric,
            averages.into_iter().map(Value::from).collect(),
        )?;
        self.data = next;
        self.log(format!("moving_average('{}', {})", column, window));
        Ok(self)
    }

    /// Replace the view with the grouped aggregate table.
    pub fn aggregate(&mut self, spec: &AggregationSpec) -> Result<&mut Self> {
        let table = Aggregator::group_and_aggregate(&self.data, spec)?;
        self.data = table.to_dataset()?;
        let functions: Vec<&str> = spec.functions.iter().map(|f| f.name()).collect();
        self.log(format!(
            "aggregate([{}], '{}', [{}])",
            spec.group_by.join(", "),
            spec.target,
            functions.join(", ")
        ));
        Ok(self)
    }

    /// The current view.
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Summary statistics of the current view; `None` selects numeric columns.
    pub fn summary(&self, columns: Option<&[&str]>) -> Result<IndexMap<String, SummaryStatistics>> {
        Aggregator::get_column_statistics(&self.data, columns)
    }

    pub fn trends(&self, date_column: &str, value_column: &str) -> Result<TrendSummary> {
        TrendAnalyzer::summarize(&self.data, date_column, value_column)
    }

    pub fn trends_by(
        &self,
        date_column: &str,
        value_column: &str,
        group_column: &str,
    ) -> Result<IndexMap<String, TrendSummary>> {
        TrendAnalyzer::summarize_trends_by(&self.data, date_column, value_column, group_column)
    }

    pub fn compare(
        &self,
        group_column: &str,
        value_column: &str,
    ) -> Result<IndexMap<String, SummaryStatistics>> {
        Aggregator::compare_groups(&self.data, group_column, value_column)
    }

    /// Restore the original dataset and clear the log.
    pub fn reset(&mut self) -> &mut Self {
        self.data = self.original.clone();
        self.operations.clear();
        self
    }

    pub fn operations_log(&self) -> &[String] {
        &self.operations
    }

    fn log(&mut self, operation: String) {
        debug!(rows = self.data.row_count(), %operation, "analysis step");
        self.operations.push(operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AggFunc;
    use crate::error::ScourError;
    use crate::schema::ColumnDescriptor;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![
                ColumnDescriptor::text("country"),
                ColumnDescriptor::datetime("date"),
                ColumnDescriptor::numeric("cases"),
            ],
            vec![
                vec!["UK".into(), day(1).into(), 10.into()],
                vec!["UK".into(), day(2).into(), 20.into()],
                vec!["UK".into(), day(3).into(), 30.into()],
                vec!["FR".into(), day(1).into(), 5.into()],
                vec!["FR".into(), day(2).into(), Value::Missing],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_chained_filters_and_summary() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        analyzer
            .filter_by("country", &["UK".into()])
            .unwrap()
            .filter_by_date("date", Some(day(2)), None)
            .unwrap();

        assert_eq!(analyzer.data().row_count(), 2);
        let summary = analyzer.summary(Some(&["cases"])).unwrap();
        assert_eq!(summary["cases"].sum, 50.0);
        assert_eq!(analyzer.operations_log().len(), 2);
        assert_eq!(analyzer.operations_log()[0], "filter_by('country', [UK])");
    }

    #[test]
    fn test_moving_average_column() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        analyzer
            .filter_by("country", &["UK".into()])
            .unwrap()
            .moving_average("cases", 2)
            .unwrap();

        let data = analyzer.data();
        let ma = data.column_index("cases_ma").unwrap();
        let values: Vec<f64> = data.numeric_values(ma);
        assert_eq!(values, vec![10.0, 15.0, 25.0]);
    }

    #[test]
    fn test_moving_average_skips_missing() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        analyzer.moving_average("cases", 2).unwrap();
        let data = analyzer.data();
        assert_eq!(data.value(4, "cases_ma").unwrap(), &Value::Number(5.0));
    }

    #[test]
    fn test_failed_step_keeps_view() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        analyzer.filter_by("country", &["UK".into()]).unwrap();
        let err = analyzer.moving_average("country", 2).unwrap_err();
        assert!(matches!(err, ScourError::InvalidColumn { .. }));
        assert_eq!(analyzer.data().row_count(), 3);
        assert_eq!(analyzer.operations_log().len(), 1);
    }

    #[test]
    fn test_aggregate_replaces_view() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        let spec = AggregationSpec::new(&["country"], "cases", &[AggFunc::Sum]).sorted();
        analyzer.aggregate(&spec).unwrap();

        let data = analyzer.data();
        assert_eq!(data.column_names(), vec!["country", "cases_sum"]);
        assert_eq!(data.value(0, "country").unwrap(), &Value::text("UK"));
        assert_eq!(data.value(0, "cases_sum").unwrap(), &Value::Number(60.0));
    }

    #[test]
    fn test_trends_and_compare() {
        let analyzer = DataAnalyzer::new(make_dataset());
        let by_country = analyzer.trends_by("date", "cases", "country").unwrap();
        assert_eq!(by_country["UK"].growth_percent, Some(200.0));

        let groups = analyzer.compare("country", "cases").unwrap();
        assert_eq!(groups["FR"].count, 1);
    }

    #[test]
    fn test_reset() {
        let mut analyzer = DataAnalyzer::new(make_dataset());
        analyzer.filter_by("country", &["FR".into()]).unwrap();
        analyzer.reset();
        assert_eq!(analyzer.data().row_count(), 5);
        assert!(analyzer.operations_log().is_empty());
    }
}
