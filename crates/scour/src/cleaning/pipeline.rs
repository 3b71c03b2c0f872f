//! Chainable cleaning pipeline with an audit report.

use tracing::{debug, instrument, warn};

use super::coerce::ErrorPolicy;
use super::duplicates::Keep;
use super::issues::{QualityIssues, detect_issues};
use super::missing::MissingStrategy;
use super::outliers::OutlierMethod;
use super::recipe::{CleaningRecipe, CleaningStep, ConversionTarget};
use super::report::{CleaningReport, ReportEntry};
use super::text::TextOptions;
use crate::error::{Result, ScourError};
use crate::schema::Dataset;

/// Applies cleaning stages in order, keeping the latest snapshot and a report.
///
/// A failing stage leaves the snapshot and report of the last successful stage
/// in place; every later call returns [`ScourError::PipelineHalted`].
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    data: Dataset,
    report: CleaningReport,
    failed_stage: Option<String>,
}

impl CleaningPipeline {
    pub fn new(data: Dataset) -> Self {
        let report = CleaningReport::new(data.row_count(), data.column_count());
        Self {
            data,
            report,
            failed_stage: None,
        }
    }

    /// Quality overview of the current snapshot.
    pub fn detect_issues(&self) -> Result<QualityIssues> {
        detect_issues(&self.data)
    }

    pub fn handle_missing(
        &mut self,
        strategy: MissingStrategy,
        columns: Option<&[&str]>,
    ) -> Result<&mut Self> {
        self.apply_step(CleaningStep::HandleMissing {
            strategy,
            columns: owned_names(columns),
        })
    }

    pub fn remove_duplicates(&mut self, subset: Option<&[&str]>, keep: Keep) -> Result<&mut Self> {
        self.apply_step(CleaningStep::RemoveDuplicates {
            subset: owned_names(subset),
            keep,
        })
    }

    pub fn convert_numeric(&mut self, column: &str, errors: ErrorPolicy) -> Result<&mut Self> {
        self.apply_step(CleaningStep::ConvertType {
            column: column.to_string(),
            target: ConversionTarget::Numeric,
            format: None,
            errors,
        })
    }

    pub fn convert_datetime(
        &mut self,
        column: &str,
        format: Option<&str>,
        errors: ErrorPolicy,
    ) -> Result<&mut Self> {
        self.apply_step(CleaningStep::ConvertType {
            column: column.to_string(),
            target: ConversionTarget::Datetime,
            format: format.map(str::to_string),
            errors,
        })
    }

    pub fn standardize_text(&mut self, column: &str, options: TextOptions) -> Result<&mut Self> {
        self.apply_step(CleaningStep::StandardizeText {
            column: column.to_string(),
            options,
        })
    }

    /// Keep only rows whose value lies in `[min, max]`.
    pub fn filter_by_range(
        &mut self,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<&mut Self> {
        self.apply_step(CleaningStep::FilterByRange {
            column: column.to_string(),
            min,
            max,
        })
    }

    /// Drop rows flagged as outliers.
    pub fn remove_outliers(
        &mut self,
        column: &str,
        method: OutlierMethod,
        threshold: Option<f64>,
    ) -> Result<&mut Self> {
        self.apply_step(CleaningStep::RemoveOutliers {
            column: column.to_string(),
            method,
            threshold,
        })
    }

    /// Apply one step and record it.
    #[instrument(skip(self), fields(operation = step.name(), rows = self.data.row_count()))]
    pub fn apply_step(&mut self, step: CleaningStep) -> Result<&mut Self> {
        if let Some(stage) = &self.failed_stage {
            return Err(ScourError::PipelineHalted {
                stage: stage.clone(),
            });
        }

        let next = match step.apply(&self.data) {
            Ok(next) => next,
            Err(err) => {
                warn!(error = %err, "cleaning stage failed");
                self.failed_stage = Some(step.name().to_string());
                return Err(err);
            }
        };

        let entry = build_entry(&step, &self.data, &next)?;
        debug!(
            rows_affected = entry.rows_affected,
            rows_removed = entry.rows_removed,
            "cleaning stage applied"
        );

        self.report.record(entry, next.row_count(), next.column_count());
        self.data = next;
        Ok(self)
    }

    /// Apply every step of a recipe in order, stopping at the first failure.
    #[instrument(skip_all, fields(steps = recipe.steps.len()))]
    pub fn apply_recipe(&mut self, recipe: &CleaningRecipe) -> Result<&mut Self> {
        for step in &recipe.steps {
            self.apply_step(step.clone())?;
        }
        Ok(self)
    }

    /// The current snapshot.
    pub fn get_cleaned_data(&self) -> &Dataset {
        &self.data
    }

    pub fn report(&self) -> &CleaningReport {
        &self.report
    }

    /// Stage that halted the pipeline, if any.
    pub fn failed_stage(&self) -> Option<&str> {
        self.failed_stage.as_deref()
    }

    /// Consume the pipeline, returning the final snapshot and its report.
    pub fn finish(self) -> (Dataset, CleaningReport) {
        (self.data, self.report)
    }
}

fn owned_names(names: Option<&[&str]>) -> Option<Vec<String>> {
    names.map(|names| names.iter().map(|n| n.to_string()).collect())
}

fn build_entry(step: &CleaningStep, before: &Dataset, after: &Dataset) -> Result<ReportEntry> {
    let rows_removed = before.row_count().saturating_sub(after.row_count());

    let (rows_affected, columns) = if before.row_count() == after.row_count() {
        changed_cells(before, after)
    } else {
        let named = step.columns();
        let columns = if named.is_empty() {
            before.column_names().iter().map(|c| c.to_string()).collect()
        } else {
            named
        };
        (rows_removed, columns)
    };

    Ok(ReportEntry {
        operation: step.name().to_string(),
        description: step.description(),
        columns,
        rows_affected,
        rows_removed,
        parameters: serde_json::to_value(step)?,
    })
}

/// Rows with a changed cell, and columns whose values or type changed.
fn changed_cells(before: &Dataset, after: &Dataset) -> (usize, Vec<String>) {
    let column_count = before.column_count().min(after.column_count());
    let mut changed_columns = vec![false; column_count];
    let mut rows_affected = 0;

    for (old, new) in before.rows().iter().zip(after.rows()) {
        let mut row_changed = false;
        for col in 0..column_count {
            if old[col] != new[col] {
                changed_columns[col] = true;
                row_changed = true;
            }
        }
        if row_changed {
            rows_affected += 1;
        }
    }

    let before_types = before.descriptors();
    let after_types = after.descriptors();
    let columns = (0..column_count)
        .filter(|&col| changed_columns[col] || before_types[col] != after_types[col])
        .filter_map(|col| before.column_name(col).map(str::to_string))
        .collect();

    (rows_affected, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, ColumnType, Value};

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![
                ColumnDescriptor::text("country"),
                ColumnDescriptor::text("cases"),
                ColumnDescriptor::numeric("year"),
            ],
            vec![
                vec![" UK".into(), "1,000".into(), 2020.into()],
                vec!["fr ".into(), Value::Missing, 2020.into()],
                vec![" UK".into(), "1,000".into(), 2020.into()],
                vec!["DE".into(), "abc".into(), 2021.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_chained_stages() {
        let mut pipeline = CleaningPipeline::new(make_dataset());
        pipeline
            .remove_duplicates(None, Keep::First)
            .unwrap()
            .convert_numeric("cases", ErrorPolicy::Coerce)
            .unwrap()
            .handle_missing(MissingStrategy::Drop, Some(&["cases"]))
            .unwrap()
            .standardize_text("country", TextOptions::default().with_lowercase(true))
            .unwrap();

        let data = pipeline.get_cleaned_data();
        assert_eq!(data.row_count(), 1);
        assert_eq!(data.column_type("cases").unwrap(), ColumnType::Numeric);
        assert_eq!(data.get(0, 0), Some(&Value::text("uk")));

        let report = pipeline.report();
        assert_eq!(report.operations_applied(), 4);
        assert_eq!(report.original_rows, 4);
        assert_eq!(report.cleaned_rows, 1);
        assert_eq!(report.rows_removed, 3);
        assert_eq!(report.operations[0].rows_removed, 1);
        assert_eq!(report.operations[1].columns, vec!["cases"]);
        assert_eq!(report.operations[1].rows_affected, 2);
        assert_eq!(report.columns_affected, vec!["country", "cases", "year"]);
    }

    #[test]
    fn test_parameters_record_the_step() {
        let mut pipeline = CleaningPipeline::new(make_dataset());
        pipeline
            .remove_outliers("year", OutlierMethod::Zscore, Some(1.0))
            .unwrap();
        let params = &pipeline.report().operations[0].parameters;
        assert_eq!(params["operation"], "remove_outliers");
        assert_eq!(params["method"], "zscore");
        assert_eq!(params["threshold"], 1.0);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut pipeline = CleaningPipeline::new(make_dataset());
        pipeline.remove_duplicates(None, Keep::First).unwrap();

        let err = pipeline.convert_numeric("cases", ErrorPolicy::Raise).unwrap_err();
        assert!(matches!(err, ScourError::TypeConversion { .. }));
        assert_eq!(pipeline.failed_stage(), Some("convert_type"));

        let halted = pipeline.remove_duplicates(None, Keep::First).unwrap_err();
        assert!(matches!(halted, ScourError::PipelineHalted { .. }));

        // Last successful snapshot is still available.
        assert_eq!(pipeline.get_cleaned_data().row_count(), 3);
        assert_eq!(pipeline.report().operations_applied(), 1);
    }

    #[test]
    fn test_unknown_column_halts() {
        let mut pipeline = CleaningPipeline::new(make_dataset());
        let err = pipeline.filter_by_range("deaths", Some(0.0), None).unwrap_err();
        assert!(matches!(err, ScourError::InvalidColumn { .. }));
        assert!(pipeline.handle_missing(MissingStrategy::Mode, None).is_err());
    }

    #[test]
    fn test_apply_recipe() {
        let recipe = CleaningRecipe::from_json(
            r#"{"steps": [
                {"operation": "remove_duplicates"},
                {"operation": "convert_type", "column": "cases", "target": "numeric", "errors": "coerce"},
                {"operation": "handle_missing", "strategy": "constant", "value": 0, "columns": ["cases"]},
                {"operation": "filter_by_range", "column": "cases", "min": 1}
            ]}"#,
        )
        .unwrap();

        let mut pipeline = CleaningPipeline::new(make_dataset());
        pipeline.apply_recipe(&recipe).unwrap();
        let (data, report) = pipeline.finish();
        assert_eq!(data.row_count(), 1);
        assert_eq!(data.get(0, 1), Some(&Value::Number(1000.0)));
        assert_eq!(report.operations_applied(), 4);
    }

    #[test]
    fn test_detect_issues_on_snapshot() {
        let mut pipeline = CleaningPipeline::new(make_dataset());
        assert_eq!(pipeline.detect_issues().unwrap().duplicate_count, 1);
        pipeline.remove_duplicates(None, Keep::First).unwrap();
        assert_eq!(pipeline.detect_issues().unwrap().duplicate_count, 0);
    }
}
