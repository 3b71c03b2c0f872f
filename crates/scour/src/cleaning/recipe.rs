//! Serializable cleaning steps and recipes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::coerce::{ErrorPolicy, TypeCoercer};
use super::duplicates::{DuplicateResolver, Keep};
use super::missing::{MissingStrategy, MissingValueHandler};
use super::outliers::{OutlierDetector, OutlierMethod, RangeValidator};
use super::text::{TextNormalizer, TextOptions};
use crate::error::{Result, ScourError};
use crate::schema::Dataset;

/// Target type for a conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionTarget {
    Numeric,
    Datetime,
}

/// One cleaning stage with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum CleaningStep {
    HandleMissing {
        #[serde(flatten)]
        strategy: MissingStrategy,
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    RemoveDuplicates {
        #[serde(default)]
        subset: Option<Vec<String>>,
        #[serde(default)]
        keep: Keep,
    },
    ConvertType {
        column: String,
        target: ConversionTarget,
        #[serde(default)]
        format: Option<String>,
        #[serde(default)]
        errors: ErrorPolicy,
    },
    StandardizeText {
        column: String,
        #[serde(flatten)]
        options: TextOptions,
    },
    FilterByRange {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    RemoveOutliers {
        column: String,
        #[serde(default)]
        method: OutlierMethod,
        #[serde(default)]
        threshold: Option<f64>,
    },
}

impl CleaningStep {
    /// Operation name as it appears in reports.
    pub fn name(&self) -> &'static str {
        match self {
            CleaningStep::HandleMissing { .. } => "handle_missing",
            CleaningStep::RemoveDuplicates { .. } => "remove_duplicates",
            CleaningStep::ConvertType { .. } => "convert_type",
            CleaningStep::StandardizeText { .. } => "standardize_text",
            CleaningStep::FilterByRange { .. } => "filter_by_range",
            CleaningStep::RemoveOutliers { .. } => "remove_outliers",
        }
    }

    /// Get a human-readable description of the step.
    pub fn description(&self) -> String {
        match self {
            CleaningStep::HandleMissing { strategy, columns } => {
                format!("Handle missing values with '{}' in {}", strategy.name(), describe(columns))
            }
            CleaningStep::RemoveDuplicates { subset, keep } => {
                format!("Remove duplicates over {} (keep {})", describe(subset), keep.name())
            }
            CleaningStep::ConvertType { column, target, .. } => {
                let target = match target {
                    ConversionTarget::Numeric => "numeric",
                    ConversionTarget::Datetime => "datetime",
                };
                format!("Convert '{}' to {}", column, target)
            }
            CleaningStep::StandardizeText { column, options } => {
                let mut ops = Vec::new();
                if options.strip {
                    ops.push("strip");
                }
                if options.lowercase {
                    ops.push("lowercase");
                }
                if options.remove_special {
                    ops.push("remove special characters");
                }
                format!("Standardize text in '{}': {}", column, ops.join(", "))
            }
            CleaningStep::FilterByRange { column, min, max } => {
                let lo = min.map_or("-inf".to_string(), |v| v.to_string());
                let hi = max.map_or("inf".to_string(), |v| v.to_string());
                format!("Keep '{}' within [{}, {}]", column, lo, hi)
            }
            CleaningStep::RemoveOutliers {
                column,
                method,
                threshold,
            } => {
                let threshold = threshold.unwrap_or_else(|| method.default_threshold());
                format!(
                    "Remove outliers in '{}' ({}, threshold {})",
                    column,
                    method.name(),
                    threshold
                )
            }
        }
    }

    /// Columns the step names explicitly; empty means every column.
    pub fn columns(&self) -> Vec<String> {
        match self {
            CleaningStep::HandleMissing { columns, .. } => columns.clone().unwrap_or_default(),
            CleaningStep::RemoveDuplicates { subset, .. } => subset.clone().unwrap_or_default(),
            CleaningStep::ConvertType { column, .. }
            | CleaningStep::StandardizeText { column, .. }
            | CleaningStep::FilterByRange { column, .. }
            | CleaningStep::RemoveOutliers { column, .. } => vec![column.clone()],
        }
    }

    /// Run the step against a dataset, producing a new one.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        match self {
            CleaningStep::HandleMissing { strategy, columns } => {
                let names = borrow_names(columns);
                MissingValueHandler::handle(dataset, strategy, names.as_deref())
            }
            CleaningStep::RemoveDuplicates { subset, keep } => {
                let names = borrow_names(subset);
                DuplicateResolver::remove(dataset, names.as_deref(), *keep)
            }
            CleaningStep::ConvertType {
                column,
                target,
                format,
                errors,
            } => match target {
                ConversionTarget::Numeric => TypeCoercer::to_numeric(dataset, column, *errors),
                ConversionTarget::Datetime => {
                    TypeCoercer::to_datetime(dataset, column, format.as_deref(), *errors)
                }
            },
            CleaningStep::StandardizeText { column, options } => {
                TextNormalizer::standardize(dataset, column, *options)
            }
            CleaningStep::FilterByRange { column, min, max } => {
                let mask = RangeValidator::validate_range(dataset, column, *min, *max)?;
                Ok(dataset.filter_rows(&mask))
            }
            CleaningStep::RemoveOutliers {
                column,
                method,
                threshold,
            } => {
                let outliers = OutlierDetector::detect_outliers(dataset, column, *method, *threshold)?;
                let keep: Vec<bool> = outliers.iter().map(|o| !o).collect();
                Ok(dataset.filter_rows(&keep))
            }
        }
    }
}

fn borrow_names(names: &Option<Vec<String>>) -> Option<Vec<&str>> {
    names
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect())
}

fn describe(columns: &Option<Vec<String>>) -> String {
    match columns {
        Some(names) if !names.is_empty() => format!("{:?}", names),
        _ => "all columns".to_string(),
    }
}

/// An ordered list of cleaning steps, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningRecipe {
    pub steps: Vec<CleaningStep>,
}

impl CleaningRecipe {
    pub fn new(steps: Vec<CleaningStep>) -> Self {
        Self { steps }
    }

    /// Parse a recipe from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a recipe from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScourError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, Value};

    const RECIPE: &str = r#"{
        "steps": [
            {"operation": "convert_type", "column": "cases", "target": "numeric", "errors": "coerce"},
            {"operation": "handle_missing", "strategy": "median", "columns": ["cases"]},
            {"operation": "standardize_text", "column": "country", "lowercase": true},
            {"operation": "remove_duplicates"},
            {"operation": "remove_outliers", "column": "cases", "method": "zscore", "threshold": 2.5}
        ]
    }"#;

    #[test]
    fn test_recipe_from_json() {
        let recipe = CleaningRecipe::from_json(RECIPE).unwrap();
        assert_eq!(recipe.steps.len(), 5);
        assert_eq!(
            recipe.steps[1],
            CleaningStep::HandleMissing {
                strategy: MissingStrategy::Median,
                columns: Some(vec!["cases".to_string()]),
            }
        );
        assert_eq!(
            recipe.steps[2],
            CleaningStep::StandardizeText {
                column: "country".to_string(),
                options: TextOptions::default().with_lowercase(true),
            }
        );
        assert_eq!(
            recipe.steps[3],
            CleaningStep::RemoveDuplicates {
                subset: None,
                keep: Keep::First,
            }
        );
    }

    #[test]
    fn test_recipe_json_roundtrip() {
        let recipe = CleaningRecipe::from_json(RECIPE).unwrap();
        let json = recipe.to_json().unwrap();
        assert_eq!(CleaningRecipe::from_json(&json).unwrap(), recipe);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let json = r#"{"steps": [{"operation": "interpolate", "column": "cases"}]}"#;
        assert!(matches!(CleaningRecipe::from_json(json), Err(ScourError::Json(_))));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let json = r#"{"steps": [{"operation": "handle_missing", "strategy": "guess"}]}"#;
        assert!(CleaningRecipe::from_json(json).is_err());
    }

    #[test]
    fn test_apply_filter_by_range() {
        let ds = Dataset::from_rows(
            vec![ColumnDescriptor::numeric("cases")],
            vec![vec![1.into()], vec![50.into()], vec![Value::Missing]],
        )
        .unwrap();
        let step = CleaningStep::FilterByRange {
            column: "cases".to_string(),
            min: Some(10.0),
            max: None,
        };
        let out = step.apply(&ds).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(step.description(), "Keep 'cases' within [10, inf]");
    }

    #[test]
    fn test_missing_recipe_file() {
        let err = CleaningRecipe::from_file("/nonexistent/recipe.json").unwrap_err();
        assert!(matches!(err, ScourError::Io { .. }));
    }
}
