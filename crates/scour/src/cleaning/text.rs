//! Text column normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{ColumnType, Dataset, Value};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Which normalizations to apply. Strip runs before case-folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub lowercase: bool,
    pub strip: bool,
    /// Keep alphanumerics and single interior spaces only.
    pub remove_special: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            lowercase: false,
            strip: true,
            remove_special: false,
        }
    }
}

impl TextOptions {
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn with_remove_special(mut self, remove_special: bool) -> Self {
        self.remove_special = remove_special;
        self
    }

    /// Apply the selected normalizations to one string.
    pub fn apply(&self, input: &str) -> String {
        let mut text = if self.strip {
            input.trim().to_string()
        } else {
            input.to_string()
        };

        if self.lowercase {
            text = text.to_lowercase();
        }

        if self.remove_special {
            let kept: String = text
                .chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace())
                .collect();
            text = WHITESPACE_RUN.replace_all(kept.trim(), " ").into_owned();
        }

        text
    }
}

/// Normalizes text columns.
pub struct TextNormalizer;

impl TextNormalizer {
    /// Normalize every non-missing value of a text column.
    pub fn standardize(dataset: &Dataset, column: &str, options: TextOptions) -> Result<Dataset> {
        let col = dataset.require_column(column, ColumnType::Text)?;
        let mut out = dataset.clone();

        for row in out.rows_mut() {
            if let Value::Text(s) = &row[col] {
                row[col] = Value::Text(options.apply(s));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScourError;
    use crate::schema::ColumnDescriptor;

    fn column(values: &[&str]) -> Dataset {
        Dataset::from_rows(
            vec![ColumnDescriptor::text("disease"), ColumnDescriptor::numeric("cases")],
            values.iter().map(|v| vec![Value::text(*v), 1.into()]).collect(),
        )
        .unwrap()
    }

    fn texts(ds: &Dataset) -> Vec<String> {
        ds.column_values(0).map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_strip_and_lowercase() {
        let ds = column(&["  UK ", "USA"]);
        let out =
            TextNormalizer::standardize(&ds, "disease", TextOptions::default().with_lowercase(true))
                .unwrap();
        assert_eq!(texts(&out), vec!["uk", "usa"]);
    }

    #[test]
    fn test_no_strip() {
        let ds = column(&["  UK "]);
        let options = TextOptions::default().with_strip(false);
        let out = TextNormalizer::standardize(&ds, "disease", options).unwrap();
        assert_eq!(texts(&out), vec!["  UK "]);
    }

    #[test]
    fn test_remove_special_collapses_whitespace() {
        let ds = column(&["COVID-19", "H1N1 (Swine Flu)", "Influenza  A/B ", " - x - "]);
        let options = TextOptions::default().with_remove_special(true);
        let out = TextNormalizer::standardize(&ds, "disease", options).unwrap();
        assert_eq!(texts(&out), vec!["COVID19", "H1N1 Swine Flu", "Influenza AB", "x"]);
    }

    #[test]
    fn test_numeric_column_rejected() {
        let ds = column(&["a"]);
        assert!(matches!(
            TextNormalizer::standardize(&ds, "cases", TextOptions::default()),
            Err(ScourError::InvalidColumn { .. })
        ));
    }
}
