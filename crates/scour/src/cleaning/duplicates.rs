//! Duplicate row detection and removal.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScourError};
use crate::schema::{Dataset, ValueKey};

/// Which member of a duplicate group survives removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keep {
    /// Keep the first occurrence.
    #[default]
    First,
    /// Keep the last occurrence.
    Last,
    /// Drop every member of a duplicate group.
    None,
}

impl Keep {
    pub fn name(&self) -> &'static str {
        match self {
            Keep::First => "first",
            Keep::Last => "last",
            Keep::None => "none",
        }
    }
}

impl FromStr for Keep {
    type Err = ScourError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Keep::First),
            "last" => Ok(Keep::Last),
            "none" | "false" => Ok(Keep::None),
            _ => Err(ScourError::InvalidStrategy {
                kind: "keep policy",
                name: s.to_string(),
            }),
        }
    }
}

/// Detects and removes duplicate rows.
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Rows that repeat an earlier row across the compared columns (`None` = all).
    pub fn detect(dataset: &Dataset, subset: Option<&[&str]>) -> Result<Vec<usize>> {
        let keys = row_keys(dataset, subset)?;
        let mut seen = HashSet::with_capacity(keys.len());
        Ok(keys
            .into_iter()
            .enumerate()
            .filter(|(_, key)| !seen.insert(key.clone()))
            .map(|(idx, _)| idx)
            .collect())
    }

    /// Remove duplicate rows, preserving the order of retained rows.
    pub fn remove(dataset: &Dataset, subset: Option<&[&str]>, keep: Keep) -> Result<Dataset> {
        let keys = row_keys(dataset, subset)?;

        let mask: Vec<bool> = match keep {
            Keep::First => {
                let mut seen = HashSet::with_capacity(keys.len());
                keys.iter().map(|key| seen.insert(key)).collect()
            }
            Keep::Last => {
                let mut seen = HashSet::with_capacity(keys.len());
                let mut mask: Vec<bool> = keys.iter().rev().map(|key| seen.insert(key)).collect();
                mask.reverse();
                mask
            }
            Keep::None => {
                let mut counts: HashMap<&Vec<ValueKey>, usize> = HashMap::with_capacity(keys.len());
                for key in &keys {
                    *counts.entry(key).or_insert(0) += 1;
                }
                keys.iter().map(|key| counts[key] == 1).collect()
            }
        };

        Ok(dataset.filter_rows(&mask))
    }
}

fn row_keys(dataset: &Dataset, subset: Option<&[&str]>) -> Result<Vec<Vec<ValueKey>>> {
    let columns = dataset.resolve_columns(subset)?;
    Ok(dataset
        .rows()
        .iter()
        .map(|row| columns.iter().map(|&c| row[c].key()).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, Value};

    fn make_dataset() -> Dataset {
        Dataset::from_rows(
            vec![ColumnDescriptor::text("country"), ColumnDescriptor::numeric("year")],
            vec![
                vec!["UK".into(), 2021.into()],
                vec!["FR".into(), 2021.into()],
                vec!["UK".into(), 2021.into()],
                vec!["UK".into(), 2022.into()],
                vec![Value::Missing, 2020.into()],
                vec![Value::Missing, 2020.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_detect_all_columns() {
        let ds = make_dataset();
        assert_eq!(DuplicateResolver::detect(&ds, None).unwrap(), vec![2, 5]);
    }

    #[test]
    fn test_detect_subset() {
        let ds = make_dataset();
        assert_eq!(
            DuplicateResolver::detect(&ds, Some(&["country"])).unwrap(),
            vec![2, 3, 5]
        );
    }

    #[test]
    fn test_remove_keep_first() {
        let ds = make_dataset();
        let out = DuplicateResolver::remove(&ds, Some(&["country"]), Keep::First).unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.get(0, 1), Some(&Value::Number(2021.0)));
    }

    #[test]
    fn test_remove_keep_last() {
        let ds = make_dataset();
        let out = DuplicateResolver::remove(&ds, Some(&["country"]), Keep::Last).unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.get(0, 0), Some(&Value::text("FR")));
        assert_eq!(out.get(1, 1), Some(&Value::Number(2022.0)));
    }

    #[test]
    fn test_remove_keep_none() {
        let ds = make_dataset();
        let out = DuplicateResolver::remove(&ds, None, Keep::None).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.get(0, 0), Some(&Value::text("FR")));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let ds = make_dataset();
        let once = DuplicateResolver::remove(&ds, None, Keep::First).unwrap();
        let twice = DuplicateResolver::remove(&once, None, Keep::First).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_subset_column() {
        let ds = make_dataset();
        assert!(DuplicateResolver::detect(&ds, Some(&["region"])).is_err());
    }

    #[test]
    fn test_keep_from_str() {
        assert_eq!("last".parse::<Keep>().unwrap(), Keep::Last);
        assert!("middle".parse::<Keep>().is_err());
    }
}
