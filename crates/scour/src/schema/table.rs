//! Typed, row-ordered dataset with a column registry keyed by name.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde::ser::SerializeSeq;

use super::column::ColumnDescriptor;
use super::types::{ColumnType, Value};
use crate::error::{Result, ScourError};

/// Ordered rows over named, typed columns.
///
/// Every cell is either [`Value::Missing`] or a value of its column's declared type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: IndexMap<String, ColumnType>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        let mut registry = IndexMap::with_capacity(columns.len());
        for column in columns {
            if registry.contains_key(&column.name) {
                return Err(ScourError::InvalidColumn {
                    column: column.name,
                    reason: "duplicate column name".to_string(),
                });
            }
            registry.insert(column.name, column.column_type);
        }

        Ok(Self {
            columns: registry,
            rows: Vec::new(),
        })
    }

    /// Create a dataset and push every row through [`Dataset::push_row`].
    pub fn from_rows(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut dataset = Self::new(columns)?;
        dataset.rows.reserve(rows.len());
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Append a row, converting each cell to its column's type.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        let row_idx = self.rows.len();
        if row.len() != self.columns.len() {
            return Err(ScourError::Parse {
                row: row_idx,
                column: row.len(),
                message: format!("expected {} values, found {}", self.columns.len(), row.len()),
            });
        }

        let mut typed = Vec::with_capacity(row.len());
        for ((name, column_type), value) in self.columns.iter().zip(row) {
            let converted = value.coerce_to(*column_type).ok_or_else(|| ScourError::TypeConversion {
                column: name.clone(),
                row: row_idx,
                value: value.to_string(),
                target: column_type.name(),
            })?;
            typed.push(converted);
        }

        self.rows.push(typed);
        Ok(())
    }

    /// A dataset with the same columns and no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Get all column descriptors in order.
    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .map(|(name, t)| ColumnDescriptor::new(name.clone(), *t))
            .collect()
    }

    /// Position of a column, or `InvalidColumn` if absent.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .get_index_of(name)
            .ok_or_else(|| ScourError::column_not_found(name))
    }

    /// Declared type of a column.
    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| ScourError::column_not_found(name))
    }

    /// Name of the column at `index`.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get_index(index).map(|(name, _)| name.as_str())
    }

    /// Position of a column that must have the given type.
    pub fn require_column(&self, name: &str, expected: ColumnType) -> Result<usize> {
        let index = self.column_index(name)?;
        let actual = self.columns[index];
        if actual != expected {
            return Err(ScourError::wrong_type(name, expected.name(), actual));
        }
        Ok(index)
    }

    /// Resolve a column selection; `None` selects every column.
    pub fn resolve_columns(&self, names: Option<&[&str]>) -> Result<Vec<usize>> {
        match names {
            None => Ok((0..self.columns.len()).collect()),
            Some(names) => names.iter().map(|n| self.column_index(n)).collect(),
        }
    }

    /// Positions of every numeric column.
    pub fn numeric_columns(&self) -> Vec<usize> {
        self.columns
            .values()
            .enumerate()
            .filter(|(_, t)| t.is_numeric())
            .map(|(i, _)| i)
            .collect()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Non-missing numeric values of a column, in row order.
    pub fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.column_values(index).filter_map(Value::as_f64).collect()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell by column name.
    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let col = self.column_index(column)?;
        Ok(self.get(row, col).unwrap_or(&Value::Missing))
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Change a column's declared type. The caller must have converted its cells.
    pub(crate) fn set_column_type(&mut self, col: usize, column_type: ColumnType) {
        if let Some((_, t)) = self.columns.get_index_mut(col) {
            *t = column_type;
        }
    }

    /// Append a column; `values` must have one entry per row.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Value>,
    ) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(ScourError::InvalidColumn {
                column: name,
                reason: "duplicate column name".to_string(),
            });
        }
        if values.len() != self.rows.len() {
            return Err(ScourError::InvalidColumn {
                column: name,
                reason: format!("expected {} values, found {}", self.rows.len(), values.len()),
            });
        }

        let mut converted = Vec::with_capacity(values.len());
        for (row_idx, value) in values.into_iter().enumerate() {
            let typed = value.coerce_to(column_type).ok_or_else(|| ScourError::TypeConversion {
                column: name.clone(),
                row: row_idx,
                value: value.to_string(),
                target: column_type.name(),
            })?;
            converted.push(typed);
        }

        for (row, value) in self.rows.iter_mut().zip(converted) {
            row.push(value);
        }
        self.columns.insert(name, column_type);
        Ok(())
    }

    /// Rows where `mask` is true, in order. Missing mask entries count as false.
    pub fn filter_rows(&self, mask: &[bool]) -> Self {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Mutable access to every row, for in-place cell rewrites within this crate.
    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }
}

/// Serializes as an array of `{column: value}` records.
impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            let record: IndexMap<&str, &Value> = self
                .columns
                .keys()
                .map(String::as_str)
                .zip(row.iter())
                .collect();
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}
