//! Column model: value and column types, coercion rules, and the typed dataset.

mod column;
pub mod parse;
mod table;
mod types;

pub use column::{ColumnDescriptor, NumericStatistics, percentile};
pub use table::Dataset;
pub use types::{ColumnType, Value, ValueKey};
