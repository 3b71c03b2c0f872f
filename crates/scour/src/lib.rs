//! Scour: cleaning and analysis engine for tabular datasets.
//!
//! Scour repairs data-quality problems in a loaded dataset and derives filtered
//! views and statistical summaries from the result.
//!
//! # Core Principles
//!
//! - **Explicit strategies**: every repair is selected by a closed enum, never a bare string
//! - **Snapshots**: operations return a new dataset and leave their input untouched
//! - **Audited**: every pipeline stage is recorded in a [`CleaningReport`]
//!
//! # Example
//!
//! ```no_run
//! use scour::{CleaningPipeline, ErrorPolicy, Keep, MissingStrategy, Parser};
//!
//! let (dataset, _source) = Parser::new().parse_file("cases.csv").unwrap();
//!
//! let mut pipeline = CleaningPipeline::new(dataset);
//! pipeline
//!     .remove_duplicates(None, Keep::First)
//!     .unwrap()
//!     .convert_numeric("cases", ErrorPolicy::Coerce)
//!     .unwrap()
//!     .handle_missing(MissingStrategy::Median, Some(&["cases"]))
//!     .unwrap();
//!
//! println!("Rows removed: {}", pipeline.report().rows_removed);
//! ```

pub mod analysis;
pub mod cleaning;
pub mod error;
pub mod export;
pub mod input;
pub mod schema;

pub use analysis::{
    AggFunc, AggregationSpec, Aggregator, ConditionSpec, DataAnalyzer, FilterCriterion,
    FilterEngine, TrendAnalyzer, TrendSeries, TrendSummary,
};
pub use cleaning::{
    CleaningPipeline, CleaningRecipe, CleaningReport, CleaningStep, DuplicateResolver,
    ErrorPolicy, Keep, MissingStrategy, MissingValueHandler, OutlierDetector, OutlierMethod,
    RangeValidator, TextNormalizer, TextOptions, TypeCoercer, detect_issues,
};
pub use error::{Result, ScourError};
pub use export::{ExportFormat, write_file};
pub use input::{Parser, ParserConfig, SourceMetadata};
pub use schema::{ColumnDescriptor, ColumnType, Dataset, Value};
