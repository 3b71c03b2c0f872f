//! Data cleaning: missing values, duplicates, type conversion, range and
//! outlier checks, text normalization, and the pipeline that chains them.

mod coerce;
mod duplicates;
mod issues;
mod missing;
mod outliers;
mod pipeline;
mod recipe;
mod report;
mod text;

pub use coerce::{ErrorPolicy, TypeCoercer};
pub use duplicates::{DuplicateResolver, Keep};
pub use issues::{QualityIssues, detect_issues};
pub use missing::{FillValue, MissingStrategy, MissingSummary, MissingValueHandler};
pub use outliers::{OutlierDetector, OutlierMethod, RangeValidator};
pub use pipeline::CleaningPipeline;
pub use recipe::{CleaningRecipe, CleaningStep, ConversionTarget};
pub use report::{CleaningReport, ReportEntry};
pub use text::{TextNormalizer, TextOptions};

pub(crate) use outliers::check_bounds;
