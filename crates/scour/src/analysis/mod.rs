//! Analysis: filters, summary statistics, grouped aggregates and trends.

mod aggregate;
mod analyzer;
mod filter;
mod trend;

pub use aggregate::{
    AggFunc, AggregateRow, AggregateTable, AggregationSpec, Aggregator, SummaryStatistics,
};
pub use analyzer::DataAnalyzer;
pub use filter::{ConditionSpec, FilterCriterion, FilterEngine};
pub use trend::{Direction, TrendAnalyzer, TrendPoint, TrendSeries, TrendSummary};
