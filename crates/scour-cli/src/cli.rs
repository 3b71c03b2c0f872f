//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scour: clean and analyze tabular public-health data
#[derive(Parser)]
#[command(name = "scour")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report missing values, duplicates and column types
    Profile {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a cleaning recipe and print the report
    Clean {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the JSON cleaning recipe
        #[arg(short, long)]
        recipe: PathBuf,

        /// Write the cleaned data here (format from extension: csv, tsv, json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summary statistics, optionally grouped
    Summary {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Columns to summarize (default: all numeric columns)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Group by these columns
        #[arg(short, long, value_delimiter = ',', requires = "target")]
        group_by: Vec<String>,

        /// Column to aggregate per group
        #[arg(short, long)]
        target: Option<String>,

        /// Aggregation functions: sum, mean, count, min, max
        #[arg(short, long, value_delimiter = ',', default_value = "sum,mean,count")]
        agg: Vec<String>,
    },

    /// Time trend of a value column
    Trend {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Date column
        #[arg(short, long)]
        date: String,

        /// Value column
        #[arg(long)]
        value: String,

        /// Moving average window
        #[arg(short, long, default_value = "7")]
        window: usize,

        /// Summarize each group of this column separately
        #[arg(short, long)]
        group_by: Option<String>,
    },
}
