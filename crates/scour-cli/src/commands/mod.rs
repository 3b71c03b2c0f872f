//! CLI command implementations.

pub mod clean;
pub mod profile;
pub mod summary;
pub mod trend;

use std::path::Path;

use colored::Colorize;
use scour::{Dataset, Parser};

/// Load a data file, announcing it on stdout.
fn load(file: &Path, verb: &str) -> Result<Dataset, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        verb.cyan().bold(),
        file.display().to_string().white()
    );

    let (dataset, _) = Parser::new().parse_file(file)?;
    Ok(dataset)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
