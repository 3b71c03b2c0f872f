//! Profile command - report data quality issues.

use std::path::PathBuf;

use colored::Colorize;
use scour::detect_issues;

use super::load;

pub fn run(file: PathBuf, json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(&file, "Profiling")?;
    let issues = detect_issues(&dataset)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&issues)?);
        return Ok(());
    }

    println!(
        "{} rows, {} columns",
        issues.row_count.to_string().white().bold(),
        issues.column_types.len().to_string().white().bold()
    );

    if verbose {
        println!();
        println!("{}", "Schema:".yellow().bold());
        for (name, column_type) in &issues.column_types {
            println!("  {:20} {}", name, column_type.name());
        }
    }

    println!();
    if issues.missing.is_empty() {
        println!("{}", "No missing values".green());
    } else {
        println!("{}", "Missing values:".yellow().bold());
        for summary in &issues.missing {
            println!(
                "  {:20} {:>6} ({:.2}%)",
                summary.column,
                summary.missing_count.to_string().red(),
                summary.missing_percentage
            );
        }
    }

    if issues.duplicate_count > 0 {
        println!(
            "{} duplicate rows",
            issues.duplicate_count.to_string().red().bold()
        );
    } else {
        println!("{}", "No duplicate rows".green());
    }

    if issues.is_clean() {
        println!();
        println!("{}", "Dataset is clean.".green().bold());
    }

    Ok(())
}
