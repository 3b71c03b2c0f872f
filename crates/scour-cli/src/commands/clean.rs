//! Clean command - replay a cleaning recipe over a data file.

use std::path::PathBuf;

use colored::Colorize;
use scour::{CleaningPipeline, CleaningRecipe, ExportFormat, write_file};

use super::load;

pub fn run(
    file: PathBuf,
    recipe: PathBuf,
    output: Option<PathBuf>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = CleaningRecipe::from_file(&recipe)?;
    let dataset = load(&file, "Cleaning")?;

    let mut pipeline = CleaningPipeline::new(dataset);
    let outcome = pipeline.apply_recipe(&recipe).map(|_| ());

    let report = pipeline.report();
    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for (i, entry) in report.operations.iter().enumerate() {
            println!(
                "  {} {:<18} {}",
                format!("{}.", i + 1).dimmed(),
                entry.operation.cyan(),
                entry.description
            );
            if verbose {
                println!(
                    "       {} rows affected, {} removed, columns: {}",
                    entry.rows_affected,
                    entry.rows_removed,
                    entry.columns.join(", ")
                );
            }
        }

        println!();
        println!(
            "{} {} -> {} rows ({} removed), {} -> {} columns",
            "Result:".green().bold(),
            report.original_rows,
            report.cleaned_rows.to_string().white().bold(),
            report.rows_removed.to_string().red(),
            report.original_columns,
            report.cleaned_columns
        );
    }

    if let Some(stage) = pipeline.failed_stage() {
        eprintln!("{} stage '{}' failed", "Halted:".red().bold(), stage);
    }
    outcome?;

    if let Some(path) = output {
        write_file(pipeline.get_cleaned_data(), &path, ExportFormat::from_path(&path))?;
        println!(
            "{} {}",
            "Wrote".green().bold(),
            path.display().to_string().white()
        );
    }

    Ok(())
}
