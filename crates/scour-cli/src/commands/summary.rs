//! Summary command - column statistics and grouped aggregates.

use std::path::PathBuf;

use colored::Colorize;
use scour::{AggFunc, AggregationSpec, Aggregator};

use super::{fmt_opt, load};

pub fn run(
    file: PathBuf,
    columns: Vec<String>,
    group_by: Vec<String>,
    target: Option<String>,
    agg: Vec<String>,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(&file, "Summarizing")?;

    if let Some(target) = target {
        let functions = agg
            .iter()
            .map(|name| name.parse::<AggFunc>())
            .collect::<Result<Vec<_>, _>>()?;
        let keys: Vec<&str> = group_by.iter().map(String::as_str).collect();
        let spec = AggregationSpec::new(&keys, &target, &functions).sorted();
        let table = Aggregator::group_and_aggregate(&dataset, &spec)?;

        println!();
        let header: Vec<String> = table.column_names().iter().map(|c| format!("{:>14}", c)).collect();
        println!("{}", header.join(" ").yellow().bold());
        for row in &table.rows {
            let mut cells: Vec<String> = row.key.iter().map(|k| format!("{:>14}", k.to_string())).collect();
            cells.extend(row.values.iter().map(|v| format!("{:>14}", fmt_opt(*v))));
            println!("{}", cells.join(" "));
        }
        println!();
        println!("{} groups", table.rows.len().to_string().white().bold());
        return Ok(());
    }

    let selected: Vec<&str> = columns.iter().map(String::as_str).collect();
    let selection = (!selected.is_empty()).then_some(selected.as_slice());
    let stats = Aggregator::get_column_statistics(&dataset, selection)?;

    println!();
    println!(
        "{}",
        format!(
            "{:20} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "sum", "mean", "median", "min", "max", "std"
        )
        .yellow()
        .bold()
    );
    for (name, s) in &stats {
        println!(
            "{:20} {:>8} {:>12.2} {:>12} {:>12} {:>12} {:>12} {:>12}",
            name,
            s.count,
            s.sum,
            fmt_opt(s.mean),
            fmt_opt(s.median),
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.std)
        );
    }

    Ok(())
}
