//! Trend command - growth, moving average and direction of a series.

use std::path::PathBuf;

use colored::{ColoredString, Colorize};
use scour::analysis::Direction;
use scour::{TrendAnalyzer, TrendSummary};

use super::{fmt_opt, load};

pub fn run(
    file: PathBuf,
    date: String,
    value: String,
    window: usize,
    group_by: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(&file, "Analyzing")?;

    if let Some(group) = group_by {
        let summaries = TrendAnalyzer::summarize_trends_by(&dataset, &date, &value, &group)?;
        println!();
        for (key, summary) in &summaries {
            print_summary(key, summary);
        }
        return Ok(());
    }

    let series = TrendAnalyzer::calculate_trends(&dataset, &date, &value)?;
    let series = TrendAnalyzer::calculate_growth_rate(&series);
    let series = TrendAnalyzer::calculate_moving_average(&series, window)?;

    if verbose {
        println!();
        println!(
            "{}",
            format!("{:20} {:>12} {:>10} {:>12}", date, value, "growth", format!("ma{}", window))
                .yellow()
                .bold()
        );
        for point in &series.points {
            println!(
                "{:20} {:>12.2} {:>10} {:>12}",
                point.timestamp.to_string(),
                point.value,
                point.growth_rate.map_or_else(|| "-".to_string(), |g| format!("{:.1}%", g * 100.0)),
                fmt_opt(point.moving_average)
            );
        }
    }

    println!();
    let summary = TrendSummary::from_series(&series)?;
    print_summary(&value, &summary);

    Ok(())
}

fn print_summary(label: &str, summary: &TrendSummary) {
    println!(
        "  {:20} {} points, total {:.2}, {} -> {} ({}) {}",
        label.white().bold(),
        summary.points,
        summary.total,
        summary.first_value,
        summary.last_value,
        summary
            .growth_percent
            .map_or_else(|| "n/a".to_string(), |g| format!("{:+.1}%", g)),
        colored_direction(summary.direction)
    );
}

fn colored_direction(direction: Direction) -> ColoredString {
    match direction {
        Direction::Increasing => direction.to_string().red(),
        Direction::Decreasing => direction.to_string().green(),
        Direction::Stable => direction.to_string().blue(),
    }
}
