//! Scour CLI - profile, clean and analyze tabular surveillance data.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Profile { file, json } => commands::profile::run(file, json, cli.verbose),

        Commands::Clean {
            file,
            recipe,
            output,
            json,
        } => commands::clean::run(file, recipe, output, json, cli.verbose),

        Commands::Summary {
            file,
            columns,
            group_by,
            target,
            agg,
        } => commands::summary::run(file, columns, group_by, target, agg, cli.verbose),

        Commands::Trend {
            file,
            date,
            value,
            window,
            group_by,
        } => commands::trend::run(file, date, value, window, group_by, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "scour=debug" } else { "scour=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
