//! Command line entry point: `semantic-annotator --config <file> <command>`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::{
    annotation::{ExpansionReport, SemanticAnnotator},
    config::Config,
    logger, Result,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; built-in defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match ontology terms against every workflow and store direct annotations.
    Annotate,
    /// Generalize stored annotations, one hierarchy level per hop.
    Expand {
        #[arg(long, default_value_t = 1)]
        hops: u32,
    },
    /// Annotate, then expand for the configured number of levels.
    Run {
        /// Overrides `annotator.generalization_levels`.
        #[arg(long)]
        levels: Option<u32>,
    },
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Parses arguments, runs the requested command and prints its report.
///
/// # Errors
///
/// Returns configuration, logger and store failures.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    logger::init(&config.logger)?;

    if let Commands::Run {
        levels: Some(levels),
    } = cli.command
    {
        config.annotator.generalization_levels = levels;
    }

    let annotator = SemanticAnnotator::from_config(&config.store, config.annotator).await?;
    match cli.command {
        Commands::Annotate => print_json(&annotator.annotate().await?),
        Commands::Expand { hops } => {
            let mut reports: Vec<ExpansionReport> = Vec::new();
            for _ in 0..hops {
                reports.push(annotator.expand().await?);
            }
            print_json(&reports)
        }
        Commands::Run { .. } => print_json(&annotator.run().await?),
    }
}
