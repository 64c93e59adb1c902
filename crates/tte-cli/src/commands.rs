//! Subcommand handlers for `tte run` and `tte check`.

use anyhow::{Context, Result};

use tte_cli::analysis::{Overrides, RunOptions, RunReport, load_config, run_analysis};
use tte_cli::report::{eligibility_table, outcome_table, priority_table};

use crate::cli::{CheckArgs, RunArgs};

pub fn run_derivation(args: &RunArgs) -> Result<RunReport> {
    let options = RunOptions {
        roster: args.roster.clone(),
        config: args.config.clone(),
        output: args.output.clone(),
        diagnostic: args.diagnostic.clone(),
        overrides: Overrides {
            time_units: args.time_units,
            blanking: args.blanking,
            minimum_follow_up: args.minimum_follow_up,
            debug: args.debug,
        },
    };
    run_analysis(&options)
}

pub fn run_check(args: &CheckArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let catalog = config
        .validate()
        .context("invalid analysis configuration")?;
    println!("Analysis: {}", config.analysis_name);
    println!(
        "Time units: {}  Blanking: {}  Minimum follow-up: {}",
        config.time_units, config.blanking, config.minimum_follow_up
    );
    println!("{}", priority_table(&catalog));
    Ok(())
}

pub fn print_run_summary(report: &RunReport) {
    let result = &report.result;
    println!("Analysis: {}", report.config.analysis_name);
    println!("Output: {}", report.output.display());
    if let Some(path) = &report.diagnostic {
        println!("Timeline: {}", path.display());
    }
    println!("{}", outcome_table(&result.summary));
    println!("{}", eligibility_table(&result.summary));
    if !result.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &result.warnings {
            eprintln!("- {warning}");
        }
    }
}
