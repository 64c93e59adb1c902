//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tte_model::TimeSpan;

#[derive(Parser)]
#[command(
    name = "tte",
    version,
    about = "Time-to-event derivation for subject rosters",
    long_about = "Derive time-to-outcome, outcome label, and observation time per subject\n\
                  from event and censor date columns, with blanking, minimum follow-up,\n\
                  and deterministic same-day tie-breaking."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow subject identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive time-to-event for a roster CSV.
    Run(RunArgs),

    /// Validate an analysis file and print the priority order.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Roster CSV with identifier, start date, event and censor columns.
    #[arg(value_name = "ROSTER")]
    pub roster: PathBuf,

    /// Analysis definition (TOML).
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Result CSV (default: <ROSTER>_tte.csv).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the annotated timeline here (implies --debug).
    #[arg(long = "diagnostic", value_name = "FILE")]
    pub diagnostic: Option<PathBuf>,

    /// Also write the annotated timeline (default: <ROSTER>_tte_timeline.csv).
    #[arg(long = "debug")]
    pub debug: bool,

    /// Time unit for elapsed times (e.g. "days", "1 week", "P1Y").
    #[arg(long = "time-units", value_name = "SPAN")]
    pub time_units: Option<TimeSpan>,

    /// Ignore events before start + this span.
    #[arg(long = "blanking", value_name = "SPAN")]
    pub blanking: Option<TimeSpan>,

    /// Exclude subjects observable for less than this span.
    #[arg(long = "minimum-follow-up", value_name = "SPAN")]
    pub minimum_follow_up: Option<TimeSpan>,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Analysis definition (TOML).
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
