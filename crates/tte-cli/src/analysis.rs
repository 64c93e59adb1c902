//! Running an analysis file against a roster CSV.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use tte_engine::{AnalysisWarning, TimeToEventResult, compute_time_to_event};
use tte_ingest::{read_csv_table, write_csv};
use tte_model::{AnalysisConfig, TimeSpan};

use crate::logging::redact_value;

/// Command-line values that take precedence over the analysis file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub time_units: Option<TimeSpan>,
    pub blanking: Option<TimeSpan>,
    pub minimum_follow_up: Option<TimeSpan>,
    pub debug: bool,
}

impl Overrides {
    pub fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(units) = self.time_units {
            config.time_units = units;
        }
        if let Some(blanking) = self.blanking {
            config.blanking = blanking;
        }
        if let Some(minimum) = self.minimum_follow_up {
            config.minimum_follow_up = minimum;
        }
        config.debug |= self.debug;
        config
    }
}

/// Inputs of one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub roster: PathBuf,
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub diagnostic: Option<PathBuf>,
    pub overrides: Overrides,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub config: AnalysisConfig,
    pub result: TimeToEventResult,
    pub output: PathBuf,
    pub diagnostic: Option<PathBuf>,
}

/// Load an analysis definition from a TOML file.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read analysis file {}", path.display()))?;
    let config: AnalysisConfig =
        toml::from_str(&text).with_context(|| format!("parse analysis file {}", path.display()))?;
    Ok(config)
}

/// `<ROSTER>_tte.csv` next to the roster.
pub fn default_output_path(roster: &Path) -> PathBuf {
    sibling_path(roster, "tte")
}

/// `<ROSTER>_tte_timeline.csv` next to the roster.
pub fn default_diagnostic_path(roster: &Path) -> PathBuf {
    sibling_path(roster, "tte_timeline")
}

fn sibling_path(roster: &Path, suffix: &str) -> PathBuf {
    let stem = roster
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("roster");
    roster.with_file_name(format!("{stem}_{suffix}.csv"))
}

/// Load, derive, and write the result (and diagnostic) tables.
pub fn run_analysis(options: &RunOptions) -> Result<RunReport> {
    let span = info_span!("run", roster = %options.roster.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mut overrides = options.overrides;
    overrides.debug |= options.diagnostic.is_some();
    let config = overrides.apply(load_config(&options.config)?);
    config.validate().context("invalid analysis configuration")?;

    let roster = read_csv_table(&options.roster)
        .with_context(|| format!("load roster {}", options.roster.display()))?;
    info!(rows = roster.height(), columns = roster.width(), "roster loaded");

    let mut result = compute_time_to_event(&roster, &config).context("derive time to event")?;
    log_warning_subjects(&result.warnings);

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&options.roster));
    write_csv(&mut result.table, &output)
        .with_context(|| format!("write result {}", output.display()))?;

    let diagnostic = match result.diagnostic.as_mut() {
        Some(diag) => {
            let path = options
                .diagnostic
                .clone()
                .unwrap_or_else(|| default_diagnostic_path(&options.roster));
            write_csv(&mut diag.table, &path)
                .with_context(|| format!("write diagnostic timeline {}", path.display()))?;
            Some(path)
        }
        None => None,
    };

    info!(
        output = %output.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );

    Ok(RunReport {
        config,
        result,
        output,
        diagnostic,
    })
}

fn log_warning_subjects(warnings: &[AnalysisWarning]) {
    for warning in warnings {
        let subjects = match warning {
            AnalysisWarning::MissingStartDate { subjects }
            | AnalysisWarning::ConflictingStartDates { subjects } => subjects,
            AnalysisWarning::UnparseableDates { .. } => continue,
        };
        let joined = subjects
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        debug!(%warning, subjects = redact_value(&joined), "warning subjects");
    }
}
