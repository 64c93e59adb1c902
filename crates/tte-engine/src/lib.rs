//! Time-to-event derivation engine.
//!
//! Turns a subject roster with event and censor date columns into one
//! time-to-outcome row per subject. The stages run in a fixed order:
//!
//! 1. **roster**: read identifiers and dates from the DataFrame
//! 2. **aggregate**: collapse censor columns per subject (earliest / latest)
//! 3. **timeline**: merge event occurrences and censor summaries per subject
//! 4. **eligibility**: blanking flags, follow-up cutoff, observation time
//! 5. **resolve**: first surviving observation by `(date, priority rank)`
//! 6. **assemble**: left-join onto the roster and build output tables
//!
//! Every stage is a pure function of its inputs. Configuration and data
//! integrity errors abort the whole call; no partial result is returned.
//!
//! # Example
//!
//! ```no_run
//! use polars::prelude::DataFrame;
//! use tte_engine::compute_time_to_event;
//! use tte_model::{AnalysisConfig, TimeSpan};
//!
//! # fn run(roster: &DataFrame) -> tte_engine::Result<()> {
//! let config = AnalysisConfig::new("subject_id", "index_date")
//!     .with_analysis_name("Surgery")
//!     .with_event_group("Surgery", ["surgery_date"])
//!     .with_early_censors(["death_date"])
//!     .with_late_censors(["last_contact"])
//!     .with_blanking(TimeSpan::days(30));
//!
//! let result = compute_time_to_event(roster, &config)?;
//! println!("{}", result.table);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod assemble;
pub mod eligibility;
pub mod error;
pub mod resolve;
pub mod roster;
pub mod timeline;

use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};
use tte_model::{AnalysisConfig, OutcomeLevels};

pub use assemble::{
    AnalysisSummary, ColumnLabels, DiagnosticRow, OutcomeRecord, OutputColumns,
};
pub use eligibility::EligibilityRules;
pub use error::{AnalysisError, AnalysisWarning, DataIntegrityError, Result};
pub use roster::Roster;

/// The annotated, pre-filter timeline returned in debug mode.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub table: DataFrame,
    pub rows: Vec<DiagnosticRow>,
}

/// Output of [`compute_time_to_event`].
#[derive(Debug, Clone)]
pub struct TimeToEventResult {
    /// One row per roster subject, in roster order.
    pub table: DataFrame,
    pub records: Vec<OutcomeRecord>,
    /// Outcome levels; `Censored` is always first with code 0.
    pub levels: OutcomeLevels,
    pub columns: OutputColumns,
    pub labels: ColumnLabels,
    pub summary: AnalysisSummary,
    pub warnings: Vec<AnalysisWarning>,
    /// Present only when `debug` is set.
    pub diagnostic: Option<Diagnostic>,
}

/// Derive time-to-outcome for every subject of `roster`.
///
/// The roster is never modified.
///
/// # Errors
///
/// - [`AnalysisError::Config`] for an invalid configuration
/// - [`AnalysisError::MissingColumns`] if configured columns are absent
/// - [`AnalysisError::DataIntegrity`] for missing identifiers or subjects
///   without any censor date
pub fn compute_time_to_event(
    roster: &DataFrame,
    config: &AnalysisConfig,
) -> Result<TimeToEventResult> {
    let span = info_span!("time_to_event", analysis = %config.analysis_name);
    let _guard = span.enter();

    let catalog = config.validate()?;
    let subjects = Roster::from_frame(roster, config, &catalog)?;
    let timelines = timeline::build_timelines(&subjects, &catalog)?;

    let rules = EligibilityRules::from_config(config);
    let mut annotated = eligibility::annotate(&subjects, &timelines, &catalog, rules)?;
    resolve::order_timelines(&mut annotated);

    let mut warnings = subjects.warnings().to_vec();
    let missing_start: Vec<_> = subjects
        .starts()
        .iter()
        .enumerate()
        .filter(|(_, start)| start.is_none())
        .map(|(index, _)| subjects.subject(index).clone())
        .collect();
    if !missing_start.is_empty() {
        warnings.push(AnalysisWarning::MissingStartDate {
            subjects: missing_start,
        });
    }
    for warning in &warnings {
        warn!(%warning, "time-to-event warning");
    }

    let resolved = resolve::select_outcomes(&annotated, &catalog, rules.time_units);
    let records = assemble::assemble_records(&subjects, &resolved, &catalog);
    let columns = OutputColumns::from_config(config);
    let table = assemble::records_to_frame(&records, &columns, catalog.levels())?;
    let summary = AnalysisSummary::new(&annotated, &records, catalog.levels());

    let diagnostic = if config.debug {
        let rows = assemble::diagnostic_rows(&subjects, &annotated, &catalog);
        let table = assemble::diagnostic_to_frame(&rows, &config.identifier)?;
        Some(Diagnostic { table, rows })
    } else {
        None
    };

    info!(
        subjects = summary.subjects,
        resolved = summary.resolved,
        ineligible = summary.ineligible,
        missing_start = summary.missing_start,
        warnings = warnings.len(),
        "time-to-event derived"
    );

    Ok(TimeToEventResult {
        table,
        records,
        levels: catalog.levels().clone(),
        columns,
        labels: ColumnLabels::from_config(config),
        summary,
        warnings,
        diagnostic,
    })
}
