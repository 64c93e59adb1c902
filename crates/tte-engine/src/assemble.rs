//! Result assembly.
//!
//! Resolved outcomes are left-joined onto the roster: every subject appears
//! once, in roster order, with missing fields when nothing was resolved.

use chrono::NaiveDateTime;
use polars::prelude::{
    Column, DataFrame, DataType, FrozenCategories, IntoColumn, NamedFrom, Series,
};
use tte_common::format_timestamp;
use tte_model::{
    AnalysisConfig, ColumnCatalog, DIAGNOSTIC_COLUMNS, Outcome, OutcomeLevels, PriorityRank,
    SubjectId,
};

use crate::eligibility::AnnotatedTimeline;
use crate::error::Result;
use crate::resolve::ResolvedOutcome;
use crate::roster::Roster;

// === Output naming ===

/// Column names of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumns {
    pub identifier: String,
    pub time: String,
    pub outcome: String,
    pub outcome_code: String,
    pub observation_time: String,
}

impl OutputColumns {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let [time, outcome, outcome_code, observation_time] = config.output_column_names();
        Self {
            identifier: config.identifier.clone(),
            time,
            outcome,
            outcome_code,
            observation_time,
        }
    }
}

/// Presentation labels for the four derived columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabels {
    pub time: String,
    pub outcome: String,
    pub outcome_code: String,
    pub observation_time: String,
}

impl ColumnLabels {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let name = config.analysis_name.trim();
        let name = if name.is_empty() { "outcome" } else { name };
        let units = config.time_units.unit_label();
        Self {
            time: format!("Time to {name} ({units})"),
            outcome: format!("{name} outcome"),
            outcome_code: format!("{name} outcome (integer)"),
            observation_time: format!("Observation time ({units})"),
        }
    }
}

// === Result records ===

/// One row of the result table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub subject: SubjectId,
    pub time: Option<f64>,
    pub outcome: Option<Outcome>,
    pub label: Option<String>,
    pub code: Option<u32>,
    pub observation_time: Option<f64>,
    /// Date of the selected observation.
    pub outcome_date: Option<NaiveDateTime>,
    /// Source column of the selected observation.
    pub source_column: Option<String>,
}

impl OutcomeRecord {
    fn unresolved(subject: SubjectId) -> Self {
        Self {
            subject,
            time: None,
            outcome: None,
            label: None,
            code: None,
            observation_time: None,
            outcome_date: None,
            source_column: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Join resolved outcomes onto the roster.
pub fn assemble_records(
    roster: &Roster,
    resolved: &[ResolvedOutcome],
    catalog: &ColumnCatalog,
) -> Vec<OutcomeRecord> {
    let mut by_subject: Vec<Option<&ResolvedOutcome>> = vec![None; roster.subject_count()];
    for outcome in resolved {
        by_subject[outcome.subject] = Some(outcome);
    }

    roster
        .subjects()
        .iter()
        .zip(by_subject)
        .map(|(subject, resolved)| match resolved {
            None => OutcomeRecord::unresolved(subject.clone()),
            Some(r) => OutcomeRecord {
                subject: subject.clone(),
                time: Some(r.time),
                outcome: Some(r.outcome),
                label: Some(catalog.levels().name(r.outcome).to_string()),
                code: Some(r.outcome.code()),
                observation_time: Some(r.observation_time),
                outcome_date: Some(r.observation.date),
                source_column: Some(catalog.column(r.observation.rank).name.clone()),
            },
        })
        .collect()
}

/// Enum dtype over the outcome levels, `Censored` first.
pub fn outcome_dtype(levels: &OutcomeLevels) -> Result<DataType> {
    let categories = FrozenCategories::new(levels.names().iter().map(String::as_str))?;
    Ok(DataType::from_frozen_categories(categories))
}

/// Build the result table from records.
///
/// The outcome column is an Enum over `levels`, so every level is present
/// even when no subject has it.
pub fn records_to_frame(
    records: &[OutcomeRecord],
    columns: &OutputColumns,
    levels: &OutcomeLevels,
) -> Result<DataFrame> {
    let mut times = Vec::with_capacity(records.len());
    let mut labels = Vec::with_capacity(records.len());
    let mut codes = Vec::with_capacity(records.len());
    let mut observation_times = Vec::with_capacity(records.len());

    for record in records {
        times.push(record.time);
        labels.push(record.label.clone());
        codes.push(record.code.map(i64::from));
        observation_times.push(record.observation_time);
    }

    let df = DataFrame::new(vec![
        identifier_column(&columns.identifier, records.iter().map(|r| &r.subject)),
        Series::new(columns.time.as_str().into(), times).into_column(),
        Series::new(columns.outcome.as_str().into(), labels)
            .cast(&outcome_dtype(levels)?)?
            .into_column(),
        Series::new(columns.outcome_code.as_str().into(), codes).into_column(),
        Series::new(columns.observation_time.as_str().into(), observation_times).into_column(),
    ])?;
    Ok(df)
}

/// Integer identifiers stay integers; anything else is written as text.
fn identifier_column<'a>(name: &str, ids: impl Iterator<Item = &'a SubjectId> + Clone) -> Column {
    let ints: Option<Vec<i64>> = ids.clone().map(SubjectId::as_int).collect();
    match ints {
        Some(values) => Series::new(name.into(), values).into_column(),
        None => {
            let values: Vec<String> = ids.map(ToString::to_string).collect();
            Series::new(name.into(), values).into_column()
        }
    }
}

// === Diagnostic timeline ===

/// One row of the annotated, pre-filter timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRow {
    pub subject: SubjectId,
    pub start: Option<NaiveDateTime>,
    pub blank_cutoff: Option<NaiveDateTime>,
    pub date: NaiveDateTime,
    pub source_column: String,
    pub rank: PriorityRank,
    pub outcome: String,
    pub blanked: Option<bool>,
    pub followup_cutoff: Option<NaiveDateTime>,
    pub followup_ok: Option<bool>,
    pub observation_time: Option<f64>,
}

/// Flatten annotated timelines in subject order, then `(date, rank)`.
pub fn diagnostic_rows(
    roster: &Roster,
    timelines: &[AnnotatedTimeline],
    catalog: &ColumnCatalog,
) -> Vec<DiagnosticRow> {
    timelines
        .iter()
        .flat_map(|timeline| {
            let window = &timeline.window;
            timeline.observations.iter().map(move |annotated| {
                let obs = annotated.observation;
                let column = catalog.column(obs.rank);
                DiagnosticRow {
                    subject: roster.subject(window.subject).clone(),
                    start: window.start,
                    blank_cutoff: window.blank_cutoff,
                    date: obs.date,
                    source_column: column.name.clone(),
                    rank: obs.rank,
                    outcome: catalog.outcome_name(obs.rank).to_string(),
                    blanked: annotated.blanked,
                    followup_cutoff: window.followup_cutoff,
                    followup_ok: window.followup_ok,
                    observation_time: window.observation_time,
                }
            })
        })
        .collect()
}

/// Build the diagnostic table. Dates are written as ISO 8601 text.
pub fn diagnostic_to_frame(rows: &[DiagnosticRow], identifier: &str) -> Result<DataFrame> {
    let iso = |d: Option<NaiveDateTime>| d.map(format_timestamp);
    let [
        start_date,
        blank_cutoff,
        date,
        source_column,
        priority_rank,
        outcome,
        blanked,
        followup_cutoff,
        followup_ok,
        observation_time,
    ] = DIAGNOSTIC_COLUMNS;

    let df = DataFrame::new(vec![
        identifier_column(identifier, rows.iter().map(|r| &r.subject)),
        Series::new(
            start_date.into(),
            rows.iter().map(|r| iso(r.start)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            blank_cutoff.into(),
            rows.iter().map(|r| iso(r.blank_cutoff)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            date.into(),
            rows.iter().map(|r| format_timestamp(r.date)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            source_column.into(),
            rows.iter().map(|r| r.source_column.clone()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            priority_rank.into(),
            rows.iter().map(|r| i64::from(r.rank.0)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            outcome.into(),
            rows.iter().map(|r| r.outcome.clone()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            blanked.into(),
            rows.iter().map(|r| r.blanked).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            followup_cutoff.into(),
            rows.iter().map(|r| iso(r.followup_cutoff)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            followup_ok.into(),
            rows.iter().map(|r| r.followup_ok).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            observation_time.into(),
            rows.iter().map(|r| r.observation_time).collect::<Vec<_>>(),
        )
        .into_column(),
    ])?;
    Ok(df)
}

// === Summary ===

/// Counts for reporting a finished derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub subjects: usize,
    pub resolved: usize,
    /// Subjects with a start date that failed minimum follow-up.
    pub ineligible: usize,
    pub missing_start: usize,
    /// Subjects per outcome level, Censored first. Zero counts are kept.
    pub outcome_counts: Vec<(String, usize)>,
}

impl AnalysisSummary {
    pub fn new(
        timelines: &[AnnotatedTimeline],
        records: &[OutcomeRecord],
        levels: &OutcomeLevels,
    ) -> Self {
        let mut counts = vec![0usize; levels.len()];
        for outcome in records.iter().filter_map(|r| r.outcome) {
            counts[outcome.code() as usize] += 1;
        }
        Self {
            subjects: records.len(),
            resolved: records.iter().filter(|r| r.is_resolved()).count(),
            ineligible: timelines
                .iter()
                .filter(|t| t.window.followup_ok == Some(false))
                .count(),
            missing_start: timelines.iter().filter(|t| t.window.start.is_none()).count(),
            outcome_counts: levels.names().iter().cloned().zip(counts).collect(),
        }
    }
}
