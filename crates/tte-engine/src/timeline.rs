//! Timeline construction.
//!
//! Merges event occurrences (every non-missing cell of every event column,
//! on every roster row) with the per-subject censor summaries into one
//! deduplicated sequence per subject, in `(date, priority rank)` order.
//!
//! Column configuration errors (duplicates, overlaps, empty censor set) are
//! ruled out by [`ColumnCatalog`] construction; this stage adds the data
//! check that every subject is censorable.

use tracing::debug;
use tte_model::{ColumnCatalog, ColumnRole, DateObservation};

use crate::aggregate::aggregate_censors;
use crate::error::DataIntegrityError;
use crate::roster::Roster;

/// All observations of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub subject: usize,
    pub observations: Vec<DateObservation>,
}

impl Timeline {
    /// True if at least one observation comes from a censor column.
    pub fn has_censor(&self, catalog: &ColumnCatalog) -> bool {
        self.observations
            .iter()
            .any(|obs| catalog.column(obs.rank).role.is_censor())
    }
}

/// Build one timeline per roster subject, in roster order.
///
/// # Errors
///
/// Returns [`DataIntegrityError::UncensoredSubjects`] listing every subject
/// with no censor observation after aggregation.
pub fn build_timelines(
    roster: &Roster,
    catalog: &ColumnCatalog,
) -> Result<Vec<Timeline>, DataIntegrityError> {
    let mut observations: Vec<DateObservation> = catalog
        .with_role(ColumnRole::Event)
        .flat_map(|column| {
            roster
                .column_dates(column.rank)
                .map(move |(subject, date)| DateObservation::new(subject, date, column.rank))
        })
        .collect();
    let event_count = observations.len();

    for role in [ColumnRole::EarlyCensor, ColumnRole::LateCensor] {
        if let Some(aggregation) = role.aggregation() {
            observations.extend(aggregate_censors(roster, catalog.with_role(role), aggregation));
        }
    }

    // (subject, date, rank) order; identical triples collapse to one
    observations.sort_unstable();
    observations.dedup();

    let mut timelines: Vec<Timeline> = (0..roster.subject_count())
        .map(|subject| Timeline {
            subject,
            observations: Vec::new(),
        })
        .collect();
    for obs in observations {
        timelines[obs.subject].observations.push(obs);
    }

    let uncensored: Vec<_> = timelines
        .iter()
        .filter(|timeline| !timeline.has_censor(catalog))
        .map(|timeline| roster.subject(timeline.subject).clone())
        .collect();
    if !uncensored.is_empty() {
        return Err(DataIntegrityError::UncensoredSubjects {
            subjects: uncensored,
        });
    }

    debug!(
        subjects = timelines.len(),
        event_occurrences = event_count,
        observations = timelines.iter().map(|t| t.observations.len()).sum::<usize>(),
        "timelines built"
    );

    Ok(timelines)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
    use tte_model::{AnalysisConfig, PriorityRank, SubjectId};

    use super::*;

    fn build(
        columns: Vec<(&str, Vec<Option<&str>>)>,
        config: &AnalysisConfig,
    ) -> Result<Vec<Timeline>, DataIntegrityError> {
        let cols: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Series::new(name.into(), values).into_column())
            .collect();
        let df = DataFrame::new(cols).unwrap();
        let catalog = config.validate().unwrap();
        let roster = Roster::from_frame(&df, config, &catalog).unwrap();
        build_timelines(&roster, &catalog)
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::new("id", "start")
            .with_event_group("A", ["a1", "a2"])
            .with_early_censors(["death"])
            .with_late_censors(["contact"])
    }

    #[test]
    fn test_multi_row_events_are_all_candidates() {
        let timelines = build(
            vec![
                ("id", vec![Some("S"), Some("S"), Some("S")]),
                ("start", vec![Some("2025-01-01"), None, None]),
                ("a1", vec![Some("2025-03-01"), Some("2025-02-01"), Some("2025-03-01")]),
                ("a2", vec![None, None, Some("2025-02-01")]),
                ("death", vec![None, None, None]),
                ("contact", vec![Some("2025-05-01"), Some("2025-06-01"), None]),
            ],
            &config(),
        )
        .unwrap();

        assert_eq!(timelines.len(), 1);
        let ranks: Vec<(String, u32)> = timelines[0]
            .observations
            .iter()
            .map(|o| (o.date.format("%m-%d").to_string(), o.rank.0))
            .collect();
        // duplicate a1 on 03-01 collapses; late censor keeps the maximum
        assert_eq!(
            ranks,
            vec![
                ("02-01".to_string(), 0),
                ("02-01".to_string(), 1),
                ("03-01".to_string(), 0),
                ("06-01".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_uncensored_subjects_fail_with_identifiers() {
        let err = build(
            vec![
                ("id", vec![Some("S1"), Some("S2"), Some("S3")]),
                ("start", vec![Some("2025-01-01"); 3]),
                ("a1", vec![Some("2025-03-01"), None, None]),
                ("a2", vec![None, None, None]),
                ("death", vec![None, None, Some("2025-04-01")]),
                ("contact", vec![None, None, None]),
            ],
            &config(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            DataIntegrityError::UncensoredSubjects {
                subjects: vec![SubjectId::from("S1"), SubjectId::from("S2")]
            }
        );
    }

    #[test]
    fn test_every_subject_gets_a_timeline() {
        let timelines = build(
            vec![
                ("id", vec![Some("S1"), Some("S2")]),
                ("start", vec![None, Some("2025-01-01")]),
                ("a1", vec![None, None]),
                ("a2", vec![None, None]),
                ("death", vec![Some("2025-04-01"), None]),
                ("contact", vec![None, Some("2025-05-01")]),
            ],
            &config(),
        )
        .unwrap();

        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].observations[0].rank, PriorityRank(2));
        assert_eq!(timelines[1].observations[0].rank, PriorityRank(3));
    }
}
