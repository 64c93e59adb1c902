//! Censor column aggregation.
//!
//! Each censor column collapses independently to one date per subject:
//! the minimum for early censors, the maximum for late censors. Subjects
//! whose cells are all missing for a column get no summary for it.

use chrono::NaiveDateTime;
use tte_model::{Aggregation, DateObservation, SourceColumn};

use crate::roster::Roster;

/// Summarize one column per subject.
pub fn aggregate_column(
    roster: &Roster,
    column: &SourceColumn,
    aggregation: Aggregation,
) -> Vec<DateObservation> {
    let mut summary: Vec<Option<NaiveDateTime>> = vec![None; roster.subject_count()];
    for (subject, date) in roster.column_dates(column.rank) {
        let slot = &mut summary[subject];
        *slot = Some(match *slot {
            Some(current) => aggregation.combine(current, date),
            None => date,
        });
    }

    summary
        .into_iter()
        .enumerate()
        .filter_map(|(subject, date)| {
            date.map(|d| DateObservation::new(subject, d, column.rank))
        })
        .collect()
}

/// Summarize every column of one censor role.
///
/// An empty column list yields an empty result.
pub fn aggregate_censors<'a>(
    roster: &Roster,
    columns: impl IntoIterator<Item = &'a SourceColumn>,
    aggregation: Aggregation,
) -> Vec<DateObservation> {
    columns
        .into_iter()
        .flat_map(|column| aggregate_column(roster, column, aggregation))
        .collect()
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
    use tte_model::{AnalysisConfig, ColumnRole, PriorityRank};

    use super::*;

    fn roster() -> (Roster, tte_model::ColumnCatalog) {
        let cols: Vec<Column> = vec![
            ("id", vec![Some("A"), Some("A"), Some("B"), Some("C")]),
            (
                "start",
                vec![Some("2025-01-01"), None, Some("2025-01-01"), Some("2025-01-01")],
            ),
            ("event", vec![None, None, None, None]),
            (
                "visit",
                vec![Some("2025-03-01"), Some("2025-02-01"), None, Some("2025-04-01")],
            ),
            (
                "contact",
                vec![Some("2025-03-01"), Some("2025-05-01"), Some("2025-02-01"), None],
            ),
        ]
        .into_iter()
        .map(|(name, values): (&str, Vec<Option<&str>>)| {
            Series::new(name.into(), values).into_column()
        })
        .collect();
        let df = DataFrame::new(cols).unwrap();
        let config = AnalysisConfig::new("id", "start")
            .with_event_group("A", ["event"])
            .with_early_censors(["visit"])
            .with_late_censors(["contact"]);
        let catalog = config.validate().unwrap();
        let roster = Roster::from_frame(&df, &config, &catalog).unwrap();
        (roster, catalog)
    }

    fn date(value: &str) -> NaiveDateTime {
        tte_common::parse_timestamp(value).unwrap()
    }

    #[test]
    fn test_earliest_per_subject() {
        let (roster, catalog) = roster();
        let visit = catalog.column(PriorityRank(1));
        let summary = aggregate_column(&roster, visit, Aggregation::Earliest);
        assert_eq!(
            summary,
            vec![
                DateObservation::new(0, date("2025-02-01"), PriorityRank(1)),
                DateObservation::new(2, date("2025-04-01"), PriorityRank(1)),
            ]
        );
    }

    #[test]
    fn test_latest_per_subject() {
        let (roster, catalog) = roster();
        let contact = catalog.column(PriorityRank(2));
        let summary = aggregate_column(&roster, contact, Aggregation::Latest);
        assert_eq!(
            summary,
            vec![
                DateObservation::new(0, date("2025-05-01"), PriorityRank(2)),
                DateObservation::new(1, date("2025-02-01"), PriorityRank(2)),
            ]
        );
    }

    #[test]
    fn test_empty_column_list() {
        let (roster, _) = roster();
        assert!(aggregate_censors(&roster, Vec::<&SourceColumn>::new(), Aggregation::Earliest).is_empty());
    }

    #[test]
    fn test_aggregate_by_role() {
        let (roster, catalog) = roster();
        let early = aggregate_censors(
            &roster,
            catalog.with_role(ColumnRole::EarlyCensor),
            Aggregation::Earliest,
        );
        let late = aggregate_censors(
            &roster,
            catalog.with_role(ColumnRole::LateCensor),
            Aggregation::Latest,
        );
        assert_eq!(early.len(), 2);
        assert_eq!(late.len(), 2);
    }
}
