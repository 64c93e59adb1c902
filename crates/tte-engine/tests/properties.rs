//! Property-based tests for outcome resolution.
//!
//! Rosters are generated as day offsets from a fixed origin and checked
//! against a direct per-subject computation.

use chrono::{Days, NaiveDate};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;

use tte_engine::compute_time_to_event;
use tte_model::{AnalysisConfig, TimeSpan};

#[derive(Debug, Clone)]
struct SubjectDays {
    start: u64,
    relapse: Option<u64>,
    death: Option<u64>,
    censor: u64,
}

fn day(offset: u64) -> String {
    let origin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (origin + Days::new(offset)).format("%Y-%m-%d").to_string()
}

fn roster(subjects: &[SubjectDays]) -> DataFrame {
    let ids: Vec<String> = (0..subjects.len()).map(|i| format!("S{i:03}")).collect();
    let cols: Vec<Column> = vec![
        Series::new("id".into(), ids).into_column(),
        Series::new(
            "start".into(),
            subjects.iter().map(|s| day(s.start)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "relapse".into(),
            subjects.iter().map(|s| s.relapse.map(day)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "death".into(),
            subjects.iter().map(|s| s.death.map(day)).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "censor".into(),
            subjects.iter().map(|s| day(s.censor)).collect::<Vec<_>>(),
        )
        .into_column(),
    ];
    DataFrame::new(cols).unwrap()
}

fn config(blanking: u64, minimum: u64) -> AnalysisConfig {
    AnalysisConfig::new("id", "start")
        .with_event_group("Relapse", ["relapse"])
        .with_event_group("Death", ["death"])
        .with_early_censors(["censor"])
        .with_blanking(TimeSpan::days(blanking as i64))
        .with_minimum_follow_up(TimeSpan::days(minimum as i64))
}

/// `(elapsed days, outcome code)` computed directly from the day offsets.
fn expected(subject: &SubjectDays, blanking: u64, minimum: u64) -> Option<(i64, u32)> {
    let start = subject.start as i64;
    if start > subject.censor as i64 - minimum as i64 {
        return None;
    }
    let cutoff = subject.start + blanking;
    let mut candidates = vec![(subject.censor, 2u32, 0u32)];
    if let Some(date) = subject.relapse.filter(|d| *d >= cutoff) {
        candidates.push((date, 0, 1));
    }
    if let Some(date) = subject.death.filter(|d| *d >= cutoff) {
        candidates.push((date, 1, 2));
    }
    candidates
        .into_iter()
        .min()
        .map(|(date, _, code)| (date as i64 - start, code))
}

fn subject_strategy() -> impl Strategy<Value = SubjectDays> {
    (
        0u64..60,
        prop::option::of(0u64..200),
        prop::option::of(0u64..200),
        0u64..250,
    )
        .prop_map(|(start, relapse, death, censor)| SubjectDays {
            start,
            relapse,
            death,
            censor,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Each subject resolves exactly as the direct computation says.
    #[test]
    fn resolution_matches_direct_computation(
        subjects in prop::collection::vec(subject_strategy(), 1..25),
        blanking in 0u64..60,
        minimum in 0u64..120,
    ) {
        let result = compute_time_to_event(&roster(&subjects), &config(blanking, minimum)).unwrap();
        for (subject, record) in subjects.iter().zip(&result.records) {
            let actual = record.time.zip(record.code).map(|(t, c)| (t as i64, c));
            prop_assert_eq!(actual, expected(subject, blanking, minimum), "{:?}", subject);
        }
    }

    /// Output identifiers equal input identifiers, in input order.
    #[test]
    fn roster_is_complete(
        subjects in prop::collection::vec(subject_strategy(), 1..25),
        minimum in 0u64..250,
    ) {
        let result = compute_time_to_event(&roster(&subjects), &config(0, minimum)).unwrap();
        let ids: Vec<String> = result.records.iter().map(|r| r.subject.to_string()).collect();
        let expected: Vec<String> = (0..subjects.len()).map(|i| format!("S{i:03}")).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(result.table.height(), subjects.len());
    }

    /// Repeated runs give identical tables.
    #[test]
    fn derivation_is_deterministic(
        subjects in prop::collection::vec(subject_strategy(), 1..25),
        blanking in 0u64..60,
    ) {
        let df = roster(&subjects);
        let config = config(blanking, 0).with_debug(true);
        let first = compute_time_to_event(&df, &config).unwrap();
        let second = compute_time_to_event(&df, &config).unwrap();
        prop_assert!(first.table.equals_missing(&second.table));
        prop_assert_eq!(first.records, second.records);
        let first_diag = first.diagnostic.unwrap();
        let second_diag = second.diagnostic.unwrap();
        prop_assert!(first_diag.table.equals_missing(&second_diag.table));
    }

    /// No event before start + blanking is ever selected.
    #[test]
    fn blanked_events_never_resolve(
        subjects in prop::collection::vec(subject_strategy(), 1..25),
        blanking in 0u64..90,
    ) {
        let result = compute_time_to_event(&roster(&subjects), &config(blanking, 0)).unwrap();
        for record in &result.records {
            if record.outcome.is_some_and(|o| o.is_event()) {
                prop_assert!(record.time.unwrap() >= blanking as f64);
            }
        }
    }

    /// Short follow-up leaves all four fields missing.
    #[test]
    fn short_follow_up_is_missing(
        subjects in prop::collection::vec(subject_strategy(), 1..25),
        minimum in 0u64..250,
    ) {
        let result = compute_time_to_event(&roster(&subjects), &config(0, minimum)).unwrap();
        for (subject, record) in subjects.iter().zip(&result.records) {
            if (subject.start as i64) > subject.censor as i64 - minimum as i64 {
                prop_assert!(record.time.is_none());
                prop_assert!(record.label.is_none());
                prop_assert!(record.code.is_none());
                prop_assert!(record.observation_time.is_none());
            }
        }
    }

    /// Same-day event and censor always resolve to the event.
    #[test]
    fn same_day_event_wins(start in 0u64..60, gap in 0u64..200) {
        let subject = SubjectDays {
            start,
            relapse: Some(start + gap),
            death: None,
            censor: start + gap,
        };
        let result = compute_time_to_event(&roster(&[subject]), &config(0, 0)).unwrap();
        prop_assert_eq!(result.records[0].label.as_deref(), Some("Relapse"));
        prop_assert_eq!(result.levels.names()[0].as_str(), "Censored");
    }
}
