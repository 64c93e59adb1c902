//! Outcome resolution.
//!
//! Each subject's observations are ordered by `(date, priority rank)`. Blanked
//! observations and ineligible subjects are then dropped and the first
//! remaining observation is the subject's outcome.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::debug;
use tte_model::{ColumnCatalog, DateObservation, Outcome, PriorityRank, TimeSpan};

use crate::eligibility::{AnnotatedObservation, AnnotatedTimeline};

/// The selected observation of one subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOutcome {
    pub subject: usize,
    pub observation: DateObservation,
    pub outcome: Outcome,
    /// Elapsed time from start to the selected observation, in time units.
    pub time: f64,
    /// Potential follow-up, in time units.
    pub observation_time: f64,
}

/// Sort key within one subject.
fn resolution_key(obs: &AnnotatedObservation) -> (NaiveDateTime, PriorityRank) {
    (obs.observation.date, obs.observation.rank)
}

/// Order every subject's observations by date, then priority rank.
pub fn order_timelines(timelines: &mut [AnnotatedTimeline]) {
    timelines
        .par_iter_mut()
        .for_each(|timeline| timeline.observations.sort_by_key(resolution_key));
}

/// Resolve one subject, or `None` if nothing survives filtering.
pub fn resolve_subject(
    timeline: &AnnotatedTimeline,
    catalog: &ColumnCatalog,
    time_units: TimeSpan,
) -> Option<ResolvedOutcome> {
    let window = &timeline.window;
    if !window.is_eligible() {
        return None;
    }
    let start = window.start?;
    let observation_time = window.observation_time?;

    let selected = timeline
        .observations
        .iter()
        .filter(|obs| obs.is_selectable())
        .min_by_key(|obs| resolution_key(obs))?
        .observation;

    Some(ResolvedOutcome {
        subject: window.subject,
        observation: selected,
        outcome: catalog.column(selected.rank).outcome,
        time: time_units.count_in(selected.date - start),
        observation_time,
    })
}

/// Resolve every subject. Output is in subject order and only holds
/// subjects with an outcome.
pub fn select_outcomes(
    timelines: &[AnnotatedTimeline],
    catalog: &ColumnCatalog,
    time_units: TimeSpan,
) -> Vec<ResolvedOutcome> {
    let resolved: Vec<ResolvedOutcome> = timelines
        .par_iter()
        .filter_map(|timeline| resolve_subject(timeline, catalog, time_units))
        .collect();

    debug!(
        subjects = timelines.len(),
        resolved = resolved.len(),
        events = resolved.iter().filter(|r| r.outcome.is_event()).count(),
        "outcomes selected"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use tte_model::AnalysisConfig;

    use super::*;
    use crate::eligibility::SubjectWindow;

    fn date(value: &str) -> NaiveDateTime {
        tte_common::parse_timestamp(value).unwrap()
    }

    fn catalog() -> ColumnCatalog {
        AnalysisConfig::new("id", "start")
            .with_event_group("X", ["x"])
            .with_event_group("Y", ["y"])
            .with_early_censors(["censor"])
            .validate()
            .unwrap()
    }

    fn window(followup_ok: Option<bool>) -> SubjectWindow {
        SubjectWindow {
            subject: 0,
            start: Some(date("2025-01-01")),
            blank_cutoff: Some(date("2025-01-01")),
            reference_censor: date("2025-03-01"),
            followup_cutoff: Some(date("2025-03-01")),
            followup_ok,
            observation_time: Some(59.0),
        }
    }

    fn obs(day: &str, rank: u32, blanked: bool) -> AnnotatedObservation {
        AnnotatedObservation {
            observation: DateObservation::new(0, date(day), PriorityRank(rank)),
            blanked: Some(blanked),
        }
    }

    #[test]
    fn test_same_day_event_beats_censor() {
        let timeline = AnnotatedTimeline {
            window: window(Some(true)),
            observations: vec![obs("2025-03-01", 2, false), obs("2025-03-01", 0, false)],
        };
        let resolved = resolve_subject(&timeline, &catalog(), TimeSpan::days(1)).unwrap();
        assert_eq!(resolved.outcome, Outcome::Event(0));
        assert_eq!(resolved.time, 59.0);
    }

    #[test]
    fn test_same_day_competing_events_follow_listing() {
        let timeline = AnnotatedTimeline {
            window: window(Some(true)),
            observations: vec![obs("2025-02-01", 1, false), obs("2025-02-01", 0, false)],
        };
        let resolved = resolve_subject(&timeline, &catalog(), TimeSpan::days(1)).unwrap();
        assert_eq!(resolved.observation.rank, PriorityRank(0));
    }

    #[test]
    fn test_blanked_event_falls_through_to_censor() {
        let timeline = AnnotatedTimeline {
            window: window(Some(true)),
            observations: vec![obs("2025-01-10", 0, true), obs("2025-03-01", 2, false)],
        };
        let resolved = resolve_subject(&timeline, &catalog(), TimeSpan::days(1)).unwrap();
        assert_eq!(resolved.outcome, Outcome::Censored);
        assert_eq!(resolved.time, resolved.observation_time);
    }

    #[test]
    fn test_ineligible_subject_has_no_outcome() {
        let timeline = AnnotatedTimeline {
            window: window(Some(false)),
            observations: vec![obs("2025-01-10", 0, false), obs("2025-03-01", 2, false)],
        };
        assert!(resolve_subject(&timeline, &catalog(), TimeSpan::days(1)).is_none());

        let missing_start = AnnotatedTimeline {
            window: window(None),
            observations: vec![obs("2025-03-01", 2, false)],
        };
        assert!(resolve_subject(&missing_start, &catalog(), TimeSpan::days(1)).is_none());
    }

    #[test]
    fn test_order_timelines() {
        let mut timelines = vec![AnnotatedTimeline {
            window: window(Some(true)),
            observations: vec![
                obs("2025-03-01", 2, false),
                obs("2025-03-01", 0, false),
                obs("2025-01-10", 1, true),
            ],
        }];
        order_timelines(&mut timelines);
        let ranks: Vec<u32> = timelines[0]
            .observations
            .iter()
            .map(|o| o.observation.rank.0)
            .collect();
        assert_eq!(ranks, vec![1, 0, 2]);
    }

    #[test]
    fn test_weeks_as_time_units() {
        let timeline = AnnotatedTimeline {
            window: window(Some(true)),
            observations: vec![obs("2025-01-15", 0, false)],
        };
        let resolved = resolve_subject(&timeline, &catalog(), TimeSpan::weeks(1)).unwrap();
        assert_eq!(resolved.time, 2.0);
    }
}
