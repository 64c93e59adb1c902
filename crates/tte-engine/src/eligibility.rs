//! Blanking and minimum follow-up annotation.
//!
//! For each subject:
//! - `blank_cutoff = start + blanking`; event observations dated strictly
//!   before it are blanked. Censor observations are never blanked.
//! - `reference_censor` is the earliest censor observation.
//! - `followup_cutoff = reference_censor - minimum_follow_up`; the subject is
//!   eligible only if `start <= followup_cutoff`. A cutoff below the earliest
//!   representable date makes every subject with a start date ineligible.
//! - `observation_time` is the elapsed time from start to the reference
//!   censor, whether or not an event came first.
//!
//! A missing start date leaves every start-derived value missing; such
//! subjects are never eligible. A blank cutoff past the latest representable
//! date blanks every event.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::debug;
use tte_model::{AnalysisConfig, ColumnCatalog, DateObservation, TimeSpan};

use crate::error::DataIntegrityError;
use crate::roster::Roster;
use crate::timeline::Timeline;

/// Spans that drive annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityRules {
    pub blanking: TimeSpan,
    pub minimum_follow_up: TimeSpan,
    pub time_units: TimeSpan,
}

impl EligibilityRules {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            blanking: config.blanking,
            minimum_follow_up: config.minimum_follow_up,
            time_units: config.time_units,
        }
    }
}

/// Per-subject cutoffs and eligibility.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectWindow {
    pub subject: usize,
    pub start: Option<NaiveDateTime>,
    pub blank_cutoff: Option<NaiveDateTime>,
    pub reference_censor: NaiveDateTime,
    /// `None` when the cutoff underflows the representable date range.
    pub followup_cutoff: Option<NaiveDateTime>,
    /// `None` when the start date is missing.
    pub followup_ok: Option<bool>,
    /// Potential follow-up in time units; `None` when the start date is missing.
    pub observation_time: Option<f64>,
}

impl SubjectWindow {
    pub fn is_eligible(&self) -> bool {
        self.followup_ok == Some(true)
    }
}

/// An observation with its blanking flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotatedObservation {
    pub observation: DateObservation,
    /// `None` for events of a subject without a start date.
    pub blanked: Option<bool>,
}

impl AnnotatedObservation {
    /// Kept for resolution only when known not to be blanked.
    pub fn is_selectable(&self) -> bool {
        self.blanked == Some(false)
    }
}

/// A subject's window plus its annotated observations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTimeline {
    pub window: SubjectWindow,
    pub observations: Vec<AnnotatedObservation>,
}

/// Annotate every timeline. Subjects are processed independently.
///
/// # Errors
///
/// Returns [`DataIntegrityError::MissingFollowUpCutoff`] listing subjects with
/// no censor observation.
pub fn annotate(
    roster: &Roster,
    timelines: &[Timeline],
    catalog: &ColumnCatalog,
    rules: EligibilityRules,
) -> Result<Vec<AnnotatedTimeline>, DataIntegrityError> {
    let annotated: Vec<Option<AnnotatedTimeline>> = timelines
        .par_iter()
        .map(|timeline| {
            annotate_subject(timeline, roster.starts()[timeline.subject], catalog, rules)
        })
        .collect();

    let missing: Vec<_> = annotated
        .iter()
        .zip(timelines)
        .filter(|(result, _)| result.is_none())
        .map(|(_, timeline)| roster.subject(timeline.subject).clone())
        .collect();
    if !missing.is_empty() {
        return Err(DataIntegrityError::MissingFollowUpCutoff { subjects: missing });
    }

    let annotated: Vec<AnnotatedTimeline> = annotated.into_iter().flatten().collect();
    debug!(
        eligible = annotated.iter().filter(|a| a.window.is_eligible()).count(),
        blanked = annotated
            .iter()
            .flat_map(|a| &a.observations)
            .filter(|o| o.blanked == Some(true))
            .count(),
        "eligibility annotated"
    );
    Ok(annotated)
}

/// Annotate one subject; `None` if it has no censor observation.
pub fn annotate_subject(
    timeline: &Timeline,
    start: Option<NaiveDateTime>,
    catalog: &ColumnCatalog,
    rules: EligibilityRules,
) -> Option<AnnotatedTimeline> {
    let reference_censor = timeline
        .observations
        .iter()
        .filter(|obs| catalog.column(obs.rank).role.is_censor())
        .map(|obs| obs.date)
        .min()?;
    let followup_cutoff = reference_censor.checked_sub_signed(rules.minimum_follow_up.as_delta());

    let blank_cutoff = start.and_then(|s| s.checked_add_signed(rules.blanking.as_delta()));
    let followup_ok = start.map(|s| followup_cutoff.is_some_and(|cutoff| s <= cutoff));
    let observation_time = start.map(|s| rules.time_units.count_in(reference_censor - s));

    let observations = timeline
        .observations
        .iter()
        .map(|&observation| {
            let blanked = if catalog.column(observation.rank).outcome.is_event() {
                start.map(|_| blank_cutoff.is_none_or(|cutoff| observation.date < cutoff))
            } else {
                Some(false)
            };
            AnnotatedObservation {
                observation,
                blanked,
            }
        })
        .collect();

    Some(AnnotatedTimeline {
        window: SubjectWindow {
            subject: timeline.subject,
            start,
            blank_cutoff,
            reference_censor,
            followup_cutoff,
            followup_ok,
            observation_time,
        },
        observations,
    })
}
