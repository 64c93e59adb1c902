//! Timeline observations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::PriorityRank;

/// How a censor column collapses to one date per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    /// Keep the minimum date (early censors).
    Earliest,
    /// Keep the maximum date (late censors).
    Latest,
}

impl Aggregation {
    /// Combine the running summary with a new candidate date.
    pub fn combine(self, current: NaiveDateTime, candidate: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Earliest => current.min(candidate),
            Self::Latest => current.max(candidate),
        }
    }
}

/// One dated observation on a subject's timeline.
///
/// `subject` is the subject's position in roster order. The source column,
/// its role, and its outcome label are all recovered from the
/// [`ColumnCatalog`](crate::ColumnCatalog) through `rank`.
///
/// Field order matters: the derived `Ord` sorts by subject, then date, then
/// priority rank, which is exactly the resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateObservation {
    pub subject: usize,
    pub date: NaiveDateTime,
    pub rank: PriorityRank,
}

impl DateObservation {
    pub fn new(subject: usize, date: NaiveDateTime, rank: PriorityRank) -> Self {
        Self {
            subject,
            date,
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_aggregation_combine() {
        assert_eq!(Aggregation::Earliest.combine(day(5), day(3)), day(3));
        assert_eq!(Aggregation::Latest.combine(day(5), day(3)), day(5));
    }

    #[test]
    fn test_observation_order() {
        let mut observations = vec![
            DateObservation::new(1, day(1), PriorityRank(0)),
            DateObservation::new(0, day(2), PriorityRank(0)),
            DateObservation::new(0, day(1), PriorityRank(3)),
            DateObservation::new(0, day(1), PriorityRank(1)),
        ];
        observations.sort();
        assert_eq!(
            observations,
            vec![
                DateObservation::new(0, day(1), PriorityRank(1)),
                DateObservation::new(0, day(1), PriorityRank(3)),
                DateObservation::new(0, day(2), PriorityRank(0)),
                DateObservation::new(1, day(1), PriorityRank(0)),
            ]
        );
    }
}
