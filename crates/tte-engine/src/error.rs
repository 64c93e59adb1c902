//! Error and warning types for the engine.

use std::fmt;

use thiserror::Error;
use tte_model::{ConfigError, SubjectId};

/// The roster data cannot support a well-defined derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    /// A roster row has a null or empty identifier.
    #[error("row {row} has no subject identifier")]
    MissingIdentifier { row: usize },

    /// Subjects without any censor date after aggregation.
    #[error(
        "{} subject(s) have no censor date: {}",
        subjects.len(),
        format_subjects(subjects)
    )]
    UncensoredSubjects { subjects: Vec<SubjectId> },

    /// Subjects with no censor observation to anchor a follow-up cutoff.
    #[error(
        "{} subject(s) have no computable follow-up cutoff: {}",
        subjects.len(),
        format_subjects(subjects)
    )]
    MissingFollowUpCutoff { subjects: Vec<SubjectId> },
}

impl DataIntegrityError {
    /// Subjects named by the error (empty for row-level errors).
    pub fn subjects(&self) -> &[SubjectId] {
        match self {
            Self::MissingIdentifier { .. } => &[],
            Self::UncensoredSubjects { subjects } | Self::MissingFollowUpCutoff { subjects } => {
                subjects
            }
        }
    }
}

/// Errors that abort a derivation. No partial result is ever returned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("data integrity: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// Configured columns absent from the roster.
    #[error("column(s) not found in roster: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for AnalysisError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Non-fatal conditions. The derivation continues and reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    /// Subjects without a start date; all their derived fields are missing.
    MissingStartDate { subjects: Vec<SubjectId> },

    /// Subjects whose rows disagree on the start date; the first one was used.
    ConflictingStartDates { subjects: Vec<SubjectId> },

    /// Non-empty date cells that could not be parsed and were treated as missing.
    UnparseableDates { column: String, count: usize },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartDate { subjects } => write!(
                f,
                "{} subject(s) have no start date; their derived fields are missing",
                subjects.len()
            ),
            Self::ConflictingStartDates { subjects } => write!(
                f,
                "{} subject(s) have conflicting start dates; the first non-missing value was used",
                subjects.len()
            ),
            Self::UnparseableDates { column, count } => write!(
                f,
                "{count} value(s) in column '{column}' are not complete ISO 8601 dates and were treated as missing"
            ),
        }
    }
}

fn format_subjects(subjects: &[SubjectId]) -> String {
    subjects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncensored_display_lists_identifiers() {
        let err = DataIntegrityError::UncensoredSubjects {
            subjects: vec![SubjectId::from("S-002"), SubjectId::Int(7)],
        };
        assert_eq!(
            err.to_string(),
            "2 subject(s) have no censor date: S-002, 7"
        );
        assert_eq!(err.subjects().len(), 2);
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let err: AnalysisError = polars_err.into();
        assert!(matches!(err, AnalysisError::DataFrame { .. }));
    }

    #[test]
    fn test_missing_columns_display() {
        let err = AnalysisError::MissingColumns {
            columns: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "column(s) not found in roster: a, b");
    }
}
