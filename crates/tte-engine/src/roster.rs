//! Roster extraction from a Polars DataFrame.
//!
//! The roster may carry one row per subject or many rows per subject. Subjects
//! are numbered in order of first appearance; that order is the output order
//! of every later stage.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use polars::prelude::{AnyValue, Column, DataFrame};
use tracing::debug;

use tte_common::{any_to_integer, any_to_string_non_empty, any_to_timestamp};
use tte_model::{AnalysisConfig, ColumnCatalog, PriorityRank, SubjectId};

use crate::error::{AnalysisError, AnalysisWarning, DataIntegrityError, Result};

/// Column-oriented view of the roster restricted to the configured columns.
#[derive(Debug, Clone)]
pub struct Roster {
    subjects: Vec<SubjectId>,
    starts: Vec<Option<NaiveDateTime>>,
    row_subjects: Vec<usize>,
    /// Parsed date cells per source column, indexed by priority rank then row.
    columns: Vec<Vec<Option<NaiveDateTime>>>,
    warnings: Vec<AnalysisWarning>,
}

impl Roster {
    /// Read the identifier, start date, and every catalog column from `df`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingColumns`] if any configured column is absent
    /// - [`DataIntegrityError::MissingIdentifier`] for a null/empty identifier
    pub fn from_frame(
        df: &DataFrame,
        config: &AnalysisConfig,
        catalog: &ColumnCatalog,
    ) -> Result<Self> {
        let missing: Vec<String> = std::iter::once(config.identifier.as_str())
            .chain(std::iter::once(config.start_time.as_str()))
            .chain(catalog.columns().iter().map(|c| c.name.as_str()))
            .filter(|name| df.column(name).is_err())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumns { columns: missing });
        }

        let height = df.height();
        let id_column = df.column(&config.identifier)?;

        let mut subjects = Vec::new();
        let mut index_by_id: HashMap<SubjectId, usize> = HashMap::new();
        let mut row_subjects = Vec::with_capacity(height);
        for row in 0..height {
            let value = id_column.get(row).unwrap_or(AnyValue::Null);
            let id = subject_id(value).ok_or(DataIntegrityError::MissingIdentifier { row })?;
            let index = *index_by_id.entry(id).or_insert_with_key(|id| {
                subjects.push(id.clone());
                subjects.len() - 1
            });
            row_subjects.push(index);
        }

        let mut warnings = Vec::new();

        let (start_cells, _) = read_dates(df.column(&config.start_time)?, height);
        let mut starts: Vec<Option<NaiveDateTime>> = vec![None; subjects.len()];
        let mut conflicting = BTreeSet::new();
        for (row, start) in start_cells.iter().enumerate() {
            let Some(start) = *start else { continue };
            let subject = row_subjects[row];
            match starts[subject] {
                None => starts[subject] = Some(start),
                Some(existing) if existing != start => {
                    conflicting.insert(subject);
                }
                Some(_) => {}
            }
        }
        if !conflicting.is_empty() {
            warnings.push(AnalysisWarning::ConflictingStartDates {
                subjects: conflicting.iter().map(|&i| subjects[i].clone()).collect(),
            });
        }

        let mut columns = Vec::with_capacity(catalog.len());
        for source in catalog.columns() {
            let (cells, unparseable) = read_dates(df.column(&source.name)?, height);
            if unparseable > 0 {
                warnings.push(AnalysisWarning::UnparseableDates {
                    column: source.name.clone(),
                    count: unparseable,
                });
            }
            columns.push(cells);
        }

        debug!(
            rows = height,
            subjects = subjects.len(),
            columns = columns.len(),
            "roster extracted"
        );

        Ok(Self {
            subjects,
            starts,
            row_subjects,
            columns,
            warnings,
        })
    }

    /// Subjects in roster order.
    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn subject(&self, index: usize) -> &SubjectId {
        &self.subjects[index]
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Start date per subject, in roster order.
    pub fn starts(&self) -> &[Option<NaiveDateTime>] {
        &self.starts
    }

    pub fn row_count(&self) -> usize {
        self.row_subjects.len()
    }

    /// `(subject index, date)` for every non-missing cell of a source column.
    pub fn column_dates(&self, rank: PriorityRank) -> impl Iterator<Item = (usize, NaiveDateTime)> + '_ {
        self.columns[rank.index()]
            .iter()
            .zip(&self.row_subjects)
            .filter_map(|(date, &subject)| date.map(|d| (subject, d)))
    }

    /// Warnings raised while reading cells.
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }
}

fn subject_id(value: AnyValue<'_>) -> Option<SubjectId> {
    if let Some(v) = any_to_integer(&value) {
        return Some(SubjectId::Int(v));
    }
    any_to_string_non_empty(value).map(SubjectId::Text)
}

/// Parse every cell of a date column. Also counts non-empty cells that did
/// not parse, so they can be reported instead of silently vanishing.
fn read_dates(column: &Column, height: usize) -> (Vec<Option<NaiveDateTime>>, usize) {
    let mut unparseable = 0usize;
    let cells = (0..height)
        .map(|row| {
            let value = column.get(row).unwrap_or(AnyValue::Null);
            let parsed = any_to_timestamp(&value);
            if parsed.is_none() && any_to_string_non_empty(value).is_some() {
                unparseable += 1;
            }
            parsed
        })
        .collect();
    (cells, unparseable)
}
