//! Configuration errors.
//!
//! Every variant describes a defect in the analysis definition itself, never
//! in the data. They are raised before any roster value is read.

use thiserror::Error;

/// Errors raised while validating an [`AnalysisConfig`](crate::AnalysisConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    // === Event groups ===
    /// No event group was configured.
    #[error("at least one event group is required")]
    EmptyEventGroups,

    /// An event group has an empty name.
    #[error("event group #{index} has no name")]
    UnnamedEventGroup { index: usize },

    /// An event group uses the reserved censoring label.
    #[error("event group name '{name}' is reserved for censoring")]
    ReservedEventGroupName { name: String },

    /// Two event groups share a name.
    #[error("event group '{name}' is defined more than once")]
    DuplicateEventGroup { name: String },

    /// An event group lists no columns.
    #[error("event group '{name}' has no columns")]
    EmptyEventGroupColumns { name: String },

    // === Columns ===
    /// A column name is empty.
    #[error("empty column name in {context}")]
    EmptyColumnName { context: String },

    /// A column is listed more than once across all event groups.
    #[error("event column '{column}' is listed more than once")]
    DuplicateEventColumn { column: String },

    /// A column is listed more than once across early and late censors.
    #[error("censor column '{column}' is listed more than once")]
    DuplicateCensorColumn { column: String },

    /// A column is used both as an event and as a censor.
    #[error("column '{column}' is used both as an event and as a censor")]
    SharedEventCensorColumn { column: String },

    /// The identifier shares its name with a derived output column.
    #[error("identifier column '{column}' has the same name as a derived output column")]
    OutputColumnClash { column: String },

    /// Neither early nor late censors were configured.
    #[error("at least one early or late censor column is required")]
    NoCensors,

    // === Time spans ===
    /// A time span could not be parsed.
    #[error("invalid time span '{value}': {reason}")]
    InvalidSpan { value: String, reason: String },

    /// The time unit divisor is zero or negative.
    #[error("time units must be a positive span, got {span}")]
    InvalidTimeUnits { span: String },

    /// A blanking or follow-up span is negative.
    #[error("{field} must not be negative, got {span}")]
    NegativeSpan { field: &'static str, span: String },
}
