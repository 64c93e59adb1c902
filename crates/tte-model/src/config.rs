//! Analysis configuration.
//!
//! An [`AnalysisConfig`] names the roster columns that feed the derivation and
//! the spans that shape it. It is plain data: call [`AnalysisConfig::validate`]
//! to obtain the [`ColumnCatalog`] the engine runs against.

use serde::{Deserialize, Serialize};

use crate::catalog::ColumnCatalog;
use crate::error::ConfigError;
use crate::span::TimeSpan;

/// A named outcome and the date columns that count as occurrences of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventGroup {
    /// Outcome label (e.g., "Surgery").
    pub name: String,
    /// Source date columns, in priority order.
    pub columns: Vec<String>,
}

impl EventGroup {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Structured definition of one time-to-event analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Analysis name used for output column names and presentation labels.
    #[serde(default = "default_analysis_name")]
    pub analysis_name: String,

    /// Subject identifier column.
    pub identifier: String,

    /// Start date column.
    pub start_time: String,

    /// Event groups in listing order. Listing order defines both the
    /// outcome codes (1..K) and the tie-breaking priority.
    #[serde(default)]
    pub event_groups: Vec<EventGroup>,

    /// Censor columns aggregated per subject with the earliest date.
    #[serde(default)]
    pub early_censors: Vec<String>,

    /// Censor columns aggregated per subject with the latest date.
    #[serde(default)]
    pub late_censors: Vec<String>,

    /// Divisor for all elapsed-time outputs.
    #[serde(default = "default_time_units")]
    pub time_units: TimeSpan,

    /// Events strictly before `start + blanking` are suppressed.
    #[serde(default)]
    pub blanking: TimeSpan,

    /// Subjects starting after `earliest censor - minimum_follow_up` are excluded.
    #[serde(default)]
    pub minimum_follow_up: TimeSpan,

    /// Also return the annotated pre-filter timeline.
    #[serde(default)]
    pub debug: bool,
}

/// Fixed column names of the diagnostic timeline, after the identifier.
pub const DIAGNOSTIC_COLUMNS: [&str; 10] = [
    "start_date",
    "blank_cutoff",
    "date",
    "source_column",
    "priority_rank",
    "outcome",
    "blanked",
    "followup_cutoff",
    "followup_ok",
    "observation_time",
];

fn default_analysis_name() -> String {
    "outcome".to_string()
}

fn default_time_units() -> TimeSpan {
    TimeSpan::days(1)
}

impl AnalysisConfig {
    /// Create a configuration with defaults and no event groups or censors.
    pub fn new(identifier: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            analysis_name: default_analysis_name(),
            identifier: identifier.into(),
            start_time: start_time.into(),
            event_groups: Vec::new(),
            early_censors: Vec::new(),
            late_censors: Vec::new(),
            time_units: default_time_units(),
            blanking: TimeSpan::zero(),
            minimum_follow_up: TimeSpan::zero(),
            debug: false,
        }
    }

    #[must_use]
    pub fn with_analysis_name(mut self, name: impl Into<String>) -> Self {
        self.analysis_name = name.into();
        self
    }

    /// Append an event group.
    #[must_use]
    pub fn with_event_group<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_groups.push(EventGroup::new(name, columns));
        self
    }

    #[must_use]
    pub fn with_early_censors<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.early_censors = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_late_censors<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.late_censors = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_time_units(mut self, units: TimeSpan) -> Self {
        self.time_units = units;
        self
    }

    #[must_use]
    pub fn with_blanking(mut self, blanking: TimeSpan) -> Self {
        self.blanking = blanking;
        self
    }

    #[must_use]
    pub fn with_minimum_follow_up(mut self, minimum: TimeSpan) -> Self {
        self.minimum_follow_up = minimum;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the configuration and build its column catalog.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: span problems first, then
    /// column problems in the order event groups, censors, cross-role overlap.
    pub fn validate(&self) -> Result<ColumnCatalog, ConfigError> {
        if !self.time_units.is_positive() {
            return Err(ConfigError::InvalidTimeUnits {
                span: self.time_units.to_string(),
            });
        }
        for (field, span) in [
            ("blanking", self.blanking),
            ("minimum follow-up", self.minimum_follow_up),
        ] {
            if span.is_negative() {
                return Err(ConfigError::NegativeSpan {
                    field,
                    span: span.to_string(),
                });
            }
        }
        for (context, column) in [
            ("identifier", &self.identifier),
            ("start time", &self.start_time),
        ] {
            if column.trim().is_empty() {
                return Err(ConfigError::EmptyColumnName {
                    context: context.to_string(),
                });
            }
        }
        let clashes_with_result = self.output_column_names().contains(&self.identifier);
        let clashes_with_diagnostic =
            self.debug && DIAGNOSTIC_COLUMNS.contains(&self.identifier.as_str());
        if clashes_with_result || clashes_with_diagnostic {
            return Err(ConfigError::OutputColumnClash {
                column: self.identifier.clone(),
            });
        }
        ColumnCatalog::from_config(self)
    }

    /// Derived result column names: time, outcome, outcome code, observation time.
    pub fn output_column_names(&self) -> [String; 4] {
        let prefix = self.output_prefix();
        ["time", "outcome", "outcome_code", "observation_time"]
            .map(|suffix| format!("{prefix}_{suffix}"))
    }

    /// Snake-case prefix for output column names.
    ///
    /// # Examples
    ///
    /// ```
    /// use tte_model::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::new("id", "start").with_analysis_name("Heart Failure");
    /// assert_eq!(config.output_prefix(), "heart_failure");
    /// ```
    pub fn output_prefix(&self) -> String {
        let mut prefix = String::with_capacity(self.analysis_name.len());
        for c in self.analysis_name.trim().chars() {
            if c.is_alphanumeric() {
                prefix.extend(c.to_lowercase());
            } else if !prefix.ends_with('_') {
                prefix.push('_');
            }
        }
        let trimmed = prefix.trim_matches('_');
        if trimmed.is_empty() {
            default_analysis_name()
        } else {
            trimmed.to_string()
        }
    }
}
