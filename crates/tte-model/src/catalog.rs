//! Validated column catalog and the global tie-breaking order.
//!
//! Every source column gets an explicit [`PriorityRank`] once, at catalog
//! construction: event columns in listing order (groups in order, columns
//! within a group in order), then early censors, then late censors. Two
//! observations on the same date always resolve to the lower rank.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::ConfigError;
use crate::observation::Aggregation;
use crate::CENSORED;

/// Position of a column in the global priority order. Lower wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityRank(pub u32);

impl PriorityRank {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PriorityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Every non-null occurrence is a candidate event.
    Event,
    /// Aggregated per subject to the earliest date.
    EarlyCensor,
    /// Aggregated per subject to the latest date.
    LateCensor,
}

impl ColumnRole {
    /// Per-subject aggregation for censor roles; events are not aggregated.
    pub fn aggregation(self) -> Option<Aggregation> {
        match self {
            Self::Event => None,
            Self::EarlyCensor => Some(Aggregation::Earliest),
            Self::LateCensor => Some(Aggregation::Latest),
        }
    }

    pub fn is_censor(self) -> bool {
        !matches!(self, Self::Event)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Event => "event",
            Self::EarlyCensor => "early censor",
            Self::LateCensor => "late censor",
        })
    }
}

/// Outcome carried by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Censored,
    /// Zero-based index into the configured event groups.
    Event(usize),
}

impl Outcome {
    /// Integer code: 0 for Censored, 1..K for event groups in listing order.
    pub fn code(self) -> u32 {
        match self {
            Self::Censored => 0,
            Self::Event(index) => index as u32 + 1,
        }
    }

    pub fn is_event(self) -> bool {
        matches!(self, Self::Event(_))
    }
}

/// Ordered outcome levels; `Censored` is always first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLevels {
    names: Vec<String>,
}

impl OutcomeLevels {
    fn new<'a>(events: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names = vec![CENSORED.to_string()];
        names.extend(events.into_iter().map(str::to_string));
        Self { names }
    }

    pub fn name(&self, outcome: Outcome) -> &str {
        &self.names[outcome.code() as usize]
    }

    /// Outcome for a label, if it is one of the levels.
    pub fn outcome_of(&self, name: &str) -> Option<Outcome> {
        let position = self.names.iter().position(|n| n == name)?;
        Some(match position {
            0 => Outcome::Censored,
            p => Outcome::Event(p - 1),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All outcomes in code order.
    pub fn outcomes(&self) -> impl Iterator<Item = Outcome> + '_ {
        (0..self.names.len()).map(|code| match code {
            0 => Outcome::Censored,
            c => Outcome::Event(c - 1),
        })
    }
}

/// A configured source column with its role, outcome, and rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub name: String,
    pub role: ColumnRole,
    pub outcome: Outcome,
    pub rank: PriorityRank,
}

/// The validated set of source columns, indexed by priority rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCatalog {
    columns: Vec<SourceColumn>,
    levels: OutcomeLevels,
}

impl ColumnCatalog {
    /// Validate the column configuration and assign priority ranks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for empty/unnamed/duplicate event groups,
    /// duplicate columns within a role family, columns shared between events
    /// and censors, or an empty censor set.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        if config.event_groups.is_empty() {
            return Err(ConfigError::EmptyEventGroups);
        }

        let mut group_names = BTreeSet::new();
        let mut event_columns = BTreeSet::new();
        let mut columns = Vec::new();

        for (index, group) in config.event_groups.iter().enumerate() {
            let name = group.name.trim();
            if name.is_empty() {
                return Err(ConfigError::UnnamedEventGroup { index });
            }
            if name == CENSORED {
                return Err(ConfigError::ReservedEventGroupName {
                    name: name.to_string(),
                });
            }
            if !group_names.insert(name) {
                return Err(ConfigError::DuplicateEventGroup {
                    name: name.to_string(),
                });
            }
            if group.columns.is_empty() {
                return Err(ConfigError::EmptyEventGroupColumns {
                    name: name.to_string(),
                });
            }
            for column in &group.columns {
                check_column_name(column, || format!("event group '{name}'"))?;
                if !event_columns.insert(column.as_str()) {
                    return Err(ConfigError::DuplicateEventColumn {
                        column: column.clone(),
                    });
                }
                columns.push((column.clone(), ColumnRole::Event, Outcome::Event(index)));
            }
        }

        if config.early_censors.is_empty() && config.late_censors.is_empty() {
            return Err(ConfigError::NoCensors);
        }

        let mut censor_columns = BTreeSet::new();
        let censors = config
            .early_censors
            .iter()
            .map(|c| (c, ColumnRole::EarlyCensor))
            .chain(config.late_censors.iter().map(|c| (c, ColumnRole::LateCensor)));
        for (column, role) in censors {
            check_column_name(column, || format!("{role} columns"))?;
            if !censor_columns.insert(column.as_str()) {
                return Err(ConfigError::DuplicateCensorColumn {
                    column: column.clone(),
                });
            }
            if event_columns.contains(column.as_str()) {
                return Err(ConfigError::SharedEventCensorColumn {
                    column: column.clone(),
                });
            }
            columns.push((column.clone(), role, Outcome::Censored));
        }

        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(rank, (name, role, outcome))| SourceColumn {
                name,
                role,
                outcome,
                rank: PriorityRank(rank as u32),
            })
            .collect();
        let levels = OutcomeLevels::new(config.event_groups.iter().map(|g| g.name.trim()));

        Ok(Self { columns, levels })
    }

    /// Column at a rank. Ranks come from this catalog, so lookups cannot miss.
    pub fn column(&self, rank: PriorityRank) -> &SourceColumn {
        &self.columns[rank.index()]
    }

    /// All columns in priority order.
    pub fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    pub fn with_role(&self, role: ColumnRole) -> impl Iterator<Item = &SourceColumn> {
        self.columns.iter().filter(move |c| c.role == role)
    }

    pub fn levels(&self) -> &OutcomeLevels {
        &self.levels
    }

    pub fn outcome_name(&self, rank: PriorityRank) -> &str {
        self.levels.name(self.column(rank).outcome)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn check_column_name(column: &str, context: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if column.trim().is_empty() {
        return Err(ConfigError::EmptyColumnName { context: context() });
    }
    Ok(())
}
