//! Task list filtering.
//!
//! A pure transformation over whatever the repository returned: filtering
//! keeps the input order (newest-created first). Only an explicit
//! [`SortOrder::Priority`] reorders, and it does so stably.

mod stats;

#[cfg(test)]
pub(crate) use stats::mini_stats;
pub use stats::{week_bounds, GoalProgress, MiniStats, WeeklyGoal};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{DatabaseError, ValidationError};
use crate::model::{Priority, Progress, Task};
use crate::storage::{keys, SettingsStore};

/// Which tasks to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FilterMode {
    #[default]
    All,
    Today,
    Week,
    Overdue,
    Done,
    NotStarted,
    InProgress,
    Completed,
}

impl FilterMode {
    pub const ALL: [FilterMode; 8] = [
        FilterMode::All,
        FilterMode::Today,
        FilterMode::Week,
        FilterMode::Overdue,
        FilterMode::Done,
        FilterMode::NotStarted,
        FilterMode::InProgress,
        FilterMode::Completed,
    ];

    /// Key persisted in the `filter_mode` setting.
    pub fn as_key(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Today => "today",
            FilterMode::Week => "week",
            FilterMode::Overdue => "overdue",
            FilterMode::Done => "done",
            FilterMode::NotStarted => "p_not",
            FilterMode::InProgress => "p_in",
            FilterMode::Completed => "p_done",
        }
    }

    /// Whether `task` passes this mode on `today`.
    pub fn keeps(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Today => task.due_date == Some(today),
            FilterMode::Week => {
                let (monday, sunday) = week_bounds(today);
                task.due_date.is_some_and(|d| monday <= d && d <= sunday)
            }
            FilterMode::Overdue => task.due_date.is_some_and(|d| d < today) && !task.is_done,
            FilterMode::Done => task.is_done,
            FilterMode::NotStarted => task.progress == Progress::NotStarted,
            FilterMode::InProgress => task.progress == Progress::InProgress,
            FilterMode::Completed => task.progress == Progress::Completed,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for FilterMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(FilterMode::All),
            "today" => Ok(FilterMode::Today),
            "week" => Ok(FilterMode::Week),
            "overdue" => Ok(FilterMode::Overdue),
            "done" => Ok(FilterMode::Done),
            "p_not" | "not-started" => Ok(FilterMode::NotStarted),
            "p_in" | "in-progress" => Ok(FilterMode::InProgress),
            "p_done" | "completed" => Ok(FilterMode::Completed),
            other => Err(ValidationError::InvalidValue {
                field: "filter_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Priority selector ANDed with the filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn keeps(&self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(p) => task.priority == *p,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            PriorityFilter::All => "All",
            PriorityFilter::Only(p) => p.as_str(),
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for PriorityFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        s.parse::<Priority>()
            .map(PriorityFilter::Only)
            .map_err(|_| ValidationError::InvalidValue {
                field: "priority_filter",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Repository order: newest-created first.
    #[default]
    Newest,
    /// High before Medium before Low; ties keep repository order.
    Priority,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "newest" => Ok(SortOrder::Newest),
            "priority" => Ok(SortOrder::Priority),
            other => Err(ValidationError::InvalidValue {
                field: "sort",
                value: other.to_string(),
            }),
        }
    }
}

/// Filter criteria applied to one task listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub mode: FilterMode,
    pub priority: PriorityFilter,
    pub sort: SortOrder,
}

impl TaskFilter {
    pub fn new(mode: FilterMode, priority: PriorityFilter) -> Self {
        Self {
            mode,
            priority,
            sort: SortOrder::Newest,
        }
    }

    /// The persisted filter mode and priority selector. Unknown stored
    /// values fall back to `all` / `All`.
    pub fn from_settings<S: SettingsStore + ?Sized>(store: &S) -> Result<Self, DatabaseError> {
        let mode = store.get_setting(keys::FILTER_MODE, FilterMode::All.as_key())?;
        let priority = store.get_setting(keys::PRIORITY_FILTER, PriorityFilter::All.as_key())?;
        Ok(Self::new(
            mode.parse().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring stored filter mode");
                FilterMode::All
            }),
            priority.parse().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring stored priority filter");
                PriorityFilter::All
            }),
        ))
    }

    /// Persist mode and priority selector. The sort order is per listing.
    pub fn save<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<(), DatabaseError> {
        store.set_setting(keys::FILTER_MODE, self.mode.as_key())?;
        store.set_setting(keys::PRIORITY_FILTER, self.priority.as_key())
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        self.mode.keeps(task, today) && self.priority.keeps(task)
    }

    /// Keep the matching tasks, then apply the sort order.
    pub fn apply(&self, tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
        let mut out: Vec<Task> = tasks
            .into_iter()
            .filter(|t| self.matches(t, today))
            .collect();
        if self.sort == SortOrder::Priority {
            // `sort_by` is stable, so equal priorities keep their order.
            out.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        out
    }
}

/// Shorthand for the common case without sorting.
pub fn filter_tasks(
    tasks: Vec<Task>,
    mode: FilterMode,
    priority: PriorityFilter,
    today: NaiveDate,
) -> Vec<Task> {
    TaskFilter::new(mode, priority).apply(tasks, today)
}
