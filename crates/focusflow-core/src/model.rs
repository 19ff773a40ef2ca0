//! Task, folder and focus-session types.
//!
//! Enum-like fields are closed enums here; their text forms only appear
//! at the repository edge via [`Priority::as_str`] / [`Progress::as_str`]
//! and the matching `FromStr` impls.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub type TaskId = i64;
pub type FolderId = i64;

/// Name of the folder that always exists and absorbs orphaned tasks.
pub const INBOX: &str = "Inbox";

/// Folder names are stored in a VARCHAR(80)-sized column.
pub const MAX_FOLDER_NAME_LEN: usize = 80;

/// Task priority level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ValidationError::InvalidValue {
                field: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Manually tracked progress of a task, independent of `is_done`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Progress {
    NotStarted,
    InProgress,
    Completed,
}

impl Progress {
    pub fn as_str(&self) -> &'static str {
        match self {
            Progress::NotStarted => "Not started",
            Progress::InProgress => "In progress",
            Progress::Completed => "Completed",
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::NotStarted
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Progress {
    type Err = ValidationError;

    /// Accepts the stored form ("Not started") as well as CLI-friendly
    /// spellings ("not-started", "not_started").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '_' => ' ',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "not started" => Ok(Progress::NotStarted),
            "in progress" => Ok(Progress::InProgress),
            "completed" => Ok(Progress::Completed),
            _ => Err(ValidationError::InvalidValue {
                field: "progress",
                value: s.to_string(),
            }),
        }
    }
}

/// A task as stored in the repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub notes: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub progress: Progress,
    pub is_done: bool,
    /// Set iff `is_done`.
    pub completed_at: Option<NaiveDateTime>,
    pub folder_id: Option<FolderId>,
    pub created_at: NaiveDateTime,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub folder_id: Option<FolderId>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due: Option<NaiveDate>) -> Self {
        self.due_date = due;
        self
    }

    pub fn in_folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
}

impl Folder {
    pub fn is_inbox(&self) -> bool {
        self.name == INBOX
    }
}

/// One completed work interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FocusSession {
    pub id: i64,
    pub task_id: Option<TaskId>,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// Trim a task title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("Task title"));
    }
    Ok(trimmed.to_string())
}

/// Trim a folder name and check it fits the schema.
pub fn validate_folder_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("Folder name"));
    }
    if trimmed.chars().count() > MAX_FOLDER_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            max: MAX_FOLDER_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Parse user date input. Blank input means "clear the date".
pub fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}
