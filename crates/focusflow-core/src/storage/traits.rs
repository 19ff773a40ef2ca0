//! Collaborator contracts consumed by the timer and filter code.
//!
//! [`Database`](super::Database) implements all of them; tests swap in
//! in-memory fakes.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DatabaseError, Result};
use crate::filter::MiniStats;
use crate::model::{FocusSession, Folder, FolderId, NewTask, Priority, Progress, Task, TaskId};

/// Durable key -> string mapping. Last write wins.
pub trait SettingsStore {
    fn get_setting(&self, key: &str, default: &str) -> Result<String, DatabaseError>;
    fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// Append-only log of completed focus intervals.
pub trait SessionLog {
    fn log_focus_session(
        &self,
        task_id: Option<TaskId>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
        duration_minutes: u32,
    ) -> Result<i64, DatabaseError>;

    fn list_sessions(&self) -> Result<Vec<FocusSession>, DatabaseError>;
}

/// Everything the timer touches while running.
pub trait TimerStore: SettingsStore + SessionLog {}

impl<T: SettingsStore + SessionLog + ?Sized> TimerStore for T {}

/// Task storage. Every mutation is a single-row update that can be retried
/// with the same outcome; deleting a task that is already gone is a no-op.
pub trait TaskRepository {
    /// Tasks ordered newest-created first.
    fn list_tasks(&self, include_done: bool, folder_id: Option<FolderId>) -> Result<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> Result<Option<Task>>;
    fn add_task(&self, task: NewTask) -> Result<TaskId>;
    /// Sets or clears `completed_at` together with `is_done`.
    fn toggle_done(&self, id: TaskId, done: bool) -> Result<()>;
    fn delete_task(&self, id: TaskId) -> Result<()>;
    fn rename_task(&self, id: TaskId, title: &str) -> Result<()>;
    fn update_priority(&self, id: TaskId, priority: Priority) -> Result<()>;
    fn set_progress(&self, id: TaskId, progress: Progress) -> Result<()>;
    fn set_start_date(&self, id: TaskId, date: Option<NaiveDate>) -> Result<()>;
    fn set_due_date(&self, id: TaskId, date: Option<NaiveDate>) -> Result<()>;
    fn move_task_to_folder(&self, id: TaskId, folder_id: Option<FolderId>) -> Result<()>;
}

pub trait FolderRepository {
    /// Folders sorted by name.
    fn list_folders(&self) -> Result<Vec<Folder>>;
    fn create_folder(&self, name: &str) -> Result<FolderId>;
    fn rename_folder(&self, id: FolderId, name: &str) -> Result<()>;
    /// Moves member tasks to Inbox, then removes the folder.
    fn delete_folder(&self, id: FolderId) -> Result<()>;
    fn inbox_id(&self) -> Result<FolderId>;
}

/// Aggregates computed by the store itself.
pub trait StatsQuery {
    fn get_mini_stats(&self, today: NaiveDate) -> Result<MiniStats>;
}
