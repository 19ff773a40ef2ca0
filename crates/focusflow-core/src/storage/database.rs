//! SQLite-backed task, folder, session and settings storage.
//!
//! Provides persistent storage for:
//! - Tasks and the folders that group them
//! - Completed focus sessions
//! - Key-value settings for application state
//!
//! Timestamps are stored as local `YYYY-MM-DD HH:MM:SS` text and dates as
//! `YYYY-MM-DD`, so SQLite's `date()` works on them directly.

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::keys;
use super::migrations;
use super::traits::{FolderRepository, SessionLog, SettingsStore, StatsQuery, TaskRepository};
use super::Config;
use crate::error::{DatabaseError, Result, ValidationError};
use crate::filter::{week_bounds, MiniStats};
use crate::model::{
    validate_folder_name, validate_title, FocusSession, Folder, FolderId, NewTask, Priority,
    Progress, Task, TaskId, INBOX,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const TASK_COLUMNS: &str = "id, title, notes, start_date, due_date, priority, progress, \
                            is_done, completed_at, folder_id, created_at";

/// SQLite database holding all FocusFlow state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database named by `FOCUSFLOW_DB`, or the configured path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let path = match std::env::var_os("FOCUSFLOW_DB") {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => config.database_path()?,
        };
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "database opened");
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // `timer run` and one-shot commands may share the file.
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn now() -> String {
        Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Run a single-row task update, mapping "no row" to `TaskNotFound`.
    fn update_task(&self, id: TaskId, sql: &str, params: impl rusqlite::Params) -> Result<()> {
        let changed = self.conn.execute(sql, params)?;
        if changed == 0 {
            return Err(ValidationError::TaskNotFound(id).into());
        }
        Ok(())
    }

    fn folder_name(&self, id: FolderId) -> Result<String> {
        self.conn
            .query_row("SELECT name FROM folders WHERE id = ?1", [id], |row| row.get(0))
            .optional()?
            .ok_or_else(|| ValidationError::FolderNotFound(id).into())
    }

    fn folder_named(&self, name: &str) -> Result<Option<FolderId>> {
        Ok(self
            .conn
            .query_row("SELECT id FROM folders WHERE name = ?1", [name], |row| row.get(0))
            .optional()?)
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.filter(|s| !s.is_empty())
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDateTime::parse_from_str(&s, TIMESTAMP_PARSE_FORMAT)
                .map_err(|e| conversion_error(idx, e))
        })
        .transpose()
}

fn required_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    timestamp_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".into(),
        rusqlite::types::Type::Null,
    ))
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        notes: row.get(2)?,
        start_date: date_column(row, 3)?,
        due_date: date_column(row, 4)?,
        priority: parse_column::<Priority>(row, 5)?,
        progress: parse_column::<Progress>(row, 6)?,
        is_done: row.get(7)?,
        completed_at: timestamp_column(row, 8)?,
        folder_id: row.get(9)?,
        created_at: required_timestamp(row, 10)?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    Ok(FocusSession {
        id: row.get(0)?,
        task_id: row.get(1)?,
        started_at: required_timestamp(row, 2)?,
        ended_at: required_timestamp(row, 3)?,
        duration_minutes: row.get(4)?,
    })
}

impl TaskRepository for Database {
    fn list_tasks(&self, include_done: bool, folder_id: Option<FolderId>) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE (?1 OR is_done = 0) AND (?2 IS NULL OR folder_id = ?2)
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![include_done, folder_id], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_task).optional()?)
    }

    fn add_task(&self, task: NewTask) -> Result<TaskId> {
        let title = validate_title(&task.title)?;
        if let Some(folder_id) = task.folder_id {
            self.folder_name(folder_id)?;
        }
        let notes = task
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.conn.execute(
            "INSERT INTO tasks (title, notes, due_date, priority, progress, is_done, folder_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
            params![
                title,
                notes,
                format_date(task.due_date),
                task.priority.as_str(),
                Progress::NotStarted.as_str(),
                task.folder_id,
                Self::now(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(task_id = id, "task added");
        Ok(id)
    }

    fn toggle_done(&self, id: TaskId, done: bool) -> Result<()> {
        // Re-marking a done task keeps its first completion time.
        self.update_task(
            id,
            "UPDATE tasks
             SET is_done = ?2,
                 completed_at = CASE WHEN ?2 THEN COALESCE(completed_at, ?3) ELSE NULL END
             WHERE id = ?1",
            params![id, done, Self::now()],
        )?;
        info!(task_id = id, done, "task done flag changed");
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if deleted == 0 {
            debug!(task_id = id, "task already gone");
        } else {
            info!(task_id = id, "task deleted");
        }
        Ok(())
    }

    fn rename_task(&self, id: TaskId, title: &str) -> Result<()> {
        let title = validate_title(title)?;
        self.update_task(id, "UPDATE tasks SET title = ?2 WHERE id = ?1", params![id, title])?;
        info!(task_id = id, "task renamed");
        Ok(())
    }

    fn update_priority(&self, id: TaskId, priority: Priority) -> Result<()> {
        self.update_task(
            id,
            "UPDATE tasks SET priority = ?2 WHERE id = ?1",
            params![id, priority.as_str()],
        )?;
        info!(task_id = id, %priority, "task priority changed");
        Ok(())
    }

    fn set_progress(&self, id: TaskId, progress: Progress) -> Result<()> {
        self.update_task(
            id,
            "UPDATE tasks SET progress = ?2 WHERE id = ?1",
            params![id, progress.as_str()],
        )?;
        info!(task_id = id, %progress, "task progress changed");
        Ok(())
    }

    fn set_start_date(&self, id: TaskId, date: Option<NaiveDate>) -> Result<()> {
        self.update_task(
            id,
            "UPDATE tasks SET start_date = ?2 WHERE id = ?1",
            params![id, format_date(date)],
        )?;
        info!(task_id = id, ?date, "task start date changed");
        Ok(())
    }

    fn set_due_date(&self, id: TaskId, date: Option<NaiveDate>) -> Result<()> {
        self.update_task(
            id,
            "UPDATE tasks SET due_date = ?2 WHERE id = ?1",
            params![id, format_date(date)],
        )?;
        info!(task_id = id, ?date, "task due date changed");
        Ok(())
    }

    fn move_task_to_folder(&self, id: TaskId, folder_id: Option<FolderId>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            self.folder_name(folder_id)?;
        }
        self.update_task(
            id,
            "UPDATE tasks SET folder_id = ?2 WHERE id = ?1",
            params![id, folder_id],
        )?;
        info!(task_id = id, ?folder_id, "task moved");
        Ok(())
    }
}

impl FolderRepository for Database {
    fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM folders ORDER BY name COLLATE NOCASE, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Folder {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn create_folder(&self, name: &str) -> Result<FolderId> {
        let name = validate_folder_name(name)?;
        if self.folder_named(&name)?.is_some() {
            return Err(ValidationError::DuplicateName(name).into());
        }
        self.conn
            .execute("INSERT INTO folders (name) VALUES (?1)", [&name])?;
        let id = self.conn.last_insert_rowid();
        info!(folder_id = id, %name, "folder created");
        Ok(id)
    }

    fn rename_folder(&self, id: FolderId, name: &str) -> Result<()> {
        let name = validate_folder_name(name)?;
        if self.folder_name(id)? == INBOX {
            return Err(ValidationError::ProtectedFolder("renamed").into());
        }
        match self.folder_named(&name)? {
            Some(existing) if existing != id => {
                return Err(ValidationError::DuplicateName(name).into());
            }
            Some(_) => return Ok(()),
            None => {}
        }
        self.conn
            .execute("UPDATE folders SET name = ?2 WHERE id = ?1", params![id, name])?;
        info!(folder_id = id, %name, "folder renamed");
        Ok(())
    }

    fn delete_folder(&self, id: FolderId) -> Result<()> {
        if self.folder_name(id)? == INBOX {
            return Err(ValidationError::ProtectedFolder("deleted").into());
        }
        let inbox = self.inbox_id()?;

        let tx = self.conn.unchecked_transaction()?;
        let moved = tx.execute(
            "UPDATE tasks SET folder_id = ?2 WHERE folder_id = ?1",
            params![id, inbox],
        )?;
        tx.execute(
            "UPDATE settings SET v = ?2 WHERE k = ?3 AND v = ?1",
            params![id.to_string(), inbox.to_string(), keys::CURRENT_FOLDER_ID],
        )?;
        tx.execute("DELETE FROM folders WHERE id = ?1", [id])?;
        tx.commit()?;

        info!(folder_id = id, moved, "folder deleted, tasks moved to Inbox");
        Ok(())
    }

    fn inbox_id(&self) -> Result<FolderId> {
        if let Some(id) = self.folder_named(INBOX)? {
            return Ok(id);
        }
        self.conn
            .execute("INSERT INTO folders (name) VALUES (?1)", [INBOX])?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl SessionLog for Database {
    fn log_focus_session(
        &self,
        task_id: Option<TaskId>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
        duration_minutes: u32,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_sessions (task_id, started_at, ended_at, duration_minutes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                task_id,
                started_at.format(TIMESTAMP_FORMAT).to_string(),
                ended_at.format(TIMESTAMP_FORMAT).to_string(),
                duration_minutes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_sessions(&self) -> Result<Vec<FocusSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, started_at, ended_at, duration_minutes
             FROM focus_sessions
             ORDER BY started_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl SettingsStore for Database {
    fn get_setting(&self, key: &str, default: &str) -> Result<String, DatabaseError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT v FROM settings WHERE k = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO settings (k, v) VALUES (?1, ?2)
             ON CONFLICT(k) DO UPDATE SET v = excluded.v",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StatsQuery for Database {
    fn get_mini_stats(&self, today: NaiveDate) -> Result<MiniStats> {
        let day = today.format(DATE_FORMAT).to_string();
        let done_today: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE is_done = 1 AND date(completed_at) = ?1",
            [&day],
            |row| row.get(0),
        )?;

        let (monday, sunday) = week_bounds(today);
        let week_minutes: u32 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM focus_sessions
             WHERE date(started_at) BETWEEN ?1 AND ?2",
            params![
                monday.format(DATE_FORMAT).to_string(),
                sunday.format(DATE_FORMAT).to_string()
            ],
            |row| row.get(0),
        )?;

        Ok(MiniStats {
            done_today,
            week_minutes,
        })
    }
}
