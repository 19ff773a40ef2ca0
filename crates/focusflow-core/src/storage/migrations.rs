//! Database schema migrations for focusflow.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

use crate::model::INBOX;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    // The Inbox must exist even if someone removed it by hand.
    ensure_inbox(conn)?;
    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: tasks, focus sessions and settings.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("applying schema v1");
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            notes       TEXT,
            due_date    TEXT,
            priority    TEXT NOT NULL DEFAULT 'Low'
                        CHECK (priority IN ('Low', 'Medium', 'High')),
            is_done     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS focus_sessions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id          INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
            started_at       TEXT NOT NULL,
            ended_at         TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0)
        );

        CREATE TABLE IF NOT EXISTS settings (
            k TEXT PRIMARY KEY,
            v TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_focus_sessions_started_at ON focus_sessions(started_at);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: folders, start dates, progress and completion timestamps.
///
/// Existing done tasks get `completed_at = created_at` so the
/// is_done/completed_at invariant holds for old rows.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    debug!("applying schema v2");
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS folders (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        ALTER TABLE tasks ADD COLUMN start_date TEXT;
        ALTER TABLE tasks ADD COLUMN progress TEXT NOT NULL DEFAULT 'Not started'
            CHECK (progress IN ('Not started', 'In progress', 'Completed'));
        ALTER TABLE tasks ADD COLUMN completed_at TEXT;
        ALTER TABLE tasks ADD COLUMN folder_id INTEGER
            REFERENCES folders(id) ON DELETE SET NULL;

        UPDATE tasks SET completed_at = created_at
            WHERE is_done = 1 AND completed_at IS NULL;

        CREATE INDEX IF NOT EXISTS idx_tasks_folder_id ON tasks(folder_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

fn ensure_inbox(conn: &Connection) -> SqliteResult<()> {
    conn.execute("INSERT OR IGNORE INTO folders (name) VALUES (?1)", [INBOX])?;
    Ok(())
}
