//! In-memory settings and session log for unit tests.

use chrono::NaiveDateTime;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::traits::{SessionLog, SettingsStore};
use crate::error::DatabaseError;
use crate::model::{FocusSession, TaskId};

#[derive(Default)]
pub(crate) struct MemoryStore {
    settings: RefCell<HashMap<String, String>>,
    sessions: RefCell<Vec<FocusSession>>,
    fail_sessions: Cell<bool>,
}

impl MemoryStore {
    pub(crate) fn fail_session_log(&self, fail: bool) {
        self.fail_sessions.set(fail);
    }

    pub(crate) fn sessions(&self) -> Vec<FocusSession> {
        self.sessions.borrow().clone()
    }
}

impl SettingsStore for MemoryStore {
    fn get_setting(&self, key: &str, default: &str) -> Result<String, DatabaseError> {
        Ok(self
            .settings
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.settings
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl SessionLog for MemoryStore {
    fn log_focus_session(
        &self,
        task_id: Option<TaskId>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
        duration_minutes: u32,
    ) -> Result<i64, DatabaseError> {
        if self.fail_sessions.get() {
            return Err(DatabaseError::Locked);
        }
        let mut sessions = self.sessions.borrow_mut();
        let id = sessions.len() as i64 + 1;
        sessions.push(FocusSession {
            id,
            task_id,
            started_at,
            ended_at,
            duration_minutes,
        });
        Ok(id)
    }

    fn list_sessions(&self) -> Result<Vec<FocusSession>, DatabaseError> {
        Ok(self.sessions())
    }
}
