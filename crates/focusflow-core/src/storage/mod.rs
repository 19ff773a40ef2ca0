mod config;
pub mod database;
pub mod migrations;
pub mod traits;

#[cfg(test)]
pub(crate) mod memory;

pub use config::Config;
pub use database::Database;
pub use traits::{
    FolderRepository, SessionLog, SettingsStore, StatsQuery, TaskRepository, TimerStore,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Setting keys shared by the timer, filters and the CLI.
pub mod keys {
    pub const THEME_NAME: &str = "theme_name";
    pub const CURRENT_FOLDER_ID: &str = "current_folder_id";
    pub const FILTER_MODE: &str = "filter_mode";
    pub const PRIORITY_FILTER: &str = "priority_filter";
    pub const WEEKLY_GOAL_MIN: &str = "weekly_goal_min";
    pub const TIMER_MODE: &str = "timer_mode";
    pub const AUTO_START_BREAK: &str = "auto_start_break";
    /// JSON snapshot of the timer shared between CLI invocations.
    pub const TIMER_STATE: &str = "timer_state";

    pub const WORK_FIELDS: [&str; 3] = ["work_h", "work_m", "work_s"];
    pub const BREAK_FIELDS: [&str; 3] = ["break_h", "break_m", "break_s"];
}

/// Returns `~/.config/focusflow[-dev]/` based on FOCUSFLOW_ENV.
///
/// Set FOCUSFLOW_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusflow-dev")
    } else {
        base_dir.join("focusflow")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
