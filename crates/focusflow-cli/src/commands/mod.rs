pub mod config;
pub mod filter;
pub mod folder;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;

use chrono::{Local, NaiveDate};
use focusflow_core::error::Result;
use focusflow_core::storage::{keys, FolderRepository, SettingsStore};
use focusflow_core::{Config, Database, FolderId};
use tracing::debug;

/// Load the config and open the database it points at.
pub(crate) fn open_database() -> Result<(Config, Database)> {
    let config = Config::load_or_default();
    let db = Database::open(&config)?;
    Ok((config, db))
}

/// The remembered folder, or Inbox when none is saved or it no longer exists.
pub(crate) fn current_folder(db: &Database) -> Result<FolderId> {
    let saved = db.get_setting(keys::CURRENT_FOLDER_ID, "")?;
    if let Ok(id) = saved.trim().parse::<FolderId>() {
        if db.list_folders()?.iter().any(|f| f.id == id) {
            return Ok(id);
        }
        debug!(id, "saved folder is gone, using Inbox");
    }
    db.inbox_id()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn print_json<T: serde::Serialize>(
    value: &T,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
