use clap::Subcommand;
use focusflow_core::storage::{keys, SettingsStore};

use super::open_database;

/// Known keys and the defaults readers fall back to.
const KNOWN: &[(&str, &str)] = &[
    (keys::THEME_NAME, "Sky"),
    (keys::CURRENT_FOLDER_ID, ""),
    (keys::FILTER_MODE, "all"),
    (keys::PRIORITY_FILTER, "All"),
    (keys::WEEKLY_GOAL_MIN, "300"),
    (keys::TIMER_MODE, "work"),
    (keys::AUTO_START_BREAK, "0"),
    (keys::WORK_FIELDS[0], "0"),
    (keys::WORK_FIELDS[1], "25"),
    (keys::WORK_FIELDS[2], "0"),
    (keys::BREAK_FIELDS[0], "0"),
    (keys::BREAK_FIELDS[1], "10"),
    (keys::BREAK_FIELDS[2], "0"),
];

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print a setting
    Get {
        /// Setting key (e.g. "theme_name")
        key: String,
        /// Value printed when the key is unset
        #[arg(long)]
        default: Option<String>,
    },
    /// Store a setting
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List known settings with their current values
    List,
}

fn default_for(key: &str) -> &'static str {
    KNOWN
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, d)| *d)
        .unwrap_or("")
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, db) = open_database()?;

    match action {
        SettingsAction::Get { key, default } => {
            let default = default.as_deref().unwrap_or_else(|| default_for(&key));
            println!("{}", db.get_setting(&key, default)?);
        }
        SettingsAction::Set { key, value } => {
            db.set_setting(&key, &value)?;
            println!("ok");
        }
        SettingsAction::List => {
            for (key, default) in KNOWN {
                println!("{key} = {}", db.get_setting(key, default)?);
            }
        }
    }
    Ok(())
}
