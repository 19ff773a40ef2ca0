use clap::Subcommand;
use focusflow_core::{FilterMode, PriorityFilter, TaskFilter};

use super::open_database;

#[derive(Subcommand)]
pub enum FilterAction {
    /// Save the filter mode used by `task list`
    Set {
        /// all, today, week, overdue, done, not-started, in-progress or completed
        mode: FilterMode,
    },
    /// Save the priority selector used by `task list`
    Priority {
        /// All, Low, Medium or High
        priority: PriorityFilter,
    },
    /// Print the saved filter
    Show,
}

pub fn run(action: FilterAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, db) = open_database()?;
    let mut filter = TaskFilter::from_settings(&db)?;

    match action {
        FilterAction::Set { mode } => {
            filter.mode = mode;
            filter.save(&db)?;
        }
        FilterAction::Priority { priority } => {
            filter.priority = priority;
            filter.save(&db)?;
        }
        FilterAction::Show => {}
    }

    println!("mode: {}", filter.mode);
    println!("priority: {}", filter.priority);
    Ok(())
}
