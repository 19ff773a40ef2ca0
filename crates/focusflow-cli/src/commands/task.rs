//! Task management commands for CLI.

use clap::Subcommand;
use focusflow_core::model::parse_date_input;
use focusflow_core::storage::{FolderRepository, TaskRepository};
use focusflow_core::{
    FilterMode, NewTask, Priority, PriorityFilter, Progress, SortOrder, Task, TaskFilter,
    ValidationError,
};

use super::{current_folder, open_database, print_json, today};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the current folder
    Add {
        /// Task title
        title: String,
        /// Low, Medium or High (default: Low)
        #[arg(long, default_value = "Low")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Folder ID (default: current folder)
        #[arg(long)]
        folder: Option<i64>,
    },
    /// List tasks through the saved filter
    List {
        /// List every folder instead of the current one
        #[arg(long, conflicts_with = "folder")]
        all_folders: bool,
        /// Folder ID (default: current folder)
        #[arg(long)]
        folder: Option<i64>,
        /// Override the saved filter mode for this listing
        #[arg(long)]
        mode: Option<FilterMode>,
        /// Override the saved priority filter for this listing
        #[arg(long)]
        priority: Option<PriorityFilter>,
        /// newest or priority
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
        /// Leave done tasks out before filtering
        #[arg(long)]
        hide_done: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one task as JSON
    Show {
        /// Task ID
        id: i64,
    },
    /// Mark a task done
    Done {
        /// Task ID
        id: i64,
    },
    /// Mark a task not done
    Undo {
        /// Task ID
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
    /// Rename a task
    Rename {
        /// Task ID
        id: i64,
        /// New title
        title: String,
    },
    /// Change a task's priority
    Priority {
        /// Task ID
        id: i64,
        /// Low, Medium or High
        priority: Priority,
    },
    /// Change a task's progress
    Progress {
        /// Task ID
        id: i64,
        /// not-started, in-progress or completed
        progress: Progress,
    },
    /// Set or clear the start date
    StartDate {
        /// Task ID
        id: i64,
        /// YYYY-MM-DD; omit to clear
        #[arg(default_value = "")]
        date: String,
    },
    /// Set or clear the due date
    DueDate {
        /// Task ID
        id: i64,
        /// YYYY-MM-DD; omit to clear
        #[arg(default_value = "")]
        date: String,
    },
    /// Move a task to another folder
    Move {
        /// Task ID
        id: i64,
        /// Target folder ID
        folder: i64,
    },
}

fn format_task(task: &Task) -> String {
    let check = if task.is_done { "x" } else { " " };
    let mut line = format!(
        "#{:<4} [{check}] {:<6} {:<11} {}",
        task.id,
        task.priority.as_str(),
        task.progress.as_str(),
        task.title
    );
    if let Some(start) = task.start_date {
        line.push_str(&format!("  start {start}"));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {due}"));
    }
    line
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, db) = open_database()?;

    match action {
        TaskAction::Add {
            title,
            priority,
            due,
            notes,
            folder,
        } => {
            let due_date = match due {
                Some(d) => parse_date_input(&d)?,
                None => None,
            };
            let folder_id = match folder {
                Some(id) => id,
                None => current_folder(&db)?,
            };
            let id = db.add_task(
                NewTask::new(title)
                    .with_priority(priority)
                    .with_due_date(due_date)
                    .with_notes(notes)
                    .in_folder(Some(folder_id)),
            )?;
            println!("Task added: {id}");
        }
        TaskAction::List {
            all_folders,
            folder,
            mode,
            priority,
            sort,
            hide_done,
            json,
        } => {
            let folder_id = if all_folders {
                None
            } else {
                Some(match folder {
                    Some(id) => id,
                    None => current_folder(&db)?,
                })
            };
            let saved = TaskFilter::from_settings(&db)?;
            let filter = TaskFilter::new(
                mode.unwrap_or(saved.mode),
                priority.unwrap_or(saved.priority),
            )
            .sorted(sort);

            let tasks = filter.apply(db.list_tasks(!hide_done, folder_id)?, today());
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    println!("{}", format_task(task));
                }
            }
        }
        TaskAction::Show { id } => {
            let task = db.get_task(id)?.ok_or(ValidationError::TaskNotFound(id))?;
            print_json(&task)?;
        }
        TaskAction::Done { id } => {
            db.toggle_done(id, true)?;
            println!("Task {id} done");
        }
        TaskAction::Undo { id } => {
            db.toggle_done(id, false)?;
            println!("Task {id} reopened");
        }
        TaskAction::Delete { id } => {
            db.delete_task(id)?;
            println!("Task {id} deleted");
        }
        TaskAction::Rename { id, title } => {
            db.rename_task(id, &title)?;
            println!("Task {id} renamed");
        }
        TaskAction::Priority { id, priority } => {
            db.update_priority(id, priority)?;
            println!("Task {id} priority: {priority}");
        }
        TaskAction::Progress { id, progress } => {
            db.set_progress(id, progress)?;
            println!("Task {id} progress: {progress}");
        }
        TaskAction::StartDate { id, date } => {
            let date = parse_date_input(&date)?;
            db.set_start_date(id, date)?;
            match date {
                Some(d) => println!("Task {id} starts {d}"),
                None => println!("Task {id} start date cleared"),
            }
        }
        TaskAction::DueDate { id, date } => {
            let date = parse_date_input(&date)?;
            db.set_due_date(id, date)?;
            match date {
                Some(d) => println!("Task {id} due {d}"),
                None => println!("Task {id} due date cleared"),
            }
        }
        TaskAction::Move { id, folder } => {
            db.move_task_to_folder(id, Some(folder))?;
            let name = db
                .list_folders()?
                .into_iter()
                .find(|f| f.id == folder)
                .map(|f| f.name)
                .unwrap_or_default();
            println!("Task {id} moved to {name}");
        }
    }
    Ok(())
}
