use clap::Subcommand;
use focusflow_core::storage::{keys, FolderRepository, SettingsStore};
use focusflow_core::ValidationError;

use super::{current_folder, open_database, print_json};

#[derive(Subcommand)]
pub enum FolderAction {
    /// List folders (current folder marked with *)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a folder
    Create {
        /// Folder name
        name: String,
        /// Also make it the current folder
        #[arg(long)]
        select: bool,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a folder; its tasks move to Inbox
    Delete {
        /// Folder ID
        id: i64,
    },
    /// Make a folder current for `task add` and `task list`
    Select {
        /// Folder ID
        id: i64,
    },
}

pub fn run(action: FolderAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, db) = open_database()?;

    match action {
        FolderAction::List { json } => {
            let folders = db.list_folders()?;
            if json {
                print_json(&folders)?;
            } else {
                let current = current_folder(&db)?;
                for folder in &folders {
                    let mark = if folder.id == current { "*" } else { " " };
                    println!("{mark} #{:<4} {}", folder.id, folder.name);
                }
            }
        }
        FolderAction::Create { name, select } => {
            let id = db.create_folder(&name)?;
            if select {
                db.set_setting(keys::CURRENT_FOLDER_ID, &id.to_string())?;
            }
            println!("Folder created: {id}");
        }
        FolderAction::Rename { id, name } => {
            db.rename_folder(id, &name)?;
            println!("Folder {id} renamed");
        }
        FolderAction::Delete { id } => {
            db.delete_folder(id)?;
            println!("Folder {id} deleted, tasks moved to Inbox");
        }
        FolderAction::Select { id } => {
            let folder = db
                .list_folders()?
                .into_iter()
                .find(|f| f.id == id)
                .ok_or(ValidationError::FolderNotFound(id))?;
            db.set_setting(keys::CURRENT_FOLDER_ID, &id.to_string())?;
            println!("Current folder: {}", folder.name);
        }
    }
    Ok(())
}
