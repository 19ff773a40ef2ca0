//! Core error types for focusflow-core.
//!
//! Timer and filter code never raise for expected conditions. These types
//! cover collaborator failures and user input rejected before it reaches
//! the repository.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input rejected before any mutation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Cannot prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Task titles and folder names must contain something besides whitespace
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Folder names are unique
    #[error("A folder named '{0}' already exists")]
    DuplicateName(String),

    /// The Inbox folder cannot be deleted or renamed
    #[error("Inbox cannot be {0}")]
    ProtectedFolder(&'static str),

    /// Folder names are capped by the schema
    #[error("Folder name is longer than {max} characters")]
    NameTooLong { max: usize },

    /// Dates are entered as YYYY-MM-DD
    #[error("Invalid date '{0}': please use YYYY-MM-DD")]
    InvalidDate(String),

    /// Weekly goal outside the accepted range
    #[error("Weekly goal must be between {min} and {max} minutes, got {value}")]
    GoalOutOfRange { value: i64, min: u32, max: u32 },

    /// A closed enum received an unknown text form
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    /// Referenced task does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Referenced folder does not exist
    #[error("Folder not found: {0}")]
    FolderNotFound(i64),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rusqlite_errors_become_query_failures() {
        let err: CoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::QueryFailed(_))
        ));
    }

    #[test]
    fn busy_and_locked_map_to_locked() {
        for code in [rusqlite::ffi::SQLITE_BUSY, rusqlite::ffi::SQLITE_LOCKED] {
            let err = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None);
            assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
        }
    }

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::ProtectedFolder("deleted").to_string(),
            "Inbox cannot be deleted"
        );
        assert_eq!(
            ValidationError::InvalidDate("tomorrow".into()).to_string(),
            "Invalid date 'tomorrow': please use YYYY-MM-DD"
        );
    }
}
