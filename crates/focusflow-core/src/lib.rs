//! # FocusFlow Core Library
//!
//! This library provides the core logic for FocusFlow, a task tracker with a
//! built-in focus timer. Every operation is available through the
//! `focusflow` CLI binary, which is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A Work/Break countdown state machine. The host hands each
//!   pending tick handle back once per second; completed work intervals are
//!   written to the session log
//! - **Filter**: Pure task filtering, sorting and the mini statistics
//! - **Storage**: SQLite-based tasks, folders, sessions and settings, plus
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: Timer state machine
//! - [`TaskFilter`]: Filter mode plus priority selector
//! - [`Database`]: Repository, session log and settings persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod filter;
pub mod model;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use filter::{filter_tasks, FilterMode, MiniStats, PriorityFilter, SortOrder, TaskFilter, WeeklyGoal};
pub use model::{FocusSession, Folder, FolderId, NewTask, Priority, Progress, Task, TaskId, INBOX};
pub use storage::{Config, Database};
pub use timer::{FocusTimer, TimerConfig, TimerMode, TimerState};
