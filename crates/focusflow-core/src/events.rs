use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::TaskId;
use crate::timer::{TimerMode, TimerState};

/// Every timer state change produces an Event.
/// The presentation layer renders them; `TimerCompleted` is its cue to
/// notify the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        /// True when continuing from Paused.
        resumed: bool,
        at: NaiveDateTime,
    },
    TimerPaused {
        remaining_secs: u64,
        at: NaiveDateTime,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: NaiveDateTime,
    },
    ModeChanged {
        mode: TimerMode,
        remaining_secs: u64,
        at: NaiveDateTime,
    },
    Ticked {
        remaining_secs: u64,
        at: NaiveDateTime,
    },
    TimerCompleted {
        /// Mode of the interval that just finished.
        mode: TimerMode,
        /// Rounded minutes of a work interval, when positive.
        focus_minutes: Option<u32>,
        /// Row id of the logged session; `None` if nothing was logged or logging failed.
        session_id: Option<i64>,
        /// A break was chained and is already running.
        auto_started_break: bool,
        at: NaiveDateTime,
    },
    StateSnapshot {
        state: TimerState,
        mode: TimerMode,
        remaining_secs: u64,
        total_secs: u64,
        display: String,
        progress_degrees: Option<f64>,
        linked_task: Option<TaskId>,
        linked_label: String,
        auto_start_break: bool,
        at: NaiveDateTime,
    },
}
