//! Focus timer state machine.
//!
//! The timer has no internal thread. The host arms a one-shot callback for
//! every [`TickHandle`] the timer hands out and passes the handle back to
//! [`FocusTimer::tick`] one second later. Leaving `Running` invalidates the
//! pending handle, so a late callback from an earlier run is ignored.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//!   ^                |
//!   +---complete-----+  (or Running(Break) when auto-start-break is on)
//! any --reset--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = FocusTimer::new(TimerConfig::default());
//! timer.start(&store);
//! // Once per second, while a handle is pending:
//! if let Some(handle) = timer.pending_tick() {
//!     timer.tick(handle, &store);
//! }
//! ```

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::{DurationParts, Preset, TimerConfig, TimerMode};
use super::linked::LinkedTask;
use crate::events::Event;
use crate::storage::keys;
use crate::storage::{SettingsStore, TimerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Identifies the single pending countdown callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Persistable part of the timer's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub state: TimerState,
    pub remaining_secs: u64,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub linked: LinkedTask,
    /// When the snapshot was taken. A host ticking the timer refreshes it
    /// every second.
    #[serde(default)]
    pub saved_at: Option<NaiveDateTime>,
}

impl TimerSnapshot {
    /// Whether a host was still ticking this snapshot at `now`: it says
    /// `Running` and was saved no more than `max_age` earlier.
    pub fn is_live(&self, now: NaiveDateTime, max_age: Duration) -> bool {
        self.state == TimerState::Running
            && self
                .saved_at
                .is_some_and(|at| at <= now && now - at <= max_age)
    }
}

/// Work/break countdown with session logging on completion.
#[derive(Debug)]
pub struct FocusTimer<C: Clock = SystemClock> {
    config: TimerConfig,
    mode: TimerMode,
    state: TimerState,
    remaining_secs: u64,
    /// When the current Running period began. Survives pause/resume.
    started_at: Option<NaiveDateTime>,
    auto_start_break: bool,
    linked: LinkedTask,
    pending: Option<TickHandle>,
    next_handle: u64,
    clock: C,
}

impl FocusTimer<SystemClock> {
    /// Create an idle work timer loaded with the configured work duration.
    pub fn new(config: TimerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> FocusTimer<C> {
    pub fn with_clock(config: TimerConfig, clock: C) -> Self {
        Self {
            config,
            mode: TimerMode::Work,
            state: TimerState::Idle,
            remaining_secs: config.duration_seconds(TimerMode::Work),
            started_at: None,
            auto_start_break: false,
            linked: LinkedTask::default(),
            pending: None,
            next_handle: 0,
            clock,
        }
    }

    /// Build an idle timer from persisted settings: durations, mode and
    /// the auto-start-break flag.
    pub fn from_settings<S: SettingsStore + ?Sized>(
        store: &S,
        defaults: TimerConfig,
        clock: C,
    ) -> Self {
        let mut timer = Self::with_clock(defaults, clock);
        timer.reload_settings(store, defaults);
        timer.mode = TimerMode::from_setting(&read_setting(store, keys::TIMER_MODE, "work"));
        timer.remaining_secs = timer.config.duration_seconds(timer.mode);
        timer
    }

    /// Re-read durations and the auto-start-break flag. The mode and the
    /// countdown in progress are left alone.
    pub fn reload_settings<S: SettingsStore + ?Sized>(&mut self, store: &S, defaults: TimerConfig) {
        self.config = TimerConfig::load(store, defaults);
        self.auto_start_break = read_setting(store, keys::AUTO_START_BREAK, "0") == "1";
    }

    /// Restore a snapshot taken by another host.
    ///
    /// Nothing is ticking a restored timer, so `Running` comes back as `Paused`.
    pub fn restore(&mut self, snapshot: TimerSnapshot) {
        self.pending = None;
        self.mode = snapshot.mode;
        self.state = match snapshot.state {
            TimerState::Running => TimerState::Paused,
            other => other,
        };
        self.remaining_secs = snapshot.remaining_secs;
        self.started_at = snapshot.started_at;
        self.linked = snapshot.linked;
    }

    /// Take the mode and linked task from a `Running` snapshot another
    /// process wrote while this timer keeps counting down.
    ///
    /// Ignored unless both sides are running; the countdown and pending
    /// tick stay as they are.
    pub fn merge_running(&mut self, snapshot: TimerSnapshot) {
        if self.state != TimerState::Running || snapshot.state != TimerState::Running {
            return;
        }
        if self.mode != snapshot.mode {
            debug!(mode = %snapshot.mode, "mode changed by another process");
        }
        self.mode = snapshot.mode;
        self.linked = snapshot.linked;
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            state: self.state,
            remaining_secs: self.remaining_secs,
            started_at: self.started_at,
            linked: self.linked.clone(),
            saved_at: Some(self.clock.now()),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.started_at
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn auto_start_break(&self) -> bool {
        self.auto_start_break
    }

    pub fn linked_task(&self) -> &LinkedTask {
        &self.linked
    }

    pub fn linked_task_mut(&mut self) -> &mut LinkedTask {
        &mut self.linked
    }

    /// The handle the host should fire in one second, if any.
    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    /// Configured duration of the current mode.
    pub fn total_secs(&self) -> u64 {
        self.config.duration_seconds(self.mode)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Sweep of the progress ring in degrees; `None` when the mode has no duration.
    pub fn progress_degrees(&self) -> Option<f64> {
        let total = self.total_secs();
        if total == 0 {
            return None;
        }
        Some((1.0 - self.remaining_secs as f64 / total as f64) * 360.0)
    }

    /// Build a full state snapshot event.
    pub fn status(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            display: self.display(),
            progress_degrees: self.progress_degrees(),
            linked_task: self.linked.task_id(),
            linked_label: self.linked.label(),
            auto_start_break: self.auto_start_break,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch mode. Only an idle timer reloads its duration; a paused
    /// (or running) countdown keeps its remaining time.
    pub fn change_mode<S: SettingsStore + ?Sized>(&mut self, mode: TimerMode, store: &S) -> Event {
        self.mode = mode;
        if self.state == TimerState::Idle {
            self.remaining_secs = self.config.duration_seconds(mode);
        }
        if let Err(e) = store.set_setting(keys::TIMER_MODE, mode.as_key()) {
            warn!(error = %e, "failed to persist timer mode");
        }
        debug!(%mode, remaining = self.remaining_secs, "timer mode changed");
        Event::ModeChanged {
            mode,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        }
    }

    /// Replace one mode's duration. Applied like a mode change on the current mode.
    pub fn set_duration<S: SettingsStore + ?Sized>(
        &mut self,
        mode: TimerMode,
        parts: DurationParts,
        store: &S,
    ) -> Event {
        *self.config.duration_mut(mode) = parts;
        self.persist_durations(store);
        self.change_mode(self.mode, store)
    }

    pub fn apply_preset<S: SettingsStore + ?Sized>(&mut self, preset: Preset, store: &S) -> Event {
        self.config.apply_preset(preset);
        self.persist_durations(store);
        self.change_mode(self.mode, store)
    }

    pub fn set_auto_start_break<S: SettingsStore + ?Sized>(&mut self, enabled: bool, store: &S) {
        self.auto_start_break = enabled;
        let value = if enabled { "1" } else { "0" };
        if let Err(e) = store.set_setting(keys::AUTO_START_BREAK, value) {
            warn!(error = %e, "failed to persist auto-start-break flag");
        }
    }

    pub fn start<S: SettingsStore + ?Sized>(&mut self, store: &S) -> Option<Event> {
        self.persist_durations(store);
        match self.state {
            TimerState::Idle => {
                if self.remaining_secs == 0 {
                    self.change_mode(self.mode, store);
                }
                self.state = TimerState::Running;
                self.started_at = Some(self.clock.now());
                self.arm();
                debug!(mode = %self.mode, remaining = self.remaining_secs, "timer started");
                Some(Event::TimerStarted {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    resumed: false,
                    at: self.clock.now(),
                })
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.arm();
                debug!(remaining = self.remaining_secs, "timer resumed");
                Some(Event::TimerStarted {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    resumed: true,
                    at: self.clock.now(),
                })
            }
            TimerState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.cancel_pending();
        self.state = TimerState::Paused;
        debug!(remaining = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    pub fn reset<S: SettingsStore + ?Sized>(&mut self, store: &S) -> Event {
        self.cancel_pending();
        self.state = TimerState::Idle;
        self.started_at = None;
        self.change_mode(self.mode, store);
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        }
    }

    /// One elapsed second. Stale handles are ignored.
    ///
    /// Returns `TimerCompleted` when the countdown had already reached zero.
    pub fn tick<S: TimerStore + ?Sized>(&mut self, handle: TickHandle, store: &S) -> Option<Event> {
        if self.pending != Some(handle) {
            debug!(?handle, "ignoring stale tick");
            return None;
        }
        self.pending = None;
        if self.state != TimerState::Running {
            return None;
        }
        if self.remaining_secs == 0 {
            return Some(self.complete(store));
        }
        self.remaining_secs -= 1;
        self.arm();
        Some(Event::Ticked {
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete<S: TimerStore + ?Sized>(&mut self, store: &S) -> Event {
        self.cancel_pending();
        self.state = TimerState::Idle;
        let finished = self.mode;
        let ended_at = self.clock.now();

        let mut focus_minutes = None;
        let mut session_id = None;
        if finished == TimerMode::Work {
            if let Some(started_at) = self.started_at {
                let minutes = rounded_minutes(started_at, ended_at);
                if minutes > 0 {
                    focus_minutes = Some(minutes);
                    match store.log_focus_session(
                        self.linked.task_id(),
                        started_at,
                        ended_at,
                        minutes,
                    ) {
                        Ok(id) => {
                            info!(session_id = id, minutes, "focus session logged");
                            session_id = Some(id);
                        }
                        Err(e) => warn!(error = %e, "focus session log failed"),
                    }
                }
            }
        }
        self.started_at = None;

        let auto_started_break = finished == TimerMode::Work && self.auto_start_break;
        if auto_started_break {
            self.change_mode(TimerMode::Break, store);
            self.start(store);
        } else {
            self.change_mode(self.mode, store);
        }

        Event::TimerCompleted {
            mode: finished,
            focus_minutes,
            session_id,
            auto_started_break,
            at: ended_at,
        }
    }

    fn arm(&mut self) {
        self.next_handle += 1;
        self.pending = Some(TickHandle(self.next_handle));
    }

    fn cancel_pending(&mut self) {
        self.pending = None;
    }

    fn persist_durations<S: SettingsStore + ?Sized>(&self, store: &S) {
        if let Err(e) = self.config.save(store) {
            warn!(error = %e, "failed to persist timer durations");
        }
    }
}

fn read_setting<S: SettingsStore + ?Sized>(store: &S, key: &str, default: &str) -> String {
    store.get_setting(key, default).unwrap_or_else(|e| {
        warn!(key, error = %e, "failed to read timer setting");
        default.to_string()
    })
}

/// Elapsed minutes rounded half-to-even, never negative.
fn rounded_minutes(started_at: NaiveDateTime, ended_at: NaiveDateTime) -> u32 {
    let elapsed_ms = (ended_at - started_at).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    let minutes = (elapsed_ms as f64 / 60_000.0).round_ties_even();
    minutes.min(f64::from(u32::MAX)) as u32
}
