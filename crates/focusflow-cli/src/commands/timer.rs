use clap::{Subcommand, ValueEnum};
use focusflow_core::events::Event;
use focusflow_core::storage::{keys, SettingsStore, TaskRepository};
use focusflow_core::timer::{
    Clock, DurationParts, FocusTimer, Preset, SystemClock, TimerConfig, TimerMode, TimerSnapshot,
    TimerState,
};
use focusflow_core::{Database, DatabaseError, ValidationError};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

use super::{open_database, print_json};

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Switch between work and break
    Mode {
        /// work or break
        mode: TimerMode,
    },
    /// Apply a duration preset (25-5 or 50-10)
    Preset {
        /// 25-5 or 50-10
        preset: Preset,
    },
    /// Set one mode's duration; bad fields count as 0
    Durations {
        /// work or break
        mode: TimerMode,
        #[arg(long, default_value = "0")]
        hours: String,
        #[arg(long, default_value = "0")]
        minutes: String,
        #[arg(long, default_value = "0")]
        seconds: String,
    },
    /// Attribute focus time to a task
    Link {
        /// Task ID
        task_id: i64,
    },
    /// Stop attributing focus time to a task
    Unlink,
    /// Start a break automatically after each work interval
    AutoBreak {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Pause the countdown
    Pause,
    /// Reset to idle with the current mode's full duration
    Reset,
    /// Start or resume, and count down in the foreground (Ctrl-C pauses)
    Run,
}

/// A stored running timer whose last save is older than this has no
/// `timer run` process behind it.
const HOST_HEARTBEAT_SECS: i64 = 5;

fn load_snapshot(db: &Database) -> Result<Option<TimerSnapshot>, DatabaseError> {
    let raw = db.get_setting(keys::TIMER_STATE, "")?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            warn!(error = %e, "discarding unreadable timer snapshot");
            Ok(None)
        }
    }
}

/// The stored snapshot, if a `timer run` process is still ticking it.
fn live_host(stored: Option<&TimerSnapshot>) -> Option<TimerSnapshot> {
    let max_age = chrono::Duration::seconds(HOST_HEARTBEAT_SECS);
    let stored = stored?;
    if stored.is_live(SystemClock.now(), max_age) {
        return Some(stored.clone());
    }
    if stored.state == TimerState::Running {
        debug!(saved_at = ?stored.saved_at, "running timer has no live host");
    }
    None
}

fn load_timer(
    db: &Database,
    defaults: TimerConfig,
) -> Result<(FocusTimer, Option<TimerSnapshot>), DatabaseError> {
    let mut timer = FocusTimer::from_settings(db, defaults, SystemClock);
    let stored = load_snapshot(db)?;
    let host = live_host(stored.as_ref());
    if let Some(snapshot) = stored {
        timer.restore(snapshot);
    }
    Ok((timer, host))
}

/// Store the timer. With a live `host`, the snapshot goes back as running
/// under the host's heartbeat so the countdown carries on there.
fn save_timer(
    db: &Database,
    timer: &FocusTimer,
    host: Option<&TimerSnapshot>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshot = timer.snapshot();
    if let Some(host) = host {
        snapshot.state = TimerState::Running;
        snapshot.saved_at = host.saved_at;
    }
    let json = serde_json::to_string(&snapshot)?;
    db.set_setting(keys::TIMER_STATE, &json)?;
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, db) = open_database()?;
    let defaults = config.timer_defaults();
    let (mut timer, host) = load_timer(&db, defaults)?;
    // Pause and reset take the timer away from a running host.
    let mut release_host = false;

    match action {
        TimerAction::Status => {
            let mut status = timer.status();
            if let Event::StateSnapshot { state, .. } = &mut status {
                if host.is_some() {
                    *state = TimerState::Running;
                }
            }
            print_json(&status)?;
            return Ok(());
        }
        TimerAction::Mode { mode } => {
            print_json(&timer.change_mode(mode, &db))?;
        }
        TimerAction::Preset { preset } => {
            print_json(&timer.apply_preset(preset, &db))?;
            eprintln!("{}", preset.label());
        }
        TimerAction::Durations {
            mode,
            hours,
            minutes,
            seconds,
        } => {
            let parts = DurationParts::parse_lenient(&hours, &minutes, &seconds);
            print_json(&timer.set_duration(mode, parts, &db))?;
        }
        TimerAction::Link { task_id } => {
            let task = db
                .get_task(task_id)?
                .ok_or(ValidationError::TaskNotFound(task_id))?;
            timer.linked_task_mut().link(task.id, task.title);
            print_json(&timer.status())?;
        }
        TimerAction::Unlink => {
            timer.linked_task_mut().unlink();
            print_json(&timer.status())?;
        }
        TimerAction::AutoBreak { state } => {
            timer.set_auto_start_break(matches!(state, Toggle::On), &db);
            print_json(&timer.status())?;
        }
        TimerAction::Pause => {
            release_host = true;
            match timer.pause() {
                Some(event) => print_json(&event)?,
                // Restoring the host's running snapshot already paused it.
                None if host.is_some() => print_json(&timer.status())?,
                None => eprintln!("timer is not running"),
            }
        }
        TimerAction::Reset => {
            release_host = true;
            print_json(&timer.reset(&db))?;
        }
        TimerAction::Run => {
            if host.is_some() {
                return Err("timer is already running in another process".into());
            }
            if let Some(event) = timer.start(&db) {
                print_json(&event)?;
            }
            save_timer(&db, &timer, None)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            return runtime.block_on(countdown(&db, &mut timer, defaults));
        }
    }

    let host = if release_host { None } else { host.as_ref() };
    save_timer(&db, &timer, host)
}

/// Resolves on Ctrl-C, and on SIGTERM or SIGHUP where those exist.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(mut term), Ok(mut hup)) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                    _ = hup.recv() => {}
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => warn!(error = %e, "cannot listen for SIGTERM"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Drive the timer once per second until it stops running.
///
/// Every save refreshes the snapshot's heartbeat. Link, mode and setting
/// changes made by other commands are picked up between ticks.
async fn countdown(
    db: &Database,
    timer: &mut FocusTimer,
    defaults: TimerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    while let Some(handle) = timer.pending_tick() {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = &mut shutdown => {
                eprintln!();
                if let Some(event) = timer.pause() {
                    print_json(&event)?;
                }
                break;
            }
        }

        if let Some(stored) = load_snapshot(db)? {
            // Another invocation paused or reset the stored timer; it wins.
            if stored.state != TimerState::Running {
                debug!(state = ?stored.state, "timer changed by another command");
                eprintln!();
                timer.restore(stored);
                print_json(&timer.status())?;
                return Ok(());
            }
            timer.merge_running(stored);
        }
        timer.reload_settings(db, defaults);

        match timer.tick(handle, db) {
            Some(Event::Ticked { .. }) => {
                eprint!("\r{} {}  ", timer.mode(), timer.display());
                std::io::stderr().flush()?;
            }
            Some(event @ Event::TimerCompleted { .. }) => {
                eprintln!();
                println!("\x07Time's up!");
                print_json(&event)?;
            }
            Some(event) => print_json(&event)?,
            None => {}
        }
        save_timer(db, timer, None)?;
    }

    save_timer(db, timer, None)?;
    Ok(())
}
