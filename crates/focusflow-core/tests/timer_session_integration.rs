//! Timer + SQLite integration: completed work intervals land in the
//! session log and feed the weekly statistics.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use focusflow_core::events::Event;
use focusflow_core::storage::{SessionLog, SettingsStore, StatsQuery, TaskRepository};
use focusflow_core::timer::{Clock, DurationParts, FocusTimer, TimerConfig, TimerMode, TimerState};
use focusflow_core::{filter_tasks, Database, FilterMode, NewTask, PriorityFilter};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone)]
struct TestClock(Rc<Cell<NaiveDateTime>>);

impl TestClock {
    fn at(start: NaiveDateTime) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    fn advance(&self, secs: i64) {
        self.0.set(self.0.get() + Duration::seconds(secs));
    }
}

impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::open_at(&dir.path().join("focusflow.db")).unwrap()
}

/// Tick once per simulated second until the timer reports completion.
fn run_until_complete(timer: &mut FocusTimer<TestClock>, clock: &TestClock, db: &Database) -> Event {
    for _ in 0..10_000 {
        let handle = timer.pending_tick().expect("timer should be running");
        clock.advance(1);
        if let Some(event @ Event::TimerCompleted { .. }) = timer.tick(handle, db) {
            return event;
        }
    }
    panic!("timer never completed");
}

#[test]
fn completed_work_interval_is_logged_against_linked_task() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let task_id = db.add_task(NewTask::new("Deep work")).unwrap();

    let clock = TestClock::at(monday_morning());
    let config = TimerConfig::new(DurationParts::minutes(2), DurationParts::minutes(1));
    let mut timer = FocusTimer::from_settings(&db, config, clock.clone());
    timer.linked_task_mut().link(task_id, "Deep work");

    timer.start(&db).unwrap();
    let event = run_until_complete(&mut timer, &clock, &db);

    match event {
        Event::TimerCompleted {
            mode,
            focus_minutes,
            session_id,
            auto_started_break,
            ..
        } => {
            assert_eq!(mode, TimerMode::Work);
            assert_eq!(focus_minutes, Some(2));
            assert!(session_id.is_some());
            assert!(!auto_started_break);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(timer.state(), TimerState::Idle);
    assert_eq!(timer.remaining_secs(), 120);

    let sessions = db.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].task_id, Some(task_id));
    assert_eq!(sessions[0].duration_minutes, 2);

    let stats = db.get_mini_stats(monday_morning().date()).unwrap();
    assert_eq!(stats.week_minutes, 2);
}

#[test]
fn auto_start_break_chains_and_break_is_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let clock = TestClock::at(monday_morning());
    let config = TimerConfig::new(DurationParts::minutes(1), DurationParts::new(0, 0, 30));
    let mut timer = FocusTimer::from_settings(&db, config, clock.clone());
    timer.set_auto_start_break(true, &db);

    timer.start(&db).unwrap();
    run_until_complete(&mut timer, &clock, &db);

    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(timer.mode(), TimerMode::Break);
    assert_eq!(timer.remaining_secs(), 30);
    assert_eq!(db.get_setting("timer_mode", "work").unwrap(), "break");

    run_until_complete(&mut timer, &clock, &db);
    assert_eq!(timer.state(), TimerState::Idle);
    assert_eq!(timer.mode(), TimerMode::Break);
    assert_eq!(db.list_sessions().unwrap().len(), 1);
}

#[test]
fn settings_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(monday_morning());
    {
        let db = open_db(&dir);
        let mut timer = FocusTimer::from_settings(&db, TimerConfig::default(), clock.clone());
        timer.set_duration(TimerMode::Work, DurationParts::new(0, 45, 30), &db);
        timer.change_mode(TimerMode::Break, &db);
    }

    let db = open_db(&dir);
    let timer = FocusTimer::from_settings(&db, TimerConfig::default(), clock);
    assert_eq!(timer.mode(), TimerMode::Break);
    assert_eq!(timer.config().work, DurationParts::new(0, 45, 30));
    assert_eq!(timer.remaining_secs(), 600);
}

#[test]
fn overdue_listing_from_repository() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();

    let late = db
        .add_task(NewTask::new("late").with_due_date(NaiveDate::from_ymd_opt(2024, 6, 1)))
        .unwrap();
    let late_done = db
        .add_task(NewTask::new("late but done").with_due_date(NaiveDate::from_ymd_opt(2024, 6, 2)))
        .unwrap();
    db.add_task(NewTask::new("later").with_due_date(NaiveDate::from_ymd_opt(2024, 6, 20)))
        .unwrap();
    db.toggle_done(late_done, true).unwrap();

    let tasks = db.list_tasks(true, None).unwrap();
    let overdue = filter_tasks(tasks, FilterMode::Overdue, PriorityFilter::All, today);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, late);
}
