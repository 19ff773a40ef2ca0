//! "Done today" / "focus this week" aggregates and weekly goal progress.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
#[cfg(test)]
use crate::model::{FocusSession, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniStats {
    pub done_today: u32,
    pub week_minutes: u32,
}

/// Monday and Sunday of the ISO week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

/// Compute the aggregates from unfiltered data. Reference for what
/// [`StatsQuery`](crate::storage::StatsQuery) computes in SQL.
#[cfg(test)]
pub(crate) fn mini_stats(tasks: &[Task], sessions: &[FocusSession], today: NaiveDate) -> MiniStats {
    let done_today = tasks
        .iter()
        .filter(|t| t.is_done && t.completed_at.is_some_and(|at| at.date() == today))
        .count();

    let this_week = today.iso_week();
    let week_minutes = sessions
        .iter()
        .filter(|s| s.started_at.date().iso_week() == this_week)
        .map(|s| s.duration_minutes)
        .sum();

    MiniStats {
        done_today: u32::try_from(done_today).unwrap_or(u32::MAX),
        week_minutes,
    }
}

/// Weekly focus goal in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyGoal(u32);

impl WeeklyGoal {
    pub const MIN: u32 = 30;
    /// One full week of minutes.
    pub const MAX: u32 = 10_080;
    pub const DEFAULT: u32 = 300;

    pub fn new(minutes: i64) -> Result<Self, ValidationError> {
        if minutes < i64::from(Self::MIN) || minutes > i64::from(Self::MAX) {
            return Err(ValidationError::GoalOutOfRange {
                value: minutes,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(minutes as u32))
    }

    /// Lenient parse of the stored setting; anything unusable falls back to the default.
    pub fn from_setting(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|m| Self::new(m).ok())
            .unwrap_or_default()
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn progress(&self, week_minutes: u32) -> GoalProgress {
        GoalProgress {
            value: week_minutes.min(self.0),
            maximum: self.0,
        }
    }
}

impl Default for WeeklyGoal {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// A determinate progress bar: `value` out of `maximum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub value: u32,
    pub maximum: u32,
}

impl GoalProgress {
    pub fn fraction(&self) -> f64 {
        if self.maximum == 0 {
            return 0.0;
        }
        f64::from(self.value) / f64::from(self.maximum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Progress};
    use chrono::NaiveDateTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    fn done_task(id: i64, created: NaiveDateTime, completed: Option<NaiveDateTime>) -> Task {
        Task {
            id,
            title: "t".into(),
            notes: None,
            start_date: None,
            due_date: None,
            priority: Priority::Low,
            progress: Progress::NotStarted,
            is_done: completed.is_some(),
            completed_at: completed,
            folder_id: None,
            created_at: created,
        }
    }

    fn session(started: NaiveDateTime, minutes: u32) -> FocusSession {
        FocusSession {
            id: 0,
            task_id: None,
            started_at: started,
            ended_at: started + Duration::minutes(i64::from(minutes)),
            duration_minutes: minutes,
        }
    }

    #[test]
    fn week_bounds_from_any_weekday() {
        let expected = (date(2024, 6, 10), date(2024, 6, 16));
        for d in 10..=16 {
            assert_eq!(week_bounds(date(2024, 6, d)), expected);
        }
    }

    #[test]
    fn done_today_uses_completion_date_not_creation_date() {
        let today = date(2024, 6, 12);
        let tasks = vec![
            done_task(1, at(date(2024, 1, 1), 9), Some(at(today, 8))),
            done_task(2, at(today, 7), Some(at(date(2024, 6, 11), 23))),
            done_task(3, at(today, 7), None),
        ];
        assert_eq!(mini_stats(&tasks, &[], today).done_today, 1);
    }

    #[test]
    fn week_minutes_sum_only_current_iso_week() {
        let today = date(2024, 6, 12);
        let sessions = vec![
            session(at(date(2024, 6, 10), 9), 25),
            session(at(date(2024, 6, 16), 22), 50),
            session(at(date(2024, 6, 9), 23), 40),
            session(at(date(2024, 6, 17), 0), 15),
            // Same week number, previous year.
            session(at(date(2023, 6, 14), 9), 60),
        ];
        assert_eq!(mini_stats(&[], &sessions, today).week_minutes, 75);
    }

    #[test]
    fn goal_progress_is_capped_at_goal() {
        let goal = WeeklyGoal::new(300).unwrap();
        assert_eq!(goal.progress(120), GoalProgress { value: 120, maximum: 300 });
        assert_eq!(goal.progress(900), GoalProgress { value: 300, maximum: 300 });
        assert!((goal.progress(150).fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn goal_range_is_enforced() {
        assert!(WeeklyGoal::new(29).is_err());
        assert!(WeeklyGoal::new(10_081).is_err());
        assert_eq!(WeeklyGoal::new(30).unwrap().minutes(), 30);
        assert_eq!(WeeklyGoal::from_setting("abc").minutes(), WeeklyGoal::DEFAULT);
        assert_eq!(WeeklyGoal::from_setting("5").minutes(), WeeklyGoal::DEFAULT);
        assert_eq!(WeeklyGoal::from_setting("600").minutes(), 600);
    }
}
