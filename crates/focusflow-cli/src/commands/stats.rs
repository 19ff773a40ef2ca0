use clap::Subcommand;
use focusflow_core::storage::{keys, SessionLog, SettingsStore, StatsQuery};
use focusflow_core::WeeklyGoal;
use serde::Serialize;

use super::{open_database, print_json, today};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Done today, focus minutes this week and weekly goal progress
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the weekly focus goal in minutes (30-10080)
    Goal {
        /// Minutes per week
        minutes: i64,
    },
    /// List logged focus sessions, newest first
    Sessions {
        /// Show at most this many sessions
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct StatsReport {
    done_today: u32,
    week_minutes: u32,
    weekly_goal: u32,
    goal_progress: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, db) = open_database()?;

    match action {
        StatsAction::Show { json } => {
            let stats = db.get_mini_stats(today())?;
            let default_goal = config.weekly_goal().minutes().to_string();
            let goal = WeeklyGoal::from_setting(&db.get_setting(keys::WEEKLY_GOAL_MIN, &default_goal)?);
            let progress = goal.progress(stats.week_minutes);

            if json {
                print_json(&StatsReport {
                    done_today: stats.done_today,
                    week_minutes: stats.week_minutes,
                    weekly_goal: goal.minutes(),
                    goal_progress: progress.value,
                })?;
            } else {
                println!("Done today: {}", stats.done_today);
                println!(
                    "Focus this week: {} / {} min ({:.0}%)",
                    stats.week_minutes,
                    goal.minutes(),
                    progress.fraction() * 100.0
                );
            }
        }
        StatsAction::Goal { minutes } => {
            let goal = WeeklyGoal::new(minutes)?;
            db.set_setting(keys::WEEKLY_GOAL_MIN, &goal.minutes().to_string())?;
            println!("Weekly goal: {} min", goal.minutes());
        }
        StatsAction::Sessions { limit, json } => {
            let sessions: Vec<_> = db.list_sessions()?.into_iter().take(limit).collect();
            if json {
                print_json(&sessions)?;
            } else if sessions.is_empty() {
                println!("No focus sessions yet.");
            } else {
                for s in &sessions {
                    let task = s
                        .task_id
                        .map(|id| format!("task #{id}"))
                        .unwrap_or_else(|| "no task".to_string());
                    println!(
                        "{}  {:>3} min  {task}",
                        s.started_at.format("%Y-%m-%d %H:%M"),
                        s.duration_minutes
                    );
                }
            }
        }
    }
    Ok(())
}
