//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway database and home
//! directory and verify outputs.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    fn db_path(&self) -> std::path::PathBuf {
        self.dir.path().join("focusflow.db")
    }

    fn command(&self, args: &[&str]) -> Command {
        let home: &Path = self.dir.path();
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_focusflow"));
        cmd.args(args)
            .env("HOME", home)
            .env("FOCUSFLOW_ENV", "dev")
            .env("FOCUSFLOW_DB", self.db_path())
            .env_remove("FOCUSFLOW_LOG");
        cmd
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = self
            .command(args)
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.ok(args);
        serde_json::from_str(&stdout).expect("Failed to parse JSON output")
    }

    /// Start a long-running command in the background.
    fn spawn(&self, args: &[&str]) -> Child {
        self.command(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn CLI command")
    }
}

/// Kills a background `timer run` if a test fails before stopping it.
struct Host(Child);

impl Drop for Host {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn settle() {
    thread::sleep(Duration::from_millis(2500));
}

#[test]
fn task_add_lands_in_inbox_with_low_priority() {
    let sb = Sandbox::new();
    let out = sb.ok(&["task", "add", "Write report"]);
    assert!(out.contains("Task added:"));

    let tasks = sb.json(&["task", "list", "--json"]);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Write report");
    assert_eq!(tasks[0]["priority"], "Low");
    assert_eq!(tasks[0]["is_done"], false);

    let folders = sb.json(&["folder", "list", "--json"]);
    assert_eq!(folders[0]["name"], "Inbox");
    assert_eq!(tasks[0]["folder_id"], folders[0]["id"]);
}

#[test]
fn blank_title_is_an_error() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run(&["task", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn done_and_undo_toggle_completed_at() {
    let sb = Sandbox::new();
    sb.ok(&["task", "add", "Ship it"]);
    let id = sb.json(&["task", "list", "--json"])[0]["id"].to_string();

    sb.ok(&["task", "done", &id]);
    let task = sb.json(&["task", "show", &id]);
    assert_eq!(task["is_done"], true);
    assert!(!task["completed_at"].is_null());

    let done = sb.json(&["task", "list", "--json", "--mode", "done"]);
    assert_eq!(done.as_array().unwrap().len(), 1);

    sb.ok(&["task", "undo", &id]);
    let task = sb.json(&["task", "show", &id]);
    assert_eq!(task["is_done"], false);
    assert!(task["completed_at"].is_null());
}

#[test]
fn invalid_due_date_is_rejected() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run(&["task", "add", "x", "--due", "next week"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("YYYY-MM-DD"), "stderr: {stderr}");
}

#[test]
fn saved_priority_filter_applies_to_listing() {
    let sb = Sandbox::new();
    sb.ok(&["task", "add", "low one"]);
    sb.ok(&["task", "add", "high one", "--priority", "high"]);

    let out = sb.ok(&["filter", "priority", "High"]);
    assert!(out.contains("priority: High"));

    let tasks = sb.json(&["task", "list", "--json"]);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "high one");

    let shown = sb.ok(&["filter", "show"]);
    assert!(shown.contains("mode: all"));
}

#[test]
fn deleting_folder_moves_tasks_to_inbox() {
    let sb = Sandbox::new();
    let out = sb.ok(&["folder", "create", "Work", "--select"]);
    let work = out.trim().rsplit(' ').next().unwrap().to_string();
    sb.ok(&["task", "add", "a"]);
    sb.ok(&["task", "add", "b"]);

    sb.ok(&["folder", "delete", &work]);

    let tasks = sb.json(&["task", "list", "--json", "--all-folders"]);
    let folders = sb.json(&["folder", "list", "--json"]);
    let inbox = folders.as_array().unwrap()[0]["id"].clone();
    for task in tasks.as_array().unwrap() {
        assert_eq!(task["folder_id"], inbox);
    }
}

#[test]
fn inbox_cannot_be_deleted() {
    let sb = Sandbox::new();
    let folders = sb.json(&["folder", "list", "--json"]);
    let inbox = folders[0]["id"].to_string();
    let (_, stderr, code) = sb.run(&["folder", "delete", &inbox]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Inbox cannot be deleted"), "stderr: {stderr}");
}

#[test]
fn weekly_goal_is_range_checked() {
    let sb = Sandbox::new();
    let (_, _, code) = sb.run(&["stats", "goal", "20"]);
    assert_eq!(code, 1);

    sb.ok(&["stats", "goal", "600"]);
    let stats = sb.json(&["stats", "show", "--json"]);
    assert_eq!(stats["weekly_goal"], 600);
    assert_eq!(stats["week_minutes"], 0);
    assert_eq!(stats["done_today"], 0);
}

#[test]
fn timer_mode_and_preset_reload_idle_duration() {
    let sb = Sandbox::new();
    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["state"], "idle");
    assert_eq!(status["remaining_secs"], 1500);
    assert_eq!(status["display"], "25:00");

    let changed = sb.json(&["timer", "mode", "break"]);
    assert_eq!(changed["remaining_secs"], 600);

    sb.ok(&["timer", "preset", "50-10"]);
    sb.ok(&["timer", "mode", "work"]);
    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["remaining_secs"], 3000);
    assert_eq!(sb.ok(&["settings", "get", "work_m"]).trim(), "50");
}

#[test]
fn garbage_duration_fields_count_as_zero() {
    let sb = Sandbox::new();
    let event = sb.json(&[
        "timer", "durations", "work", "--minutes", "soon", "--seconds", "90",
    ]);
    assert_eq!(event["remaining_secs"], 90);
}

#[test]
fn timer_link_requires_existing_task() {
    let sb = Sandbox::new();
    let (_, _, code) = sb.run(&["timer", "link", "42"]);
    assert_eq!(code, 1);

    sb.ok(&["task", "add", "Focus target"]);
    let id = sb.json(&["task", "list", "--json"])[0]["id"].as_i64().unwrap();
    let status = sb.json(&["timer", "link", &id.to_string()]);
    assert_eq!(status["linked_task"], id);

    let status = sb.json(&["timer", "unlink"]);
    assert!(status["linked_task"].is_null());
    assert_eq!(status["linked_label"], "(no task linked)");
}

#[test]
fn pause_when_idle_is_a_no_op() {
    let sb = Sandbox::new();
    let (_, stderr, code) = sb.run(&["timer", "pause"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("not running"));
}

#[test]
fn settings_round_trip_and_defaults() {
    let sb = Sandbox::new();
    assert_eq!(sb.ok(&["settings", "get", "theme_name"]).trim(), "Sky");
    sb.ok(&["settings", "set", "theme_name", "Forest"]);
    assert_eq!(sb.ok(&["settings", "get", "theme_name"]).trim(), "Forest");
    assert!(sb.ok(&["settings", "list"]).contains("theme_name = Forest"));
}

#[test]
fn config_lives_under_home() {
    let sb = Sandbox::new();
    assert_eq!(
        sb.ok(&["config", "get", "timer.default_work_minutes"]).trim(),
        "25"
    );
    sb.ok(&["config", "set", "timer.default_work_minutes", "40"]);
    assert_eq!(
        sb.ok(&["config", "get", "timer.default_work_minutes"]).trim(),
        "40"
    );
    assert!(sb
        .dir
        .path()
        .join(".config/focusflow-dev/config.toml")
        .exists());

    let (_, stderr, code) = sb.run(&["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn linking_a_task_keeps_a_running_countdown_going() {
    let sb = Sandbox::new();
    sb.ok(&["task", "add", "Focus target"]);
    let id = sb.json(&["task", "list", "--json"])[0]["id"].as_i64().unwrap();
    sb.ok(&["timer", "durations", "work", "--seconds", "30"]);

    let mut host = Host(sb.spawn(&["timer", "run"]));
    settle();
    assert_eq!(sb.json(&["timer", "status"])["state"], "running");

    let linked = sb.json(&["timer", "link", &id.to_string()]);
    assert_eq!(linked["linked_task"], id);
    sb.ok(&["timer", "auto-break", "on"]);
    settle();

    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["state"], "running");
    assert_eq!(status["linked_task"], id);
    assert!(status["remaining_secs"].as_u64().unwrap() < 28);
    assert!(host.0.try_wait().unwrap().is_none(), "timer run exited");

    sb.ok(&["timer", "pause"]);
    let exit = host.0.wait().unwrap();
    assert!(exit.success());
    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["state"], "paused");
    assert_eq!(status["linked_task"], id);
    assert_eq!(status["auto_start_break"], true);
}

#[test]
fn mode_change_while_running_keeps_counting() {
    let sb = Sandbox::new();
    sb.ok(&["timer", "durations", "work", "--seconds", "30"]);
    let mut host = Host(sb.spawn(&["timer", "run"]));
    settle();

    let changed = sb.json(&["timer", "mode", "break"]);
    assert_eq!(changed["mode"], "break");
    settle();

    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["state"], "running");
    assert_eq!(status["mode"], "break");
    assert!(status["remaining_secs"].as_u64().unwrap() < 28);
    assert!(host.0.try_wait().unwrap().is_none(), "timer run exited");

    let (_, stderr, code) = sb.run(&["timer", "run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already running"), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn sigterm_pauses_the_countdown() {
    let sb = Sandbox::new();
    sb.ok(&["timer", "durations", "work", "--seconds", "30"]);
    let mut host = Host(sb.spawn(&["timer", "run"]));
    settle();

    let killed = Command::new("kill")
        .args(["-TERM", &host.0.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());
    let exit = host.0.wait().unwrap();
    assert!(exit.success());

    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["state"], "paused");
    let remaining = status["remaining_secs"].as_u64().unwrap();
    assert!(remaining > 0 && remaining < 30, "remaining: {remaining}");
}

#[test]
fn running_state_without_heartbeat_reads_as_paused() {
    let sb = Sandbox::new();
    let stored = r#"{"mode":"work","state":"running","remaining_secs":600,"saved_at":"2024-01-01T09:00:00"}"#;
    sb.ok(&["settings", "set", "timer_state", stored]);

    let status = sb.json(&["timer", "status"]);
    assert_eq!(status["state"], "paused");
    assert_eq!(status["remaining_secs"], 600);

    let (_, stderr, code) = sb.run(&["timer", "pause"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("not running"), "stderr: {stderr}");
}
