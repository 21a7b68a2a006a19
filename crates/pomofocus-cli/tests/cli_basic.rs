//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory
//! and checks the JSON it prints.

use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tempfile::TempDir;

struct Cli {
    data_dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            data_dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// Run a CLI command and return (code, stdout, stderr).
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let output = Command::new(env!("CARGO_BIN_EXE_pomofocus"))
            .args(args)
            .env("POMOFOCUS_DATA_DIR", self.data_dir.path())
            .env_remove("POMOFOCUS_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        (output.status.code().unwrap_or(-1), stdout, stderr)
    }

    /// Start a long-running command in the background.
    fn spawn(&self, args: &[&str]) -> Child {
        Command::new(env!("CARGO_BIN_EXE_pomofocus"))
            .args(args)
            .env("POMOFOCUS_DATA_DIR", self.data_dir.path())
            .env_remove("POMOFOCUS_LOG")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn CLI command")
    }

    /// Poll `status` until `is_playing` matches or the deadline passes.
    fn wait_for_playing(&self, playing: bool) -> Value {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = self.json(&["timer", "status"]);
            if status["is_playing"] == playing || Instant::now() > deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(200));
        }
    }

    fn ok(&self, args: &[&str]) -> String {
        let (code, stdout, stderr) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> Value {
        let stdout = self.ok(args);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?}: {e}\n{stdout}"))
    }
}

#[test]
fn test_fresh_status() {
    let cli = Cli::new();
    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["mode"], "focus");
    assert_eq!(status["is_playing"], false);
    assert_eq!(status["remaining_secs"], 1500);
    assert_eq!(status["remaining_label"], "25:00");
    assert_eq!(status["completed_count"], 0);
}

#[test]
fn test_skip_and_mode_persist_between_runs() {
    let cli = Cli::new();
    let skipped = cli.json(&["timer", "skip"]);
    assert_eq!(skipped["type"], "timer_skipped");
    assert_eq!(skipped["to"], "short_break");

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["mode"], "short_break");
    assert_eq!(status["completed_count"], 0);

    let selected = cli.json(&["timer", "mode", "long-break"]);
    assert_eq!(selected["type"], "mode_selected");
    assert_eq!(selected["remaining_secs"], 900);

    let reset = cli.json(&["timer", "reset-session"]);
    assert_eq!(reset["type"], "session_reset");
    assert_eq!(cli.json(&["timer", "status"])["mode"], "focus");
}

#[test]
fn test_target_is_reported() {
    let cli = Cli::new();
    let status = cli.json(&["timer", "target", "8"]);
    assert_eq!(status["target_pomodoros"], 8);
    assert_eq!(cli.json(&["timer", "status"])["target_pomodoros"], 8);
}

#[test]
fn test_unknown_mode_is_rejected() {
    let cli = Cli::new();
    let (code, _, _) = cli.run(&["timer", "mode", "nap"]);
    assert_ne!(code, 0);
}

#[test]
fn test_task_lifecycle() {
    let cli = Cli::new();
    let task = cli.json(&["task", "add", "Write tests", "--estimate", "2", "--category", "study"]);
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["category"], "study");
    assert_eq!(task["pomodoro_estimate"], 2);

    let selected = cli.json(&["task", "select", &id]);
    assert_eq!(selected["current"]["id"], id.as_str());

    let listed = cli.json(&["task", "list"]);
    assert_eq!(listed["current"], id.as_str());
    assert_eq!(listed["tasks"].as_array().unwrap().len(), 1);

    let done = cli.json(&["task", "done", &id]);
    assert_eq!(done["completed"], true);

    let active = cli.json(&["task", "list"]);
    assert!(active["tasks"].as_array().unwrap().is_empty());
    assert_eq!(active["current"], Value::Null);
    let archived = cli.json(&["task", "list", "--archived"]);
    assert_eq!(archived["tasks"][0]["id"], id.as_str());

    let restored = cli.json(&["task", "restore", &id]);
    assert_eq!(restored["completed"], false);
    assert_eq!(restored["pomodoros_completed"], 0);

    cli.json(&["task", "delete", &id]);
    assert!(cli.json(&["task", "list"])["tasks"].as_array().unwrap().is_empty());
}

#[test]
fn test_task_add_uses_default_category_setting() {
    let cli = Cli::new();
    cli.ok(&["settings", "set", "default_category", "personal"]);
    let task = cli.json(&["task", "add", "Groceries"]);
    assert_eq!(task["category"], "personal");
}

#[test]
fn test_blank_task_title_fails() {
    let cli = Cli::new();
    let (code, _, stderr) = cli.run(&["task", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_settings_clamp_and_reach_timer() {
    let cli = Cli::new();
    assert_eq!(cli.ok(&["settings", "set", "work_minutes", "200"]).trim(), "90");
    assert_eq!(cli.ok(&["settings", "get", "work_minutes"]).trim(), "90");
    assert_eq!(cli.json(&["timer", "status"])["remaining_secs"], 90 * 60);

    let settings = cli.json(&["settings", "reset"]);
    assert_eq!(settings["work_minutes"], 25);
}

#[test]
fn test_unknown_setting_fails() {
    let cli = Cli::new();
    let (code, _, stderr) = cli.run(&["settings", "get", "no_such_key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"), "{stderr}");
}

#[test]
fn test_premium_unlocks_premium_sounds() {
    let cli = Cli::new();
    let (code, _, stderr) = cli.run(&["settings", "set", "alarm_sound", "gong"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("premium"), "{stderr}");

    let status = cli.json(&["premium", "status"]);
    assert_eq!(status["entitlement"]["is_premium"], false);
    assert_eq!(status["products"].as_array().unwrap().len(), 3);

    let entitlement = cli.json(&["premium", "purchase", "premium_lifetime"]);
    assert_eq!(entitlement["is_premium"], true);
    assert_eq!(cli.ok(&["settings", "get", "is_premium"]).trim(), "true");

    cli.ok(&["settings", "set", "alarm_sound", "gong"]);
    assert_eq!(cli.ok(&["settings", "get", "alarm_sound"]).trim(), "gong");
}

#[test]
fn test_cancelled_purchase_is_silent() {
    let cli = Cli::new();
    let out = cli.json(&["premium", "purchase", "premium_monthly", "--cancel"]);
    assert_eq!(out["cancelled"], true);
    assert_eq!(cli.json(&["premium", "status"])["entitlement"]["is_premium"], false);
}

#[test]
fn test_restore_without_purchases_fails() {
    let cli = Cli::new();
    let (code, _, stderr) = cli.run(&["premium", "restore"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No previous purchases"), "{stderr}");
}

#[test]
fn test_empty_stats() {
    let cli = Cli::new();
    let today = cli.json(&["stats", "today"]);
    assert_eq!(today["total_sessions"], 0);
    assert_eq!(today["current_streak"], 0);

    let heatmap = cli.json(&["stats", "heatmap", "--weeks", "2"]);
    assert_eq!(heatmap.as_array().unwrap().len(), 14);

    assert!(cli.json(&["stats", "daily"]).as_array().unwrap().is_empty());
    assert_eq!(cli.json(&["stats", "clear"])["removed"], 0);
}

#[test]
fn test_ambient_is_wanted_but_silent_in_terminal() {
    let cli = Cli::new();
    let event = cli.json(&["timer", "ambient", "on"]);
    assert_eq!(event["type"], "ambient_changed");
    assert_eq!(event["wanted"], true);
    assert_eq!(event["playing"], false);

    let event = cli.json(&["timer", "ambient", "off"]);
    assert_eq!(event["wanted"], false);
}

#[test]
fn test_heatmap_weeks_out_of_range_is_rejected() {
    let cli = Cli::new();
    let (code, _, _) = cli.run(&["stats", "heatmap", "--weeks", "4000000000"]);
    assert_ne!(code, 0);
    let (code, _, _) = cli.run(&["stats", "heatmap", "--weeks", "0"]);
    assert_ne!(code, 0);
    assert_eq!(cli.json(&["stats", "heatmap", "--weeks", "104"]).as_array().unwrap().len(), 728);
}

#[test]
fn test_pause_from_second_command_stops_foreground_countdown() {
    let cli = Cli::new();
    let mut foreground = cli.spawn(&["timer", "start"]);

    let status = cli.wait_for_playing(true);
    assert_eq!(status["is_playing"], true, "foreground never started");

    // Looking and tweaking leave it running.
    assert_eq!(cli.json(&["timer", "target", "6"])["is_playing"], true);
    assert_eq!(cli.json(&["timer", "status"])["is_playing"], true);

    let paused = cli.json(&["timer", "pause"]);
    assert_eq!(paused["is_playing"], false);

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = foreground.try_wait().expect("wait on foreground") {
            break Some(exit);
        }
        if Instant::now() > deadline {
            let _ = foreground.kill();
            break None;
        }
        thread::sleep(Duration::from_millis(100));
    };
    assert!(exit.is_some_and(|e| e.success()), "foreground kept running");

    let status = cli.json(&["timer", "status"]);
    assert_eq!(status["is_playing"], false);
    assert_eq!(status["target_pomodoros"], 6);
    assert_eq!(status["remaining_secs"], paused["remaining_secs"]);
}
