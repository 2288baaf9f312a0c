//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

mod common;

use common::{read_store, run_cli_failure, run_cli_success, run_cli_with_input};
use tempfile::TempDir;

#[test]
fn test_add_and_list() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["add", "Write report", "--tag", "work"]);
    assert!(out.contains("Task added: Write report"));

    let listing = run_cli_success(home.path(), &["list"]);
    assert!(listing.contains("Write report"));
    assert!(listing.contains("[ ]"));

    let store = read_store(home.path());
    assert_eq!(store["tasks"][0]["tag"], "work");
    assert_eq!(store["tasks"][0]["status"], "active");
    assert!(store["sorted_ids"]["1"].is_string());
}

#[test]
fn test_list_empty() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["list"]);
    assert!(out.contains("No tasks available."));
}

#[test]
fn test_listing_is_newest_first() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["add", "first"]);
    run_cli_success(home.path(), &["add", "second"]);
    let listing = run_cli_success(home.path(), &["list"]);
    let first = listing.find("first").unwrap();
    let second = listing.find("second").unwrap();
    assert!(second < first);
}

#[test]
fn test_done_hides_from_default_listing() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["add", "Ship it"]);
    run_cli_success(home.path(), &["list"]);
    run_cli_success(home.path(), &["id", "1", "done"]);

    let listing = run_cli_success(home.path(), &["list"]);
    assert!(listing.contains("No tasks with status: active"));

    let all = run_cli_success(home.path(), &["list", "--status", "all"]);
    assert!(all.contains("[x]"));

    let store = read_store(home.path());
    assert_eq!(store["tasks"][0]["status"], "done");
    assert!(store["tasks"][0]["date_done"].is_string());
}

#[test]
fn test_modify_and_delete() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["add", "Draft"]);
    run_cli_success(home.path(), &["list"]);
    run_cli_success(
        home.path(),
        &["id", "1", "mod", "--text", "Final", "--date", "2030-01-02"],
    );
    let store = read_store(home.path());
    assert_eq!(store["tasks"][0]["text"], "Final");
    assert_eq!(store["tasks"][0]["date"], "2030-01-02");

    run_cli_success(home.path(), &["id", "1", "delete"]);
    let store = read_store(home.path());
    assert_eq!(store["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_unknown_display_id_fails() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["add", "Only task"]);
    let stderr = run_cli_failure(home.path(), &["id", "7", "done"]);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();
    assert_eq!(
        run_cli_success(home.path(), &["get", "timer.work_duration"]).trim(),
        "25"
    );
    run_cli_success(home.path(), &["set", "timer.work_duration", "50"]);
    assert_eq!(
        run_cli_success(home.path(), &["get", "timer.work_duration"]).trim(),
        "50"
    );
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_invalid_values() {
    let home = TempDir::new().unwrap();
    run_cli_failure(home.path(), &["set", "timer.work_duration", "0"]);
    run_cli_failure(home.path(), &["get", "timer.nope"]);
}

#[test]
fn test_stats_without_data() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(home.path(), &["stats", "2024", "10"]);
    assert!(out.contains("isn't in the data"));
}

#[test]
fn test_start_and_quit() {
    let home = TempDir::new().unwrap();
    run_cli_success(home.path(), &["add", "Focus"]);
    run_cli_success(home.path(), &["list"]);

    let (stdout, stderr, code) =
        run_cli_with_input(home.path(), &["id", "1", "start"], "q\n");
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("Type 'q' to stop the timer:"));

    let summary = std::fs::read_to_string(home.path().join("pomodoro_summary.txt")).unwrap();
    assert!(summary.contains("Work started at:"));
    assert!(summary.contains("Pomodoros completed: 0"));

    let store = read_store(home.path());
    let history = store["tasks"][0]["history"].as_object().unwrap();
    let sessions: Vec<_> = history
        .values()
        .flat_map(|v| v.as_array().unwrap().iter())
        .collect();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0]["stop"].is_string());

    // The day's work now shows up in the monthly stats.
    let day = history.keys().next().unwrap();
    let (year, month) = (&day[0..4], &day[5..7]);
    let month = month.trim_start_matches('0');
    let chart = run_cli_success(home.path(), &["stats", year, month]);
    assert!(chart.starts_with("Work Hours by Date:"));
}
