use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const OFFLINE_SEED_URL: &str = "http://127.0.0.1:9/todos";

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todoapp-{nanos}-{name}"))
}

fn write_tasks(dir: &Path, tasks: serde_json::Value) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("todos.json"), tasks.to_string()).unwrap();
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_todo_cli"))
        .args(args)
        .env("TODOAPP_STORE_DIR", dir)
        .env("TODOAPP_CONFIG_PATH", dir.join("config.json"))
        .env("TODOAPP_SEED_URL", OFFLINE_SEED_URL)
        .output()
        .expect("failed to run todo_cli")
}

fn sample_tasks() -> serde_json::Value {
    serde_json::json!([
        {"id": 1, "createdAt": 100, "title": "low undated", "priority": "low", "dueDate": "", "completed": false},
        {"id": 2, "createdAt": 300, "title": "high late", "priority": "high", "dueDate": "2030-05-01", "completed": true},
        {"id": 3, "createdAt": 200, "title": "medium soon", "priority": "medium", "dueDate": "2030-01-01", "completed": false},
        {"id": 4, "createdAt": 400, "title": "mystery", "priority": "someday", "dueDate": "", "completed": false}
    ])
}

fn listed_ids(dir: &Path, args: &[&str]) -> Vec<i64> {
    let output = run(dir, args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    listed
        .as_array()
        .expect("task array")
        .iter()
        .map(|task| task["id"].as_i64().expect("numeric id"))
        .collect()
}

#[test]
fn list_defaults_to_all_newest_first() {
    let dir = temp_dir("cli-list-default");
    write_tasks(&dir, sample_tasks());

    let ids = listed_ids(&dir, &["list", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(ids, vec![4, 2, 3, 1]);
}

#[test]
fn list_filters_by_status() {
    let dir = temp_dir("cli-list-filter");
    write_tasks(&dir, sample_tasks());

    let pending = listed_ids(&dir, &["list", "--filter", "pending", "--json"]);
    let completed = listed_ids(&dir, &["list", "--filter", "completed", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(pending, vec![4, 3, 1]);
    assert_eq!(completed, vec![2]);
}

#[test]
fn list_sorts_by_priority_and_due_date() {
    let dir = temp_dir("cli-list-sort");
    write_tasks(&dir, sample_tasks());

    let by_priority = listed_ids(&dir, &["list", "--sort", "priority", "--json"]);
    let by_due = listed_ids(&dir, &["list", "--sort", "dueDate", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(by_priority, vec![2, 3, 1, 4]);
    assert_eq!(by_due, vec![3, 2, 1, 4]);
}

#[test]
fn list_plain_text_shows_table() {
    let dir = temp_dir("cli-list-plain");
    write_tasks(&dir, sample_tasks());

    let output = run(&dir, &["list", "--filter", "completed"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tasks (1) filter: completed, sort: created"));
    assert!(stdout.contains("high late"));
    assert!(!stdout.contains("low undated"));
}

#[test]
fn list_rejects_unknown_filter_token() {
    let dir = temp_dir("cli-list-bad-filter");
    write_tasks(&dir, sample_tasks());

    let output = run(&dir, &["list", "--filter", "false"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn stats_counts_loaded_tasks() {
    let dir = temp_dir("cli-stats");
    write_tasks(&dir, sample_tasks());

    let output = run(&dir, &["stats", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["pending"], 3);
    assert_eq!(stats["unspecified"], 1);
}

#[test]
fn show_prints_task_details() {
    let dir = temp_dir("cli-show");
    write_tasks(&dir, sample_tasks());

    let output = run(&dir, &["show", "3"]);
    let missing = run(&dir, &["show", "99"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("medium soon (3)"));
    assert!(stdout.contains("due:         2030-01-01"));

    assert!(!missing.status.success());
    let stderr = String::from_utf8_lossy(&missing.stderr);
    assert!(stderr.contains("ERROR: invalid_input - task not found"));
}
