use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

const OFFLINE_SEED_URL: &str = "http://127.0.0.1:9/todos";

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todoapp-{nanos}-{name}"))
}

fn run(dir: &Path, seed_url: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_todo_cli"))
        .args(args)
        .env("TODOAPP_STORE_DIR", dir)
        .env("TODOAPP_CONFIG_PATH", dir.join("config.json"))
        .env("TODOAPP_SEED_URL", seed_url)
        .output()
        .expect("failed to run todo_cli")
}

/// Answers a single HTTP request with `body` and returns the URL to hit.
fn serve_once(body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    format!("http://{addr}/todos")
}

fn placeholder_body(count: i64) -> String {
    let records: Vec<_> = (1..=count)
        .map(|id| {
            serde_json::json!({
                "userId": 1,
                "id": id,
                "title": format!("placeholder {id}"),
                "completed": id == 4
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

#[test]
fn first_run_seeds_five_tasks_from_remote() {
    let dir = temp_dir("cli-seed");
    let url = serve_once(placeholder_body(8));

    let output = run(&dir, &url, &["list", "--json"]);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("todos.json")).unwrap()).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let tasks = stored.as_array().expect("task array");
    assert_eq!(tasks.len(), 5);
    for (index, task) in tasks.iter().enumerate() {
        assert_eq!(task["id"], index as i64 + 1);
        assert_eq!(task["title"], format!("placeholder {}", index + 1));
        assert_eq!(task["completed"], false);
        assert_eq!(task["priority"], "medium");
        assert_eq!(task["description"], "");
        assert_eq!(task["dueDate"], "");
    }

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(5));
}

#[test]
fn seed_limit_override_truncates_differently() {
    let dir = temp_dir("cli-seed-limit");
    let url = serve_once(placeholder_body(8));

    let output = run(
        &dir,
        &url,
        &["stats", "--json", "--config-override", "seed_limit=2"],
    );
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 2);
}

#[test]
fn seed_failure_is_reported_and_command_continues() {
    let dir = temp_dir("cli-seed-offline");

    let output = run(&dir, OFFLINE_SEED_URL, &["list"]);
    let stored_exists = dir.join("todos.json").exists();
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: network_error"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks found"));
    assert!(!stored_exists);
}

#[test]
fn add_after_failed_seed_persists_new_list() {
    let dir = temp_dir("cli-seed-offline-add");

    let output = run(&dir, OFFLINE_SEED_URL, &["add", "offline task"]);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("todos.json")).unwrap()).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert_eq!(stored.as_array().map(Vec::len), Some(1));
    assert_eq!(stored[0]["title"], "offline task");
}

#[test]
fn corrupt_storage_is_fatal_and_untouched() {
    let dir = temp_dir("cli-seed-corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("todos.json"), "{ not a list").unwrap();

    let output = run(&dir, OFFLINE_SEED_URL, &["add", "should not land"]);
    let content = std::fs::read_to_string(dir.join("todos.json")).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_data"));
    assert_eq!(content, "{ not a list");
}
