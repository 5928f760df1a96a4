mod common;

use common::{init_baseline, read_json, tamperwatch_cmd, write_tree};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Starts `tamperwatch watch` and returns once it reports that it is watching.
fn spawn_watch(root: &Path, baseline: &Path, events: &Path) -> (Child, BufReader<ChildStdout>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tamperwatch"))
        .arg("watch")
        .arg("--path")
        .arg(root)
        .arg("--baseline")
        .arg(baseline)
        .arg("--events")
        .arg(events)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut first_line = String::new();
    stdout.read_line(&mut first_line).unwrap();
    assert!(first_line.starts_with("Watching"), "unexpected output: {first_line}");

    // The watcher is registered right after the banner.
    thread::sleep(Duration::from_millis(500));
    (child, stdout)
}

fn interrupt(mut child: Child, mut stdout: BufReader<ChildStdout>) -> String {
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
    let status = child.wait().unwrap();
    assert!(status.success(), "watch exited with {status}");

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    rest
}

#[test]
fn watch_records_changes_and_updates_baseline() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    write_tree(&root, &[("keep.txt", "keep"), ("edit.txt", "v1"), ("drop.txt", "bye")]);
    let baseline = temp.path().join("baseline.json");
    let events = temp.path().join("log/events.json");
    init_baseline(&root, &baseline);

    let (child, stdout) = spawn_watch(&root, &baseline, &events);

    fs::write(root.join("edit.txt"), "v2").unwrap();
    fs::remove_file(root.join("drop.txt")).unwrap();
    fs::write(root.join("new.txt"), "new").unwrap();
    thread::sleep(Duration::from_millis(1500));

    let output = interrupt(child, stdout);
    assert!(output.contains("Events saved to"));

    let baseline_json = read_json(&baseline);
    let tracked = baseline_json["baseline"].as_object().unwrap();
    assert!(tracked.contains_key("keep.txt"));
    assert!(tracked.contains_key("edit.txt"));
    assert!(!tracked.contains_key("drop.txt"));
    assert!(tracked.contains_key("new.txt"));
    assert_eq!(
        baseline_json["baseline"]["edit.txt"],
        "fb04dcb6970e4c3d1873de51fd5a50d7bb46b3383113602665c350ec40b5f990"
    );

    let log = read_json(&events);
    let recorded = log["events"].as_array().unwrap();
    let has = |kind: &str, path: &str| recorded.iter().any(|e| e["type"] == kind && e["path"] == path);
    assert!(has("MODIFIED", "edit.txt"));
    assert!(has("DELETED", "drop.txt"));
    assert!(has("ADDED", "new.txt"));
    assert!(!recorded.iter().any(|e| e["path"] == "keep.txt"));

    assert!(temp.path().join("log/report.html").exists());

    // A clean verify proves the saved baseline reflects the tree.
    tamperwatch_cmd()
        .arg("verify")
        .arg("--path")
        .arg(&root)
        .arg("--baseline")
        .arg(&baseline)
        .assert()
        .success();
}

#[test]
fn watch_appends_to_existing_event_log() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    write_tree(&root, &[("a.txt", "a")]);
    let baseline = temp.path().join("baseline.json");
    let events = temp.path().join("events.json");
    init_baseline(&root, &baseline);

    let (child, stdout) = spawn_watch(&root, &baseline, &events);
    fs::write(root.join("a.txt"), "a2").unwrap();
    thread::sleep(Duration::from_millis(1500));
    interrupt(child, stdout);

    let first_session = read_json(&events)["events"].as_array().unwrap().len();
    assert!(first_session >= 1);

    let (child, stdout) = spawn_watch(&root, &baseline, &events);
    fs::remove_file(root.join("a.txt")).unwrap();
    thread::sleep(Duration::from_millis(1500));
    interrupt(child, stdout);

    let log = read_json(&events);
    let recorded = log["events"].as_array().unwrap();
    assert_eq!(recorded.len(), first_session + 1);
    assert_eq!(recorded[0]["type"], "MODIFIED");
    assert_eq!(recorded[first_session]["type"], "DELETED");
    assert_eq!(recorded[first_session]["path"], "a.txt");
}

#[test]
fn watch_requires_existing_baseline() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("data");
    write_tree(&root, &[("a.txt", "a")]);

    tamperwatch_cmd()
        .arg("watch")
        .arg("--path")
        .arg(&root)
        .arg("--baseline")
        .arg(temp.path().join("missing.json"))
        .arg("--events")
        .arg(temp.path().join("events.json"))
        .assert()
        .code(255)
        .stderr(predicate::str::contains("does not exist"));

    assert!(!temp.path().join("events.json").exists());
}

#[test]
fn watch_requires_existing_directory() {
    let temp = TempDir::new().unwrap();
    let baseline = temp.path().join("baseline.json");
    fs::write(&baseline, r#"{"baseline": {}}"#).unwrap();

    tamperwatch_cmd()
        .arg("watch")
        .arg("--path")
        .arg(temp.path().join("nope"))
        .arg("--baseline")
        .arg(&baseline)
        .arg("--events")
        .arg(temp.path().join("events.json"))
        .assert()
        .code(255);
}
