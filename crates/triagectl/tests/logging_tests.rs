//! Invocation log tests

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use triagectl::logging::{ErrorDetails, LogEntry, LOG_FILE_ENV};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_explicit_override_wins() {
    let path = LogEntry::discover_log_path_with(lookup(&[
        (LOG_FILE_ENV, "/tmp/custom.jsonl"),
        ("XDG_STATE_HOME", "/state"),
        ("HOME", "/home/jdoe"),
    ]));
    assert_eq!(path, Some(PathBuf::from("/tmp/custom.jsonl")));
}

#[test]
fn test_xdg_state_before_home() {
    let path = LogEntry::discover_log_path_with(lookup(&[
        ("XDG_STATE_HOME", "/state"),
        ("HOME", "/home/jdoe"),
    ]));
    assert_eq!(path, Some(PathBuf::from("/state/triage/ctl.jsonl")));
}

#[test]
fn test_home_fallback() {
    let path = LogEntry::discover_log_path_with(lookup(&[("HOME", "/home/jdoe")]));
    assert_eq!(
        path,
        Some(PathBuf::from("/home/jdoe/.local/state/triage/ctl.jsonl"))
    );
}

#[test]
fn test_no_location() {
    assert_eq!(LogEntry::discover_log_path_with(lookup(&[])), None);
}

#[test]
fn test_entries_append_as_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("ctl.jsonl");

    let ok = LogEntry::new(
        "classify",
        vec!["classify".into(), "printer".into()],
        Duration::from_millis(12),
        None,
    );
    let failed = LogEntry::new(
        "issues",
        vec!["issues".into(), "Bogus".into()],
        Duration::from_millis(3),
        Some(ErrorDetails {
            code: 1,
            message: "Unknown category 'Bogus'".into(),
        }),
    );
    for entry in [&ok, &failed] {
        LogEntry::write_to_file(&serde_json::to_string(entry).unwrap(), &path).unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: LogEntry = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first, ok);
    assert!(first.ok);
    assert_eq!(first.exit_code, 0);
    assert_eq!(first.duration_ms, 12);
    assert!(!lines[0].contains("\"error\""));

    let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
    assert!(!second.ok);
    assert_eq!(second.exit_code, 1);
    assert_eq!(second.error.unwrap().message, "Unknown category 'Bogus'");
    assert_ne!(first.req_id, second.req_id);
}

#[test]
fn test_timestamp_is_rfc3339() {
    let ts = LogEntry::now();
    assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "{}", ts);
}

#[test]
fn test_unwritable_log_goes_to_fallback_stream() {
    let dir = TempDir::new().unwrap();
    // Parent is a regular file, so the log cannot be created
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, "x").unwrap();
    let path = blocker.join("ctl.jsonl");

    let entry = LogEntry::new("priority", vec!["priority".into()], Duration::ZERO, None);
    let mut fallback: Vec<u8> = Vec::new();
    entry.write_or_fallback(Some(path.as_path()), &mut fallback).unwrap();

    let line = String::from_utf8(fallback).unwrap();
    let parsed: LogEntry = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(parsed, entry);
    assert!(!path.exists());
}

#[test]
fn test_writable_log_leaves_fallback_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ctl.jsonl");
    let entry = LogEntry::new("issues", vec![], Duration::from_millis(1), None);

    let mut fallback: Vec<u8> = Vec::new();
    entry.write_or_fallback(Some(path.as_path()), &mut fallback).unwrap();
    assert!(fallback.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
}

#[test]
fn test_no_location_uses_fallback() {
    let entry = LogEntry::new("resolve", vec![], Duration::ZERO, None);
    let mut fallback: Vec<u8> = Vec::new();
    entry.write_or_fallback(None, &mut fallback).unwrap();
    assert!(String::from_utf8(fallback).unwrap().contains("\"command\":\"resolve\""));
}
