// CLI smoke tests for the frl binary's JSON output.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_frl");
    Command::new(exe)
}

fn parse_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect()
}

#[test]
fn demo_walks_every_handle_kind() {
    let output = cmd().arg("demo").output().expect("demo");
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["step"], "text");
    assert_eq!(lines[0]["value"], "FERRULE DEMO");
    assert_eq!(lines[0]["len"], 12);
    assert_eq!(lines[1]["step"], "uuid");
    assert_eq!(lines[2]["step"], "stream");
    assert_eq!(lines[2]["backend"], "memory");
    assert_eq!(lines[2]["first_read"], "ABCD");
    assert_eq!(lines[2]["second_read"], "CD");
    assert_eq!(lines[2]["end_position"], 10);
    assert_eq!(lines[3]["step"], "released");
    assert_eq!(lines[3]["live"], 0);
}

#[test]
fn demo_file_backend_matches_memory() {
    let output = cmd().args(["demo", "--file"]).output().expect("demo");
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    assert_eq!(lines[2]["backend"], "file");
    assert_eq!(lines[2]["first_read"], "ABCD");
    assert_eq!(lines[2]["end_position"], 10);
}

#[test]
fn parse_round_trips_canonical_text() {
    let output = cmd()
        .args(["parse", "67e55044-10b1-426f-9247-bb680e5fe0c8"])
        .output()
        .expect("parse");
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    assert_eq!(lines[0]["uuid"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
    assert_eq!(
        lines[0]["urn"],
        "urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8"
    );
    assert_eq!(lines[0]["version"], 4);
    assert_eq!(lines[0]["nil"], false);
    assert!(lines[0]["timestamp"].is_null());
}

#[test]
fn new_v7_reports_a_timestamp() {
    let output = cmd().args(["new", "--v7"]).output().expect("new");
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    assert_eq!(lines[0]["version"], 7);
    assert!(lines[0]["timestamp_ms"].as_u64().expect("millis") > 0);
    assert!(lines[0]["timestamp"].as_str().expect("rfc3339").ends_with('Z'));
}

#[test]
fn parse_rejects_malformed_text_with_json_error() {
    let output = cmd().args(["parse", "not-a-uuid"]).output().expect("parse");
    assert_eq!(output.status.code(), Some(100));

    let lines = parse_lines(&output.stderr);
    assert_eq!(lines[0]["error"]["code"], 100);
    assert_eq!(lines[0]["error"]["kind"], "Parse");
}
