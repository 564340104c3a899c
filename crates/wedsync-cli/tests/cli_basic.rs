//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against temporary event and config files.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(config: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_wedsync-cli"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("WEDSYNC_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

const EVENTS: &str = r#"[
  {
    "id": "ceremony",
    "timeline_id": "smith-jones",
    "title": "Ceremony",
    "start_time": "2026-09-12T14:00:00Z",
    "end_time": "2026-09-12T15:00:00Z",
    "priority": "critical",
    "resources": ["photographer-1"]
  },
  {
    "id": "portraits",
    "timeline_id": "smith-jones",
    "title": "Family portraits",
    "start_time": "2026-09-12T14:30:00Z",
    "end_time": "2026-09-12T15:30:00Z",
    "resources": ["photographer-1"],
    "flexible": true,
    "dependencies": ["ceremony"]
  }
]"#;

fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("events.json");
    std::fs::write(&events, EVENTS).unwrap();
    let config = dir.path().join("timeline.toml");
    (dir, events, config)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_detect_lists_all_conflicts() {
    let (_dir, events, config) = setup();
    let (code, stdout, _) = run_cli(&config, &["conflicts", "detect", events.to_str().unwrap()]);
    assert_eq!(code, 0);

    let conflicts = json(&stdout);
    let ids: Vec<_> = conflicts
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "time_overlap:ceremony:portraits",
            "resource_overlap:ceremony:portraits",
            "dependency_violation:portraits:ceremony",
        ]
    );
}

#[test]
fn test_detect_filters_by_kind() {
    let (_dir, events, config) = setup();
    let (code, stdout, _) = run_cli(
        &config,
        &["conflicts", "detect", events.to_str().unwrap(), "--kind", "resource_overlap"],
    );
    assert_eq!(code, 0);
    let conflicts = json(&stdout);
    assert_eq!(conflicts.as_array().unwrap().len(), 1);
    assert_eq!(conflicts[0]["severity"], "error");
    assert_eq!(conflicts[0]["resolvable"], false);
}

#[test]
fn test_stats() {
    let (_dir, events, config) = setup();
    let (code, stdout, _) = run_cli(&config, &["conflicts", "stats", events.to_str().unwrap()]);
    assert_eq!(code, 0);
    let stats = json(&stdout);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["critical"], 3);
    assert_eq!(stats["auto_resolvable"], 2);
    assert_eq!(stats["resolved"], 0);
}

#[test]
fn test_propose_respects_configured_buffer() {
    let (_dir, events, config) = setup();
    let (code, _, _) = run_cli(&config, &["config", "set", "resolution.buffer_minutes", "30"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(&config, &["conflicts", "propose", events.to_str().unwrap()]);
    assert_eq!(code, 0);
    let proposals = json(&stdout);
    let time = &proposals[0];
    assert_eq!(time["conflict_id"], "time_overlap:ceremony:portraits");
    assert_eq!(time["targets"][0]["new_value"], "2026-09-12T15:30:00Z");
    assert_eq!(time["confidence"], 0.9);
}

#[test]
fn test_resolve_write_round_trip() {
    let (_dir, events, config) = setup();
    let path = events.to_str().unwrap();

    let (code, stdout, _) = run_cli(&config, &["conflicts", "resolve", path, "--write"]);
    assert_eq!(code, 0);
    let output = json(&stdout);
    assert_eq!(output["report"]["resolved"].as_array().unwrap().len(), 2);
    assert_eq!(output["events"][1]["start_time"], "2026-09-12T15:15:00Z");

    // Moving the portraits clears the photographer double-booking too.
    let (code, stdout, _) = run_cli(&config, &["conflicts", "detect", path]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 0);
}

#[test]
fn test_resolve_unknown_id_fails() {
    let (_dir, events, config) = setup();
    let (code, _, stderr) = run_cli(
        &config,
        &["conflicts", "resolve", events.to_str().unwrap(), "--id", "time_overlap:x:y"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown conflict"));
}

#[test]
fn test_validate_reports_issues() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("broken.json");
    std::fs::write(
        &events,
        r#"[{
            "id": "toast",
            "timeline_id": "t",
            "start_time": "2026-09-12T21:00:00Z",
            "end_time": "2026-09-12T20:00:00Z",
            "dependencies": ["dinner"]
        }]"#,
    )
    .unwrap();
    let config = dir.path().join("timeline.toml");

    let (code, stdout, _) = run_cli(&config, &["conflicts", "validate", events.to_str().unwrap()]);
    assert_eq!(code, 0);
    let issues = json(&stdout);
    assert_eq!(issues[0]["issue"], "inverted_window");
    assert_eq!(issues[1]["issue"], "dangling_dependency");
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("timeline.toml");

    let (code, stdout, _) = run_cli(&config, &["config", "get", "session.carry_over"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "fresh");

    let (code, _, _) = run_cli(&config, &["config", "set", "session.carry_over", "sticky"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&config, &["config", "get", "session.carry_over"]);
    assert_eq!(stdout.trim(), "sticky");

    let (code, _, _) = run_cli(&config, &["config", "set", "resolution.buffer_minutes", "-1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_out_of_range_buffer_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let events = dir.path().join("buffer.json");
    std::fs::write(
        &events,
        r#"[
          {
            "id": "dinner",
            "timeline_id": "t",
            "start_time": "2026-09-12T18:00:00Z",
            "end_time": "2026-09-12T19:00:00Z"
          },
          {
            "id": "speeches",
            "timeline_id": "t",
            "start_time": "2026-09-12T18:30:00Z",
            "end_time": "2026-09-12T19:30:00Z",
            "dependencies": ["dinner"],
            "buffer_minutes": 4611686018427387903
          }
        ]"#,
    )
    .unwrap();
    let config = dir.path().join("timeline.toml");
    let path = events.to_str().unwrap();

    let (code, stdout, _) = run_cli(&config, &["conflicts", "detect", path]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 2);

    let (code, stdout, _) = run_cli(&config, &["conflicts", "propose", path]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 0);

    let (code, stdout, _) = run_cli(&config, &["conflicts", "validate", path]);
    assert_eq!(code, 0);
    let issues = json(&stdout);
    assert_eq!(issues[0]["issue"], "invalid_buffer");
    assert_eq!(issues[0]["event_id"], "speeches");
}
