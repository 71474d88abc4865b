//! Stats snapshot rendering

use bgov_domain::{ExecutionStats, RunningExecution};
use chrono::Utc;

#[test]
fn not_running_renders_status_tag() {
    let stats = ExecutionStats::NotRunning {
        username: "alice".to_string(),
    };
    assert!(!stats.is_running());
    assert_eq!(stats.to_string(), "no running program");

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["status"], "not_running");
    assert_eq!(json["username"], "alice");
}

#[test]
fn running_exposes_counters() {
    let stats = ExecutionStats::Running(RunningExecution {
        username: "alice".to_string(),
        program: "loop.bas".to_string(),
        started_at: Utc::now(),
        elapsed_ms: 1500,
        remaining_ms: 1000,
        command_count: 12,
        loop_count: 4,
        max_commands: 20_000_000,
        max_loop_count: 3_000_000,
    });
    let run = stats.running().unwrap();
    assert_eq!(run.command_count, 12);
    assert!(stats.to_string().contains("12 statements, 4 loops"));

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["loop_count"], 4);
}
