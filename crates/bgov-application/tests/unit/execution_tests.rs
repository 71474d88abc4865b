//! Execution tier: one run per user, step ceilings, deadline, memory guard

use crate::test_utils::{Stack, stack_with};
use bgov_domain::{Error, ExecutionPolicy, LimitKind, SessionPolicy, StatementKind, SystemPolicy};
use std::time::Duration;

fn stack(max_commands: u64, max_loop_count: u64) -> Stack {
    stack_with(
        SystemPolicy {
            max_execution_time: Duration::from_secs(10),
            ..SystemPolicy::default()
        },
        ExecutionPolicy {
            max_commands,
            max_loop_count,
            ..ExecutionPolicy::default()
        },
        SessionPolicy::default(),
    )
}

#[test]
fn test_start_requires_registered_user() {
    let stack = stack(100, 100);
    let err = stack.execution.start_basic_execution("ghost", "10 END").unwrap_err();
    assert!(err.is_not_found());
    assert!(!stack.execution.is_running("ghost"));
}

#[test]
fn test_second_start_is_rejected_and_keeps_first_run() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    let first = stack.execution.start_basic_execution("alice", "first").unwrap();

    let err = stack.execution.start_basic_execution("alice", "second").unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning { .. }));
    assert!(err.to_string().contains("already running"));
    assert!(!first.is_cancelled());

    let stats = stack.execution.execution_stats("alice").unwrap();
    assert_eq!(stats.running().unwrap().program, "first");
}

#[test]
fn test_command_ceiling_boundary() {
    let stack = stack(5, 100);
    stack.execution.register_user("alice").unwrap();
    let handle = stack.execution.start_basic_execution("alice", "busy").unwrap();

    for _ in 0..5 {
        stack.execution.check_basic_execution("alice", StatementKind::Other).unwrap();
    }
    let err = stack
        .execution
        .check_basic_execution("alice", StatementKind::Other)
        .unwrap_err();

    assert_eq!(err.limit_kind(), Some(LimitKind::Commands));
    assert!(err.to_string().starts_with("execution limit exceeded"));
    assert!(handle.is_cancelled());
    assert!(!stack.execution.is_running("alice"));
    // The user survives the stopped run
    assert!(stack.system.is_registered("alice"));
}

#[test]
fn test_only_loop_statements_count_towards_loop_ceiling() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    stack.execution.start_basic_execution("alice", "mixed").unwrap();

    for kind in [
        StatementKind::Other,
        StatementKind::For,
        StatementKind::Other,
        StatementKind::Goto,
    ] {
        stack.execution.check_basic_execution("alice", kind).unwrap();
    }

    let stats = stack.execution.execution_stats("alice").unwrap();
    let run = stats.running().unwrap();
    assert_eq!(run.command_count, 4);
    assert_eq!(run.loop_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_run_without_checks() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    let handle = stack.execution.start_basic_execution("alice", "10 INPUT A$").unwrap();
    assert_eq!(handle.remaining(), Duration::from_secs(10));

    tokio::time::advance(Duration::from_secs(9)).await;
    stack.execution.check_basic_execution("alice", StatementKind::Other).unwrap();

    tokio::time::timeout(Duration::from_secs(2), handle.token().cancelled())
        .await
        .expect("run should be cancelled at its deadline");
    assert!(!stack.execution.is_running("alice"));
    assert!(!stack.execution.execution_stats("alice").unwrap().is_running());

    let err = stack
        .execution
        .check_basic_execution("alice", StatementKind::Other)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_run_is_not_timed_out_later() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    stack.execution.start_basic_execution("alice", "first").unwrap();
    stack.execution.stop_basic_execution("alice").unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    let second = stack.execution.start_basic_execution("alice", "second").unwrap();
    // Past the first run's deadline, inside the second's
    tokio::time::sleep(Duration::from_secs(7)).await;

    assert!(!second.is_cancelled());
    assert!(stack.execution.is_running("alice"));
}

#[test]
fn test_check_reports_elapsed_deadline() {
    // No runtime: the deadline is only seen by the check
    let stack = stack_with(
        SystemPolicy {
            max_execution_time: Duration::ZERO,
            ..SystemPolicy::default()
        },
        ExecutionPolicy::default(),
        SessionPolicy::default(),
    );
    stack.execution.register_user("alice").unwrap();
    let handle = stack.execution.start_basic_execution("alice", "slow").unwrap();

    let err = stack
        .execution
        .check_basic_execution("alice", StatementKind::Other)
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(err.is_limit_exceeded());
    assert!(handle.is_cancelled());
    assert!(!stack.execution.is_running("alice"));
}

#[test]
fn test_stop_cancels_handle_and_second_stop_is_not_found() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    let handle = stack.execution.start_basic_execution("alice", "prog").unwrap();

    stack.execution.stop_basic_execution("alice").unwrap();
    assert!(handle.is_cancelled());
    assert!(!stack.execution.execution_stats("alice").unwrap().is_running());

    let err = stack.execution.stop_basic_execution("alice").unwrap_err();
    assert!(err.is_not_found());

    // A new run can start after a stop
    stack.execution.start_basic_execution("alice", "again").unwrap();
}

#[test]
fn test_check_without_run_is_not_found() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    let err = stack
        .execution
        .check_basic_execution("alice", StatementKind::Other)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_unregister_user_stops_run_first() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    let handle = stack.execution.start_basic_execution("alice", "prog").unwrap();

    stack.execution.unregister_user("alice").unwrap();
    assert!(handle.is_cancelled());
    assert!(!stack.execution.is_running("alice"));
    assert!(!stack.system.is_registered("alice"));
}

#[test]
fn test_system_stats_counts_runs() {
    let stack = stack(100, 100);
    stack.execution.register_user("alice").unwrap();
    stack.execution.register_user("bob").unwrap();
    stack.execution.start_basic_execution("alice", "prog").unwrap();

    let stats = stack.execution.system_stats().unwrap();
    assert_eq!(stats.active_users, 2);
    assert_eq!(stats.active_executions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_memory_guard_evicts_oldest_run() {
    let stack = stack(100, 100);
    for user in ["alice", "bob"] {
        stack.execution.register_user(user).unwrap();
    }
    let alice = stack.execution.start_basic_execution("alice", "old").unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    let bob = stack.execution.start_basic_execution("bob", "new").unwrap();

    stack.sampler.set_process(512, 5.0);
    assert_eq!(stack.execution.run_memory_guard_cycle().unwrap(), None);

    stack.sampler.set_process(stack.system.available_memory_mb() + 1, 5.0);
    let evicted = stack.execution.run_memory_guard_cycle().unwrap();
    assert_eq!(evicted.as_deref(), Some("alice"));
    assert!(alice.is_cancelled());
    assert!(!bob.is_cancelled());
    assert!(stack.execution.is_running("bob"));

    // One eviction per cycle
    let evicted = stack.execution.run_memory_guard_cycle().unwrap();
    assert_eq!(evicted.as_deref(), Some("bob"));
    assert_eq!(stack.execution.run_memory_guard_cycle().unwrap(), None);
}
