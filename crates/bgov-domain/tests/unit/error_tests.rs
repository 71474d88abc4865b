//! Unit tests for domain error types

use bgov_domain::{Error, LimitKind};
use std::time::Duration;

#[test]
fn test_capacity_error() {
    let error = Error::capacity("concurrent users", 50);
    assert!(error.is_capacity());
    assert!(!error.is_limit_exceeded());
    assert_eq!(error.to_string(), "capacity reached: concurrent users (limit 50)");
}

#[test]
fn test_execution_limit_message() {
    let error = Error::limit(LimitKind::Commands, 6.0, 5.0);
    assert!(error.is_limit_exceeded());
    assert_eq!(error.limit_kind(), Some(LimitKind::Commands));
    assert_eq!(error.to_string(), "execution limit exceeded: commands 6 > 5");
}

#[test]
fn test_session_limit_message() {
    let error = Error::limit(LimitKind::Bandwidth, 10_241.0, 10_240.0);
    assert!(error.is_limit_exceeded());
    assert!(error.to_string().starts_with("session rate limit exceeded"));
    assert!(error.to_string().contains("bandwidth"));
}

#[test]
fn test_timeout_is_a_limit() {
    let error = Error::timeout("alice", Duration::from_secs(86_400));
    assert!(error.is_limit_exceeded());
    assert_eq!(error.limit_kind(), None);
    assert_eq!(
        error.to_string(),
        "execution limit exceeded: alice ran longer than 86400s"
    );
}

#[test]
fn test_already_running_error() {
    let error = Error::already_running("bob");
    match &error {
        Error::AlreadyRunning { username } => assert_eq!(username, "bob"),
        _ => panic!("Expected AlreadyRunning error"),
    }
    assert_eq!(error.to_string(), "program already running for user bob");
}

#[test]
fn test_not_found_error() {
    let error = Error::not_found("session s1");
    assert!(error.is_not_found());
    match error {
        Error::NotFound { resource } => assert_eq!(resource, "session s1"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_config_error() {
    let error = Error::config("bad value");
    match error {
        Error::Configuration { message, source } => {
            assert_eq!(message, "bad value");
            assert!(source.is_none());
        }
        _ => panic!("Expected Configuration error"),
    }
}

#[test]
fn test_poisoned_lock_is_internal() {
    let lock = std::sync::Arc::new(std::sync::Mutex::new(0));
    let poisoner = std::sync::Arc::clone(&lock);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("poison");
    })
    .join();

    let error: Error = lock.lock().unwrap_err().into();
    assert!(matches!(error, Error::Internal { .. }));
    assert!(error.to_string().contains("poisoned"));
}

#[test]
fn test_limit_kind_scope() {
    for kind in [LimitKind::Messages, LimitKind::Bandwidth] {
        assert!(kind.is_session_limit());
    }
    for kind in [
        LimitKind::Commands,
        LimitKind::Loops,
        LimitKind::Cpu,
        LimitKind::Memory,
        LimitKind::Workers,
    ] {
        assert!(!kind.is_session_limit());
    }
}

#[test]
fn test_io_error_converts_with_question_mark() {
    fn read() -> bgov_domain::Result<()> {
        Err(std::io::Error::other("disk gone"))?;
        Ok(())
    }
    let error = read().unwrap_err();
    assert!(matches!(error, Error::Io { .. }));
    assert_eq!(error.to_string(), "I/O error: disk gone");
}
