//! Error context helpers

use bgov_domain::Error;
use bgov_infrastructure::error_ext::ErrorContext;

fn failing_io() -> std::result::Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
}

#[test]
fn test_context_wraps_as_internal() {
    let err = failing_io().context("reading state").unwrap_err();
    assert!(matches!(err, Error::Internal { .. }));
    assert!(err.to_string().contains("reading state: missing"));
}

#[test]
fn test_with_context_is_lazy_on_success() {
    let ok: std::result::Result<u8, std::io::Error> = Ok(1);
    let value = ok
        .with_context(|| -> String { panic!("context built on success") })
        .unwrap();
    assert_eq!(value, 1);
}

#[test]
fn test_config_context_keeps_source() {
    let err = failing_io().config_context("parsing bgov.toml").unwrap_err();
    match err {
        Error::Configuration { message, source } => {
            assert!(message.starts_with("parsing bgov.toml"));
            assert!(source.is_some());
        }
        other => panic!("Expected Configuration error, got {other:?}"),
    }
}

#[test]
fn test_io_context_mentions_io() {
    let err = failing_io().io_context("writing config").unwrap_err();
    assert!(err.to_string().contains("I/O failure"));
}
