//! Environment overrides
//!
//! These tests modify environment variables and must run sequentially:
//!
//! ```bash
//! cargo test -p bgov-infrastructure --test unit config_env -- --test-threads=1 --ignored
//! ```

use bgov_infrastructure::config::ConfigLoader;
use std::env;
use tempfile::TempDir;

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::set_var(key, value);
    }
}

fn remove_env(key: &str) {
    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::remove_var(key);
    }
}

#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bgov.toml");
    std::fs::write(&path, "[security]\nmax_sessions_per_ip = 8\n").unwrap();
    set_env("BGOVTEST__SECURITY__MAX_SESSIONS_PER_IP", "2");
    set_env("BGOVTEST__LOGGING__JSON_FORMAT", "true");

    let config = ConfigLoader::new()
        .with_config_path(&path)
        .with_env_prefix("BGOVTEST")
        .load()
        .unwrap();

    assert_eq!(config.security.max_sessions_per_ip, 2);
    assert!(config.logging.json_format);

    remove_env("BGOVTEST__SECURITY__MAX_SESSIONS_PER_IP");
    remove_env("BGOVTEST__LOGGING__JSON_FORMAT");
}

#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_single_underscore_prefix_ignored() {
    let dir = TempDir::new().unwrap();
    set_env("BGOVTEST_SECURITY__MAX_SESSIONS_PER_IP", "1");

    let config = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .with_env_prefix("BGOVTEST")
        .load()
        .unwrap();
    assert_eq!(config.security.max_sessions_per_ip, 5);

    remove_env("BGOVTEST_SECURITY__MAX_SESSIONS_PER_IP");
}
