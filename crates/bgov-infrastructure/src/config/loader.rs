//! Configuration loader
//!
//! Handles loading configuration from various sources including
//! TOML files, environment variables, and default values.

use crate::config::types::{AppConfig, ExecutionConfig, LoggingConfig, SecurityConfig, SystemConfig};
use crate::constants::*;
use crate::error_ext::ErrorContext;
use crate::logging::log_config_loaded;
use bgov_domain::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Configuration sources are merged in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if exists)
    /// 3. Environment variables with prefix (e.g., `BGOV__SECURITY__MAX_SESSIONS_PER_IP`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            } else {
                log_config_loaded(config_path, false);
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        // Double underscore separates nested keys, so single underscores stay in field names
        figment = figment.merge(Env::prefixed(&format!("{}__", self.env_prefix)).split("__"));

        let app_config: AppConfig = figment
            .extract()
            .map_err(|err| Error::Configuration {
                message: format!("Failed to extract configuration: {err}"),
                source: Some(Box::new(err)),
            })?;

        validate_app_config(&app_config)?;

        Ok(app_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), toml_string).io_context("Failed to write config file")?;

        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Find default configuration file paths to try
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = vec![
            current_dir.join(DEFAULT_CONFIG_FILENAME),
            current_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME),
            dirs::config_dir()
                .map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME))
                .unwrap_or_default(),
        ];

        candidates.into_iter().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
///
/// Performs validation of all configuration sections.
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_system_config(&config.system)?;
    validate_security_config(&config.security)?;
    validate_execution_config(&config.execution)?;
    crate::logging::parse_log_level(&config.logging.level)?;
    Ok(())
}

fn validate_system_config(system: &SystemConfig) -> Result<()> {
    if system.max_concurrent_users == 0 {
        return Err(Error::config("max_concurrent_users cannot be 0"));
    }
    if !(0.0..100.0).contains(&system.system_reserved_cpu) {
        return Err(Error::config(format!(
            "system_reserved_cpu must be within [0, 100), got {}",
            system.system_reserved_cpu
        )));
    }
    if system.min_cpu_percent <= 0.0 || system.min_memory_mb == 0 {
        return Err(Error::config("fair-share floors must be positive"));
    }
    // The CPU floor must never push the sum of shares past the pool.
    let available = 100.0 - system.system_reserved_cpu;
    let floor_total = system.max_concurrent_users as f64 * system.min_cpu_percent;
    if floor_total > available {
        return Err(Error::config(format!(
            "max_concurrent_users x min_cpu_percent ({floor_total}) exceeds available CPU ({available})"
        )));
    }
    if system.resource_monitor_interval_secs == 0 || system.memory_guard_interval_secs == 0 {
        return Err(Error::config("Monitor intervals cannot be 0"));
    }
    if system.max_inactive_time_secs == 0 {
        return Err(Error::config("max_inactive_time_secs cannot be 0"));
    }
    Ok(())
}

fn validate_security_config(security: &SecurityConfig) -> Result<()> {
    if security.max_sessions_per_user == 0 || security.max_sessions_per_ip == 0 {
        return Err(Error::config("Session caps cannot be 0"));
    }
    if security.rate_limit_messages == 0 || security.rate_limit_bandwidth == 0 {
        return Err(Error::config("Rate limits cannot be 0"));
    }
    if security.session_sweep_interval_secs == 0 || security.session_idle_timeout_secs == 0 {
        return Err(Error::config("Idle sweep settings cannot be 0"));
    }
    Ok(())
}

fn validate_execution_config(execution: &ExecutionConfig) -> Result<()> {
    if execution.max_goroutines == 0 {
        return Err(Error::config("max_goroutines cannot be 0"));
    }
    if execution.max_execution_time_secs == 0 {
        return Err(Error::config("max_execution_time_secs cannot be 0"));
    }
    if execution.max_commands == 0 || execution.max_loop_count == 0 {
        return Err(Error::config("Step ceilings cannot be 0"));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Set system configuration
    pub fn with_system(mut self, system: SystemConfig) -> Self {
        self.config.system = system;
        self
    }

    /// Set security configuration
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    /// Set execution configuration
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.config.execution = execution;
        self
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<AppConfig> {
        validate_app_config(&self.config)?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
