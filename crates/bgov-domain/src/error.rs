//! Error handling types
//!
//! Every governed operation reports failures through [`Error`]. The variants
//! follow the four classes the front end needs to tell apart: capacity
//! rejections, limit breaches (including deadline timeouts), lookups of
//! unknown users/sessions/executions, and plain infrastructure failures.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Which ceiling a limit-exceeded error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Interpreted statement ceiling
    Commands,
    /// Loop/jump statement ceiling
    Loops,
    /// Estimated CPU share
    Cpu,
    /// Estimated RAM allowance
    Memory,
    /// Messages per session window
    Messages,
    /// Bytes per session window
    Bandwidth,
    /// Concurrent workers per user
    Workers,
}

impl LimitKind {
    /// Returns true for ceilings enforced on a session rather than a run
    pub fn is_session_limit(self) -> bool {
        matches!(self, Self::Messages | Self::Bandwidth)
    }

    /// Short label used in messages and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Loops => "loops",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Messages => "messages",
            Self::Bandwidth => "bandwidth",
            Self::Workers => "workers",
        }
    }

    fn category(self) -> &'static str {
        if self.is_session_limit() {
            "session rate limit exceeded"
        } else {
            "execution limit exceeded"
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the governor
#[derive(Error, Debug)]
pub enum Error {
    /// A population or session ceiling is already reached
    #[error("capacity reached: {resource} (limit {limit})")]
    CapacityExceeded {
        /// What ran out of room (users, sessions for a user, sessions for an IP)
        resource: String,
        /// The configured ceiling
        limit: usize,
    },

    /// A per-user, per-run, or per-session ceiling was crossed
    #[error("{}: {kind} {current} > {limit}", .kind.category())]
    LimitExceeded {
        /// The ceiling that was crossed
        kind: LimitKind,
        /// Observed value
        current: f64,
        /// Allowed value
        limit: f64,
    },

    /// A program is already running for this user
    #[error("program already running for user {username}")]
    AlreadyRunning {
        /// Owner of the active run
        username: String,
    },

    /// The user already holds a record in the system tier
    #[error("user {username} is already registered")]
    AlreadyRegistered {
        /// The duplicate username
        username: String,
    },

    /// Operation on an unknown user, session, or execution
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// The execution deadline elapsed
    #[error("execution limit exceeded: {username} ran longer than {}s", .limit.as_secs())]
    Timeout {
        /// Owner of the timed-out run
        username: String,
        /// The configured maximum execution time
        limit: Duration,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal invariant failure (e.g. a poisoned lock)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Basic error creation methods
impl Error {
    /// Create a capacity error
    pub fn capacity<S: Into<String>>(resource: S, limit: usize) -> Self {
        Self::CapacityExceeded {
            resource: resource.into(),
            limit,
        }
    }

    /// Create a limit-exceeded error
    pub fn limit(kind: LimitKind, current: f64, limit: f64) -> Self {
        Self::LimitExceeded {
            kind,
            current,
            limit,
        }
    }

    /// Create an already-running error
    pub fn already_running<S: Into<String>>(username: S) -> Self {
        Self::AlreadyRunning {
            username: username.into(),
        }
    }

    /// Create an already-registered error
    pub fn already_registered<S: Into<String>>(username: S) -> Self {
        Self::AlreadyRegistered {
            username: username.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(username: S, limit: Duration) -> Self {
        Self::Timeout {
            username: username.into(),
            limit,
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Classification
impl Error {
    /// Population or session ceiling rejection
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// Limit breach or deadline timeout; the offending scope is already stopped
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. } | Self::Timeout { .. })
    }

    /// Unknown user, session, or execution (a caller bug)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The limit kind, if this is a limit breach
    pub fn limit_kind(&self) -> Option<LimitKind> {
        match self {
            Self::LimitExceeded { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::internal(format!("lock poisoned: {err}"))
    }
}
