//! Session tier
//!
//! Tracks transport sessions on top of the execution tier. A user may hold
//! several sessions; the user is registered with the system tier by the first
//! one and unregistered when the last one goes away. Message and bandwidth
//! ceilings are counted per session in one-minute windows aligned to the
//! session's creation time.
//!
//! Exceeding a rate ceiling is reported, never enforced by dropping the
//! session; the transport decides what to do with the connection.

use super::execution::{ExecutionGovernor, ExecutionHandle};
use super::log_caller_bug;
use bgov_domain::error::{Error, LimitKind, Result};
use bgov_domain::value_objects::{
    ExecutionStats, SessionPolicy, SessionStats, SessionSummary, StatementKind, SystemStats,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct SessionResource {
    username: String,
    ip_address: String,
    window_start: Instant,
    message_count: u64,
    bandwidth_used: u64,
    total_messages: u64,
    total_bytes: u64,
    connection_count: u32,
    last_activity: Instant,
}

impl SessionResource {
    fn new(username: &str, ip_address: &str, now: Instant) -> Self {
        Self {
            username: username.to_string(),
            ip_address: ip_address.to_string(),
            window_start: now,
            message_count: 0,
            bandwidth_used: 0,
            total_messages: 0,
            total_bytes: 0,
            connection_count: 1,
            last_activity: now,
        }
    }

    /// Advance `window_start` by whole windows and zero the counters once a
    /// boundary has been crossed
    fn roll_window(&mut self, now: Instant, window: Duration) {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < window {
            return;
        }
        let windows = elapsed.as_nanos() / window.as_nanos().max(1);
        let advance = u32::try_from(windows).unwrap_or(u32::MAX);
        self.window_start += window * advance;
        self.message_count = 0;
        self.bandwidth_used = 0;
    }
}

/// Top tier of the governor
pub struct SessionGovernor {
    execution: Arc<ExecutionGovernor>,
    policy: SessionPolicy,
    sessions: RwLock<HashMap<String, SessionResource>>,
}

impl SessionGovernor {
    pub fn new(execution: Arc<ExecutionGovernor>, policy: SessionPolicy) -> Self {
        Self {
            execution,
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The execution tier this governor wraps
    pub fn execution(&self) -> &Arc<ExecutionGovernor> {
        &self.execution
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Register a transport session
    ///
    /// Re-registering a known session id only refreshes it and counts a
    /// reconnect. A new session is rejected when the user or the IP already
    /// holds its maximum.
    pub fn register_session(&self, session_id: &str, username: &str, ip_address: &str) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.write()?;

        if let Some(existing) = sessions.get_mut(session_id) {
            existing.last_activity = now;
            existing.connection_count = existing.connection_count.saturating_add(1);
            let connections = existing.connection_count;
            drop(sessions);
            debug!(session_id, username, connections, "Session re-registered");
            return Ok(());
        }

        let per_user = sessions.values().filter(|s| s.username == username).count();
        if per_user >= self.policy.max_sessions_per_user {
            drop(sessions);
            warn!(session_id, username, per_user, "Session rejected: per-user cap reached");
            return Err(Error::capacity(
                format!("sessions for user {username}"),
                self.policy.max_sessions_per_user,
            ));
        }
        let per_ip = sessions.values().filter(|s| s.ip_address == ip_address).count();
        if per_ip >= self.policy.max_sessions_per_ip {
            drop(sessions);
            warn!(session_id, ip_address, per_ip, "Session rejected: per-IP cap reached");
            return Err(Error::capacity(
                format!("sessions for ip {ip_address}"),
                self.policy.max_sessions_per_ip,
            ));
        }

        // Registration happens under the session lock so a concurrent
        // last-session unregister cannot interleave with it.
        let first_session = match self.execution.register_user(username) {
            Ok(()) => true,
            Err(Error::AlreadyRegistered { .. }) => false,
            Err(err) => {
                drop(sessions);
                warn!(session_id, username, error = %err, "Session rejected: user registration failed");
                return Err(err);
            }
        };
        sessions.insert(
            session_id.to_string(),
            SessionResource::new(username, ip_address, now),
        );
        let active = sessions.len();
        drop(sessions);

        if !first_session {
            debug!(username, "User already registered by another session");
        }
        info!(session_id, username, ip_address, active_sessions = active, "Session registered");
        Ok(())
    }

    /// Remove a session, stopping the owner's run; the owner is unregistered
    /// from the lower tiers only when this was their last session
    pub fn unregister_session(&self, session_id: &str) -> Result<()> {
        let result = self.unregister_locked(session_id);
        log_caller_bug(result, "unregister_session", session_id)
    }

    fn unregister_locked(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write()?;
        let session = sessions
            .remove(session_id)
            .ok_or_else(|| Error::not_found(format!("session {session_id}")))?;
        let username = session.username;

        let stopped = self.execution.stop_if_running(&username)?;

        let last_session = !sessions.values().any(|s| s.username == username);
        let unregistered = if last_session {
            self.execution.unregister_user(&username)
        } else {
            Ok(())
        };
        drop(sessions);

        info!(session_id, username = %username, stopped_program = stopped, last_session, "Session unregistered");
        unregistered
    }

    /// Per-message check, called before the transport processes input
    ///
    /// Counters reset on window boundaries measured from session creation.
    /// A message that would exceed either ceiling is rejected and not counted.
    pub fn check_session_limits(&self, session_id: &str, message_size_bytes: u64) -> Result<()> {
        let result = self.check_locked(session_id, message_size_bytes);
        match &result {
            Ok(username) => {
                if let Err(err) = self.execution.system().touch(username) {
                    debug!(session_id, error = %err, "Session owner missing from system tier");
                }
            }
            Err(err) if err.is_limit_exceeded() => {
                warn!(session_id, error = %err, "Session rate limit exceeded");
            }
            Err(_) => {}
        }
        log_caller_bug(result.map(|_| ()), "check_session_limits", session_id)
    }

    fn check_locked(&self, session_id: &str, message_size_bytes: u64) -> Result<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.write()?;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::not_found(format!("session {session_id}")))?;

        session.roll_window(now, self.policy.window);
        session.last_activity = now;

        let messages = session.message_count + 1;
        if messages > self.policy.rate_limit_messages {
            return Err(Error::limit(
                LimitKind::Messages,
                messages as f64,
                self.policy.rate_limit_messages as f64,
            ));
        }
        let bytes = session.bandwidth_used.saturating_add(message_size_bytes);
        if bytes > self.policy.rate_limit_bandwidth {
            return Err(Error::limit(
                LimitKind::Bandwidth,
                bytes as f64,
                self.policy.rate_limit_bandwidth as f64,
            ));
        }

        session.message_count = messages;
        session.bandwidth_used = bytes;
        session.total_messages += 1;
        session.total_bytes = session.total_bytes.saturating_add(message_size_bytes);
        Ok(session.username.clone())
    }

    /// Forwarded to the execution tier
    pub fn start_basic_execution(&self, username: &str, program: &str) -> Result<ExecutionHandle> {
        self.execution.start_basic_execution(username, program)
    }

    pub fn check_basic_execution(&self, username: &str, kind: StatementKind) -> Result<()> {
        self.execution.check_basic_execution(username, kind)
    }

    pub fn stop_basic_execution(&self, username: &str) -> Result<()> {
        self.execution.stop_basic_execution(username)
    }

    pub fn execution_stats(&self, username: &str) -> Result<ExecutionStats> {
        self.execution.execution_stats(username)
    }

    pub fn system_stats(&self) -> Result<SystemStats> {
        self.execution.system_stats()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(session_id))
            .unwrap_or(false)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Snapshot of every session and the configured ceilings
    pub fn session_stats(&self) -> Result<SessionStats> {
        let now = Instant::now();
        let sessions = self.sessions.read()?;
        let users: HashSet<&str> = sessions.values().map(|s| s.username.as_str()).collect();
        let ips: HashSet<&str> = sessions.values().map(|s| s.ip_address.as_str()).collect();
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, s)| SessionSummary {
                session_id: id.clone(),
                username: s.username.clone(),
                ip_address: s.ip_address.clone(),
                messages_in_window: s.message_count,
                bytes_in_window: s.bandwidth_used,
                total_messages: s.total_messages,
                total_bytes: s.total_bytes,
                connection_count: s.connection_count,
                idle_secs: now.saturating_duration_since(s.last_activity).as_secs(),
            })
            .collect();
        let stats_users = users.len();
        let stats_ips = ips.len();
        drop(sessions);
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        Ok(SessionStats {
            active_sessions: summaries.len(),
            unique_users: stats_users,
            unique_ips: stats_ips,
            max_sessions_per_user: self.policy.max_sessions_per_user,
            max_sessions_per_ip: self.policy.max_sessions_per_ip,
            rate_limit_messages: self.policy.rate_limit_messages,
            rate_limit_bandwidth: self.policy.rate_limit_bandwidth,
            sessions: summaries,
        })
    }

    /// One idle sweep: unregister every session inactive for longer than
    /// the idle timeout. Returns the removed session ids.
    pub fn sweep_idle_sessions(&self) -> Result<Vec<String>> {
        let now = Instant::now();
        let idle: Vec<String> = {
            let sessions = self.sessions.read()?;
            sessions
                .iter()
                .filter(|(_, s)| now.saturating_duration_since(s.last_activity) > self.policy.idle_timeout)
                .map(|(id, _)| id.clone())
                .collect()
        };

        let mut removed = Vec::with_capacity(idle.len());
        for session_id in idle {
            match self.unregister_locked(&session_id) {
                Ok(()) => removed.push(session_id),
                // Unregistered concurrently since the scan.
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    warn!(session_id = %session_id, error = %err, "Idle sweep failed to remove session");
                }
            }
        }
        if !removed.is_empty() {
            info!(
                removed = removed.len(),
                idle_timeout_secs = self.policy.idle_timeout.as_secs(),
                "Idle sessions swept"
            );
        }
        Ok(removed)
    }

    /// Periodic idle sweep; runs until `shutdown` is cancelled
    pub async fn run_idle_sweep(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.policy.sweep_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "Idle sweep started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep_idle_sessions() {
                        warn!(error = %err, "Idle sweep cycle failed");
                    }
                }
            }
        }
        info!("Idle sweep stopped");
    }
}
