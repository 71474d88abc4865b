//! Execution tier
//!
//! Tracks at most one interpreted run per user. The interpreter polls
//! [`ExecutionGovernor::check_basic_execution`] once per statement; that call
//! is the only enforcement point, so it takes a read lock, bumps two atomic
//! counters, and returns.
//!
//! The step ceilings are absolute safety caps. The fair-share CPU/RAM numbers
//! from the system tier are estimates and are not enforced here.

use super::log_caller_bug;
use super::system::{SystemResourceManager, WorkerPermit};
use bgov_domain::error::{Error, LimitKind, Result};
use bgov_domain::value_objects::{
    ExecutionPolicy, ExecutionStats, ResourceLimits, RunningExecution, StatementKind, SystemStats,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop from the interpreter or session tier
    Requested,
    /// Deadline elapsed
    Timeout,
    /// Statement ceiling crossed
    CommandLimit,
    /// Loop/jump ceiling crossed
    LoopLimit,
    /// Evicted by the memory guard
    MemoryPressure,
    /// Owning user was unregistered
    UserUnregistered,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Timeout => "timeout",
            Self::CommandLimit => "command limit",
            Self::LoopLimit => "loop limit",
            Self::MemoryPressure => "memory pressure",
            Self::UserUnregistered => "user unregistered",
        }
    }

    fn is_forced(self) -> bool {
        !matches!(self, Self::Requested | Self::UserUnregistered)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct BasicExecution {
    program: String,
    started_at: Instant,
    started_wall: DateTime<Utc>,
    deadline: Instant,
    max_execution_time: Duration,
    command_count: AtomicU64,
    loop_count: AtomicU64,
    token: CancellationToken,
}

/// Caller-side view of an active run
///
/// The token is a child of the user's scope. It is cancelled when the run
/// is stopped, when its deadline passes, or when the user is unregistered.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    username: String,
    program: String,
    started_at: Instant,
    deadline: Instant,
    token: CancellationToken,
}

impl ExecutionHandle {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline (zero once elapsed)
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Middle tier of the governor
pub struct ExecutionGovernor {
    system: Arc<SystemResourceManager>,
    policy: ExecutionPolicy,
    executions: RwLock<HashMap<String, Arc<BasicExecution>>>,
}

impl ExecutionGovernor {
    pub fn new(system: Arc<SystemResourceManager>, policy: ExecutionPolicy) -> Self {
        Self {
            system,
            policy,
            executions: RwLock::new(HashMap::new()),
        }
    }

    /// The system tier this governor wraps
    pub fn system(&self) -> &Arc<SystemResourceManager> {
        &self.system
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    pub fn register_user(&self, username: &str) -> Result<()> {
        self.system.register_user(username)
    }

    /// Stop the user's run (if any), then unregister from the system tier
    pub fn unregister_user(&self, username: &str) -> Result<()> {
        self.stop_with(username, StopReason::UserUnregistered)?;
        self.system.unregister_user(username)
    }

    pub fn user_limits(&self, username: &str) -> Result<ResourceLimits> {
        self.system.user_limits(username)
    }

    pub fn check_resource_usage(&self, username: &str) -> Result<()> {
        self.system.check_resource_usage(username)
    }

    pub fn acquire_worker(&self, username: &str) -> Result<WorkerPermit> {
        self.system.acquire_worker(username)
    }

    /// Begin a run for a registered user
    ///
    /// Fails if the user already has a run; the existing run is left alone.
    /// Inside a tokio runtime the run's token is cancelled at the deadline
    /// even if no further check arrives.
    pub fn start_basic_execution(self: &Arc<Self>, username: &str, program: &str) -> Result<ExecutionHandle> {
        let limits = self.system.user_limits(username)?;
        let user_token = self.system.user_context(username)?;
        self.system.touch(username)?;

        let started_at = Instant::now();
        let deadline = started_at + limits.max_execution_time;
        let execution = Arc::new(BasicExecution {
            program: program.to_string(),
            started_at,
            started_wall: Utc::now(),
            deadline,
            max_execution_time: limits.max_execution_time,
            command_count: AtomicU64::new(0),
            loop_count: AtomicU64::new(0),
            token: user_token.child_token(),
        });

        {
            let mut executions = self.executions.write()?;
            if executions.contains_key(username) {
                drop(executions);
                warn!(username, program, "Program already running");
                return Err(Error::already_running(username));
            }
            executions.insert(username.to_string(), Arc::clone(&execution));
        }

        // The user may have been unregistered between the lookup and the insert.
        if execution.token.is_cancelled() {
            self.take(username, Some(&execution))?;
            return Err(Error::not_found(format!("user {username}")));
        }

        info!(
            username,
            program,
            max_execution_secs = limits.max_execution_time.as_secs(),
            "Program started"
        );
        self.watch_deadline(username, &execution);
        Ok(ExecutionHandle {
            username: username.to_string(),
            program: program.to_string(),
            started_at,
            deadline,
            token: execution.token.clone(),
        })
    }

    /// Cancel and remove the user's run
    pub fn stop_basic_execution(&self, username: &str) -> Result<()> {
        let result = self.take(username, None).and_then(|taken| {
            taken.ok_or_else(|| Error::not_found(format!("execution for user {username}")))
        });
        match result {
            Ok(execution) => {
                self.report_stop(username, &execution, StopReason::Requested);
                Ok(())
            }
            Err(err) => log_caller_bug(Err(err), "stop_basic_execution", username),
        }
    }

    /// Stop the user's run if there is one; returns whether a run was stopped
    pub fn stop_if_running(&self, username: &str) -> Result<bool> {
        self.stop_with(username, StopReason::Requested)
    }

    fn stop_with(&self, username: &str, reason: StopReason) -> Result<bool> {
        let Some(execution) = self.take(username, None)? else {
            return Ok(false);
        };
        self.report_stop(username, &execution, reason);
        Ok(true)
    }

    /// Per-statement check, called by the interpreter before each statement
    ///
    /// A failing check has already stopped the run.
    pub fn check_basic_execution(&self, username: &str, kind: StatementKind) -> Result<()> {
        let execution = {
            let executions = self.executions.read()?;
            executions.get(username).cloned()
        };
        let Some(execution) = execution else {
            return log_caller_bug(
                Err(Error::not_found(format!("execution for user {username}"))),
                "check_basic_execution",
                username,
            );
        };

        if execution.token.is_cancelled() {
            self.finish(username, &execution, StopReason::UserUnregistered)?;
            return Err(Error::not_found(format!("execution for user {username}")));
        }

        if Instant::now() >= execution.deadline {
            self.finish(username, &execution, StopReason::Timeout)?;
            return Err(Error::timeout(username, execution.max_execution_time));
        }

        let commands = execution.command_count.fetch_add(1, Ordering::Relaxed) + 1;
        if commands > self.policy.max_commands {
            self.finish(username, &execution, StopReason::CommandLimit)?;
            return Err(Error::limit(
                LimitKind::Commands,
                commands as f64,
                self.policy.max_commands as f64,
            ));
        }

        if kind.is_loop_or_jump() {
            let loops = execution.loop_count.fetch_add(1, Ordering::Relaxed) + 1;
            if loops > self.policy.max_loop_count {
                self.finish(username, &execution, StopReason::LoopLimit)?;
                return Err(Error::limit(
                    LimitKind::Loops,
                    loops as f64,
                    self.policy.max_loop_count as f64,
                ));
            }
        }

        self.system.touch(username)
    }

    /// Statistics of the user's run, or `NotRunning`
    pub fn execution_stats(&self, username: &str) -> Result<ExecutionStats> {
        let execution = {
            let executions = self.executions.read()?;
            executions.get(username).cloned()
        };
        let Some(execution) = execution else {
            return Ok(ExecutionStats::NotRunning {
                username: username.to_string(),
            });
        };

        let now = Instant::now();
        Ok(ExecutionStats::Running(RunningExecution {
            username: username.to_string(),
            program: execution.program.clone(),
            started_at: execution.started_wall,
            elapsed_ms: millis(now.saturating_duration_since(execution.started_at)),
            remaining_ms: millis(execution.deadline.saturating_duration_since(now)),
            command_count: execution.command_count.load(Ordering::Relaxed),
            loop_count: execution.loop_count.load(Ordering::Relaxed),
            max_commands: self.policy.max_commands,
            max_loop_count: self.policy.max_loop_count,
        }))
    }

    pub fn is_running(&self, username: &str) -> bool {
        self.executions
            .read()
            .map(|executions| executions.contains_key(username))
            .unwrap_or(false)
    }

    pub fn active_executions(&self) -> usize {
        self.executions.read().map(|e| e.len()).unwrap_or(0)
    }

    /// System snapshot including the active run count
    pub fn system_stats(&self) -> Result<SystemStats> {
        let mut stats = self.system.system_stats()?;
        stats.active_executions = self.active_executions();
        Ok(stats)
    }

    /// One memory guard pass
    ///
    /// When sampled process memory exceeds the non-reserved RAM pool, the
    /// single oldest-started run is evicted. Returns the evicted user.
    pub fn run_memory_guard_cycle(&self) -> Result<Option<String>> {
        let sample = self.system.sampler().sample()?;
        let budget = self.system.available_memory_mb();
        if sample.process_memory_mb <= budget {
            return Ok(None);
        }

        let oldest = {
            let executions = self.executions.read()?;
            executions
                .iter()
                .min_by_key(|(_, execution)| execution.started_at)
                .map(|(username, execution)| (username.clone(), Arc::clone(execution)))
        };
        let Some((username, execution)) = oldest else {
            debug!(
                process_memory_mb = sample.process_memory_mb,
                budget_mb = budget,
                "Memory over budget with no running programs"
            );
            return Ok(None);
        };

        warn!(
            username = %username,
            program = %execution.program,
            process_memory_mb = sample.process_memory_mb,
            budget_mb = budget,
            "Memory over budget, evicting oldest program"
        );
        self.finish(&username, &execution, StopReason::MemoryPressure)?;
        Ok(Some(username))
    }

    /// Periodic memory guard; runs until `shutdown` is cancelled
    pub async fn run_memory_guard(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.policy.memory_guard_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "Memory guard started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.run_memory_guard_cycle() {
                        warn!(error = %err, "Memory guard cycle failed");
                    }
                }
            }
        }
        info!("Memory guard stopped");
    }

    /// Stop the run at its deadline, or return once its token is cancelled
    fn watch_deadline(self: &Arc<Self>, username: &str, execution: &Arc<BasicExecution>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(username, "No runtime, deadline enforced on check only");
            return;
        };
        let governor = Arc::downgrade(self);
        let execution = Arc::clone(execution);
        let username = username.to_string();
        runtime.spawn(async move {
            tokio::select! {
                () = execution.token.cancelled() => {}
                () = tokio::time::sleep_until(execution.deadline) => {
                    let Some(governor) = governor.upgrade() else {
                        return;
                    };
                    if let Err(err) = governor.finish(&username, &execution, StopReason::Timeout) {
                        warn!(username = %username, error = %err, "Deadline stop failed");
                    }
                }
            }
        });
    }

    /// Remove `execution` if it is still the user's current run, then report
    fn finish(&self, username: &str, execution: &Arc<BasicExecution>, reason: StopReason) -> Result<()> {
        if self.take(username, Some(execution))?.is_some() {
            self.report_stop(username, execution, reason);
        }
        Ok(())
    }

    /// Remove the user's run; with `expected`, only if it is that same run
    fn take(
        &self,
        username: &str,
        expected: Option<&Arc<BasicExecution>>,
    ) -> Result<Option<Arc<BasicExecution>>> {
        let mut executions = self.executions.write()?;
        let matches = match (executions.get(username), expected) {
            (Some(current), Some(expected)) => Arc::ptr_eq(current, expected),
            (Some(_), None) => true,
            (None, _) => false,
        };
        Ok(if matches {
            executions.remove(username)
        } else {
            None
        })
    }

    fn report_stop(&self, username: &str, execution: &BasicExecution, reason: StopReason) {
        execution.token.cancel();
        let elapsed_ms = millis(execution.started_at.elapsed());
        let commands = execution.command_count.load(Ordering::Relaxed);
        let loops = execution.loop_count.load(Ordering::Relaxed);
        if reason.is_forced() {
            warn!(
                username,
                program = %execution.program,
                reason = %reason,
                elapsed_ms,
                commands,
                loops,
                "Program force-stopped"
            );
        } else {
            info!(
                username,
                program = %execution.program,
                reason = %reason,
                elapsed_ms,
                commands,
                loops,
                "Program stopped"
            );
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
