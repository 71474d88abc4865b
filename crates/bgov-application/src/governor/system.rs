//! System tier
//!
//! Owns the registered-user map, splits the CPU and RAM pools evenly across
//! the current population, hands out worker permits, and runs the periodic
//! system monitor. This tier never evicts anything by itself; it only flags
//! idle users for the tiers above.

use super::{epoch_millis, log_caller_bug};
use bgov_domain::error::{Error, LimitKind, Result};
use bgov_domain::ports::{ProcessSample, SharedSampler};
use bgov_domain::value_objects::{ResourceLimits, SystemPolicy, SystemStats, UserSummary};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Mutable per-user record
///
/// Only this tier touches it; everything else goes through the manager.
struct UserResource {
    limits: ResourceLimits,
    estimated_cpu_percent: f64,
    estimated_memory_mb: u64,
    active_workers: Arc<AtomicUsize>,
    /// Milliseconds since the manager epoch
    last_activity_ms: AtomicU64,
    /// Cancelling it aborts every scope derived from this user
    token: CancellationToken,
}

impl UserResource {
    fn new(limits: ResourceLimits, now_ms: u64) -> Self {
        Self {
            limits,
            estimated_cpu_percent: 0.0,
            estimated_memory_mb: 0,
            active_workers: Arc::new(AtomicUsize::new(0)),
            last_activity_ms: AtomicU64::new(now_ms),
            token: CancellationToken::new(),
        }
    }

    fn idle_for(&self, now_ms: u64) -> Duration {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        Duration::from_millis(now_ms.saturating_sub(last))
    }
}

#[derive(Default)]
struct MonitorState {
    last_sample: Option<ProcessSample>,
    sampled_at: Option<DateTime<Utc>>,
    inactive: HashSet<String>,
}

/// Base tier of the governor
pub struct SystemResourceManager {
    policy: SystemPolicy,
    sampler: SharedSampler,
    total_memory_mb: u64,
    epoch: Instant,
    users: RwLock<HashMap<String, UserResource>>,
    monitor: RwLock<MonitorState>,
}

impl SystemResourceManager {
    /// Create the system tier; host RAM is read once from the sampler
    pub fn new(policy: SystemPolicy, sampler: SharedSampler) -> Self {
        let total_memory_mb = sampler.total_memory_mb();
        let pool = policy.available_memory_mb(total_memory_mb);
        let floor_total = policy.min_memory_mb * policy.max_concurrent_users as u64;
        if floor_total > pool {
            warn!(
                pool_mb = pool,
                floor_total_mb = floor_total,
                "RAM floor at full population exceeds the available pool"
            );
        }
        info!(
            total_memory_mb,
            available_memory_mb = pool,
            available_cpu_percent = policy.available_cpu_percent(),
            max_users = policy.max_concurrent_users,
            "System resource manager initialized"
        );

        Self {
            policy,
            sampler,
            total_memory_mb,
            epoch: Instant::now(),
            users: RwLock::new(HashMap::new()),
            monitor: RwLock::new(MonitorState::default()),
        }
    }

    /// Register a user and recompute every user's fair share
    pub fn register_user(&self, username: &str) -> Result<()> {
        let active = {
            let mut users = self.users.write()?;
            if users.contains_key(username) {
                return Err(Error::already_registered(username));
            }
            if users.len() >= self.policy.max_concurrent_users {
                return Err(Error::capacity(
                    "concurrent users",
                    self.policy.max_concurrent_users,
                ));
            }
            let placeholder = ResourceLimits::fair_share(&self.policy, self.total_memory_mb, 1);
            users.insert(
                username.to_string(),
                UserResource::new(placeholder, self.now_ms()),
            );
            self.recompute_limits(&mut users);
            users.len()
        };

        info!(username, active_users = active, "User registered");
        Ok(())
    }

    /// Cancel the user's scope, drop the record, and recompute the remaining shares
    pub fn unregister_user(&self, username: &str) -> Result<()> {
        let result = self.unregister_locked(username);
        if let Ok(active) = &result {
            info!(username, active_users = *active, "User unregistered");
        }
        log_caller_bug(result.map(|_| ()), "unregister_user", username)
    }

    fn unregister_locked(&self, username: &str) -> Result<usize> {
        let active = {
            let mut users = self.users.write()?;
            let user = users
                .remove(username)
                .ok_or_else(|| Error::not_found(format!("user {username}")))?;
            user.token.cancel();
            self.recompute_limits(&mut users);
            users.len()
        };
        self.monitor.write()?.inactive.remove(username);
        Ok(active)
    }

    /// Cancellation scope of a registered user
    pub fn user_context(&self, username: &str) -> Result<CancellationToken> {
        let result = self.with_user(username, |user| Ok(user.token.clone()));
        log_caller_bug(result, "user_context", username)
    }

    /// Current fair-share limits of a registered user
    pub fn user_limits(&self, username: &str) -> Result<ResourceLimits> {
        let result = self.with_user(username, |user| Ok(user.limits.clone()));
        log_caller_bug(result, "user_limits", username)
    }

    pub fn is_registered(&self, username: &str) -> bool {
        self.users
            .read()
            .map(|users| users.contains_key(username))
            .unwrap_or(false)
    }

    pub fn active_users(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    /// Refresh the user's last-activity timestamp
    pub fn touch(&self, username: &str) -> Result<()> {
        let now = self.now_ms();
        let result = self.with_user(username, |user| {
            user.last_activity_ms.store(now, Ordering::Relaxed);
            Ok(())
        });
        log_caller_bug(result, "touch", username)
    }

    /// Store a caller-reported usage estimate
    ///
    /// The next monitor cycle replaces it with its own attribution.
    pub fn record_usage(&self, username: &str, cpu_percent: f64, memory_mb: u64) -> Result<()> {
        let result = self.store_estimate(username, cpu_percent, memory_mb);
        log_caller_bug(result, "record_usage", username)
    }

    fn store_estimate(&self, username: &str, cpu_percent: f64, memory_mb: u64) -> Result<()> {
        let mut users = self.users.write()?;
        let user = users
            .get_mut(username)
            .ok_or_else(|| Error::not_found(format!("user {username}")))?;
        user.estimated_cpu_percent = cpu_percent;
        user.estimated_memory_mb = memory_mb;
        Ok(())
    }

    /// Compare the last estimates against the user's limits
    pub fn check_resource_usage(&self, username: &str) -> Result<()> {
        let result = self.with_user(username, |user| {
            if user.estimated_cpu_percent > user.limits.max_cpu_percent {
                return Err(Error::limit(
                    LimitKind::Cpu,
                    user.estimated_cpu_percent,
                    user.limits.max_cpu_percent,
                ));
            }
            if user.estimated_memory_mb > user.limits.max_memory_mb {
                return Err(Error::limit(
                    LimitKind::Memory,
                    user.estimated_memory_mb as f64,
                    user.limits.max_memory_mb as f64,
                ));
            }
            Ok(())
        });
        if let Err(err) = &result {
            if err.is_limit_exceeded() {
                warn!(username, error = %err, "Resource usage over limit");
            }
        }
        log_caller_bug(result, "check_resource_usage", username)
    }

    /// Take one of the user's worker slots
    pub fn acquire_worker(&self, username: &str) -> Result<WorkerPermit> {
        let now = self.now_ms();
        let result = self.with_user(username, |user| {
            let max = user.limits.max_workers;
            user.active_workers
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < max).then_some(n + 1)
                })
                .map_err(|n| Error::limit(LimitKind::Workers, (n + 1) as f64, max as f64))?;
            user.last_activity_ms.store(now, Ordering::Relaxed);
            Ok(WorkerPermit {
                username: username.to_string(),
                counter: Arc::clone(&user.active_workers),
                token: user.token.child_token(),
            })
        });
        log_caller_bug(result, "acquire_worker", username)
    }

    /// Users flagged idle by the last monitor cycle
    pub fn inactive_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .monitor
            .read()
            .map(|state| state.inactive.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    /// Non-reserved RAM pool in MB
    pub fn available_memory_mb(&self) -> u64 {
        self.policy.available_memory_mb(self.total_memory_mb)
    }

    pub fn policy(&self) -> &SystemPolicy {
        &self.policy
    }

    pub(crate) fn sampler(&self) -> &SharedSampler {
        &self.sampler
    }

    /// Snapshot of population, memory, and per-user allowances
    ///
    /// `active_executions` is left at zero here; the execution tier fills it in.
    pub fn system_stats(&self) -> Result<SystemStats> {
        let now = self.now_ms();
        let (mut summaries, workers) = {
            let users = self.users.read()?;
            let summaries: Vec<UserSummary> = users
                .iter()
                .map(|(name, user)| UserSummary {
                    username: name.clone(),
                    max_cpu_percent: user.limits.max_cpu_percent,
                    max_memory_mb: user.limits.max_memory_mb,
                    estimated_cpu_percent: user.estimated_cpu_percent,
                    estimated_memory_mb: user.estimated_memory_mb,
                    active_workers: user.active_workers.load(Ordering::Relaxed),
                    idle_secs: user.idle_for(now).as_secs(),
                })
                .collect();
            let workers = summaries.iter().map(|u| u.active_workers).sum();
            (summaries, workers)
        };
        summaries.sort_by(|a, b| a.username.cmp(&b.username));

        let (process_memory_mb, sampled_at) = {
            let state = self.monitor.read()?;
            (
                state.last_sample.map_or(0, |s| s.process_memory_mb),
                state.sampled_at,
            )
        };

        Ok(SystemStats {
            active_users: summaries.len(),
            max_concurrent_users: self.policy.max_concurrent_users,
            process_memory_mb,
            total_memory_mb: self.total_memory_mb,
            available_memory_mb: self.available_memory_mb(),
            available_cpu_percent: self.policy.available_cpu_percent(),
            active_workers: workers,
            active_executions: 0,
            inactive_users: self.inactive_users(),
            users: summaries,
            sampled_at,
        })
    }

    /// One monitor pass: sample the process, attribute usage evenly across
    /// users, and flag users idle beyond `max_inactive_time`
    pub fn run_monitor_cycle(&self) -> Result<ProcessSample> {
        let sample = self.sampler.sample()?;
        let now = self.now_ms();
        let max_idle = self.policy.max_inactive_time;

        let (population, workers, inactive) = {
            let mut users = self.users.write()?;
            let population = users.len();
            let share = population.max(1);
            let mut inactive = HashSet::new();
            let mut workers = 0;
            for (name, user) in users.iter_mut() {
                user.estimated_cpu_percent = sample.process_cpu_percent / share as f64;
                user.estimated_memory_mb = sample.process_memory_mb / share as u64;
                workers += user.active_workers.load(Ordering::Relaxed);
                if user.idle_for(now) > max_idle {
                    inactive.insert(name.clone());
                }
            }
            (population, workers, inactive)
        };

        let newly_flagged: Vec<String> = {
            let mut state = self.monitor.write()?;
            let fresh = inactive.difference(&state.inactive).cloned().collect();
            state.inactive = inactive;
            state.last_sample = Some(sample);
            state.sampled_at = Some(Utc::now());
            fresh
        };

        for username in &newly_flagged {
            info!(
                username = %username,
                max_inactive_secs = max_idle.as_secs(),
                "User flagged as inactive"
            );
        }
        debug!(
            active_users = population,
            worker_permits = workers,
            worker_tasks = sample.worker_tasks,
            process_memory_mb = sample.process_memory_mb,
            process_cpu_percent = sample.process_cpu_percent,
            "System monitor sample"
        );
        Ok(sample)
    }

    /// Periodic system monitor; runs until `shutdown` is cancelled
    pub async fn run_monitor(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.policy.monitor_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs(), "System monitor started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.run_monitor_cycle() {
                        warn!(error = %err, "System monitor cycle failed");
                    }
                }
            }
        }
        info!("System monitor stopped");
    }

    fn with_user<T>(&self, username: &str, f: impl FnOnce(&UserResource) -> Result<T>) -> Result<T> {
        let users = self.users.read()?;
        let user = users
            .get(username)
            .ok_or_else(|| Error::not_found(format!("user {username}")))?;
        f(user)
    }

    // Caller holds the write lock, so the population count is current.
    fn recompute_limits(&self, users: &mut HashMap<String, UserResource>) {
        let limits = ResourceLimits::fair_share(&self.policy, self.total_memory_mb, users.len());
        for user in users.values_mut() {
            user.limits = limits.clone();
        }
    }

    fn now_ms(&self) -> u64 {
        epoch_millis(self.epoch)
    }
}

/// Held while a user's worker is alive; releases the slot on drop
#[derive(Debug)]
pub struct WorkerPermit {
    username: String,
    counter: Arc<AtomicUsize>,
    token: CancellationToken,
}

impl WorkerPermit {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Child of the user's scope; cancelled when the user is unregistered
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
