//! Background task lifecycle
//!
//! The governor's monitor, memory guard and idle sweep run under one
//! [`ShutdownCoordinator`]: a root `CancellationToken` that every task
//! watches, and a `TaskTracker` the daemon drains on exit.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Child token, cancelled together with the coordinator
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Number of tracked tasks still alive
    pub fn active_tasks(&self) -> usize {
        self.task_tracker.len()
    }

    /// Spawn and track a background task
    pub fn spawn<F>(&self, name: &'static str, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        debug!(task = name, "Spawning tracked task");
        self.task_tracker.spawn(future)
    }

    /// Spawn a task that receives its own child token
    pub fn spawn_cancellable<F, Fut>(&self, name: &'static str, task_fn: F) -> JoinHandle<Fut::Output>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let token = self.child_token();
        self.spawn(name, task_fn(token))
    }

    /// Cancel every task and wait for them to finish
    ///
    /// Returns `true` if all tasks completed before `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        info!(
            timeout_secs = timeout.as_secs(),
            active_tasks = self.task_tracker.len(),
            "Initiating graceful shutdown"
        );
        self.cancel_token.cancel();
        self.task_tracker.close();

        tokio::select! {
            () = self.task_tracker.wait() => {
                info!("All background tasks completed");
                true
            }
            () = tokio::time::sleep(timeout) => {
                warn!(active_tasks = self.task_tracker.len(), "Shutdown timeout reached");
                false
            }
        }
    }
}
