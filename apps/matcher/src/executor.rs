//! Parallel Task Executor — runs a batch of independent tasks with bounded
//! parallelism and collects the ones that produced a value.
//!
//! A task is any `Future<Output = Result<Option<T>, E>>`. Per task:
//! - `Ok(Some(v))` → `v` is collected
//! - `Ok(None)`    → skipped
//! - `Err(e)`      → skipped, logged
//! - panic         → contained by the runtime, skipped, logged
//! - deadline hit  → skipped, logged (only when a task timeout is configured)
//!
//! Results come back in completion order, not submission order.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Progress sink invoked as `(completed, total)` after every task completion.
/// Should return quickly; the executor calls it inline.
pub type ProgressCallback = dyn Fn(usize, usize) + Send + Sync;

pub const DEFAULT_MAX_WORKERS: usize = 5;

/// How one spawned task ended, with the error already rendered for logging.
enum Completion<T> {
    Value(T),
    Empty,
    Failed(String),
    TimedOut(Duration),
}

#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    max_workers: usize,
    task_timeout: Option<Duration>,
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl ParallelExecutor {
    /// `max_workers` is clamped to at least 1.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            task_timeout: None,
        }
    }

    /// Per-task deadline. A task that overruns it counts as failed.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs every task to completion and returns the collected values.
    ///
    /// At most `max_workers` tasks run at once. The completed counter and the
    /// progress callback are driven from this single collecting loop, so every
    /// completion is counted exactly once and `progress` sees `1..=total` in
    /// strictly increasing order with a constant `total`. There is no
    /// cancellation: without a task timeout a task that never finishes keeps
    /// the batch waiting.
    pub async fn execute<T, E, Fut>(&self, tasks: Vec<Fut>, progress: Option<&ProgressCallback>) -> Vec<T>
    where
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        if tasks.is_empty() {
            return Vec::new();
        }

        let total = tasks.len();
        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut running = JoinSet::new();

        for task in tasks {
            let permits = permits.clone();
            let timeout = self.task_timeout;
            running.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return Completion::Failed("worker pool closed".to_string());
                };
                let outcome = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, task).await {
                        Ok(outcome) => outcome,
                        Err(_) => return Completion::TimedOut(limit),
                    },
                    None => task.await,
                };
                match outcome {
                    Ok(Some(value)) => Completion::Value(value),
                    Ok(None) => Completion::Empty,
                    Err(e) => Completion::Failed(e.to_string()),
                }
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut completed = 0;

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(Completion::Value(value)) => results.push(value),
                Ok(Completion::Empty) => debug!("task finished without a result"),
                Ok(Completion::Failed(error)) => debug!(%error, "task failed"),
                Ok(Completion::TimedOut(limit)) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "task exceeded its deadline")
                }
                Err(e) if e.is_panic() => warn!(error = %e, "task panicked"),
                Err(e) => warn!(error = %e, "task was cancelled"),
            }

            completed += 1;
            if let Some(progress) = progress {
                progress(completed, total);
            }
        }

        debug!(total, collected = results.len(), "batch finished");
        results
    }
}
