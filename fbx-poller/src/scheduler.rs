//! Poll task scheduler and management
//!
//! Each scheduled task runs in its own tokio task on a fixed-rate timeline:
//! run `k` is due at `start + initial_delay + k * period` no matter how long
//! earlier runs took. A run that overruns is followed immediately by the
//! next one instead of pushing the whole timeline back. Runs of one task
//! never overlap, and a failing or panicking run only gets logged.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::error::{PollingError, PollingResult};
use crate::task::{PollTask, TaskId};

/// Default cap on concurrently scheduled tasks
pub const DEFAULT_MAX_TASKS: usize = 64;

/// Cancellation handle for a scheduled task
///
/// Cloning is cheap. Dropping a handle does not cancel the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    shutdown: Arc<watch::Sender<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Stop future runs
    ///
    /// A run that is already executing completes; no further run starts.
    pub fn cancel(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn same_task(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.shutdown, &other.shutdown)
    }
}

#[derive(Debug, Default)]
struct TaskCounters {
    polls: AtomicU64,
    errors: AtomicU64,
    consecutive_errors: AtomicU32,
}

/// A running task and its bookkeeping
#[derive(Debug)]
struct PollingTask {
    handle: TaskHandle,
    period: Duration,
    task_handle: JoinHandle<()>,
    started_at: SystemTime,
    counters: Arc<TaskCounters>,
}

impl PollingTask {
    fn start<T: PollTask>(id: TaskId, initial_delay: Duration, period: Duration, task: T) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let counters = Arc::new(TaskCounters::default());

        let task_handle = tokio::spawn(Self::polling_loop(
            id.clone(),
            task,
            initial_delay,
            period,
            shutdown_rx,
            Arc::clone(&counters),
        ));

        Self {
            handle: TaskHandle {
                id,
                shutdown: Arc::new(shutdown_tx),
            },
            period,
            task_handle,
            started_at: SystemTime::now(),
            counters,
        }
    }

    async fn polling_loop<T: PollTask>(
        id: TaskId,
        mut task: T,
        initial_delay: Duration,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
        counters: Arc<TaskCounters>,
    ) {
        debug!(task = %id, ?initial_delay, ?period, "poll task started");

        let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
        // Burst keeps run k pinned to start + k * period after an overrun
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;
                // Fires on cancel, or with Err once every handle is gone
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            if *shutdown.borrow() {
                break;
            }

            let count = counters.polls.fetch_add(1, Ordering::Relaxed) + 1;

            match AssertUnwindSafe(task.poll()).catch_unwind().await {
                Ok(Ok(())) => {
                    counters.consecutive_errors.store(0, Ordering::Relaxed);
                }
                Ok(Err(e)) => {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    let streak = counters.consecutive_errors.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(task = %id, count, streak, error = %e, "poll run failed");
                }
                Err(_) => {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    counters.consecutive_errors.fetch_add(1, Ordering::Relaxed);
                    error!(task = %id, count, "poll run panicked");
                }
            }
        }

        debug!(task = %id, "poll task ended");
    }

    fn is_running(&self) -> bool {
        !self.task_handle.is_finished() && !self.handle.is_cancelled()
    }

    fn stats(&self) -> PollingTaskStats {
        PollingTaskStats {
            id: self.handle.id.clone(),
            period: self.period,
            started_at: self.started_at,
            poll_count: self.counters.polls.load(Ordering::Relaxed),
            error_count: self.counters.errors.load(Ordering::Relaxed),
            consecutive_errors: self.counters.consecutive_errors.load(Ordering::Relaxed),
            is_running: self.is_running(),
        }
    }

    async fn join(self) -> PollingResult<()> {
        self.task_handle
            .await
            .map_err(|e| PollingError::TaskJoin {
                id: self.handle.id,
                reason: e.to_string(),
            })
    }
}

/// Statistics for a scheduled task
#[derive(Debug, Clone)]
pub struct PollingTaskStats {
    pub id: TaskId,
    pub period: Duration,
    pub started_at: SystemTime,
    /// Runs started so far
    pub poll_count: u64,
    /// Runs that failed or panicked
    pub error_count: u64,
    pub consecutive_errors: u32,
    pub is_running: bool,
}

/// Runs named periodic tasks at fixed rates
///
/// # Example
///
/// ```rust,ignore
/// let scheduler = PollScheduler::new();
/// let handle = scheduler
///     .schedule("phone-state", Duration::from_secs(1), Duration::from_secs(2), task)
///     .await?;
/// // ...
/// if let Some(handle) = handle {
///     scheduler.cancel(&handle).await;
/// }
/// ```
pub struct PollScheduler {
    active_tasks: Arc<RwLock<HashMap<TaskId, PollingTask>>>,
    max_concurrent_tasks: usize,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::with_max_tasks(DEFAULT_MAX_TASKS)
    }

    pub fn with_max_tasks(max_concurrent_tasks: usize) -> Self {
        Self {
            active_tasks: Arc::new(RwLock::new(HashMap::new())),
            max_concurrent_tasks,
        }
    }

    /// Start running `task` every `period`, first after `initial_delay`
    ///
    /// A zero `period` disables the task: nothing is spawned and `None` is
    /// returned. Scheduling an id that is still running returns the
    /// existing handle and drops `task`.
    pub async fn schedule<T: PollTask>(
        &self,
        id: impl Into<TaskId>,
        initial_delay: Duration,
        period: Duration,
        task: T,
    ) -> PollingResult<Option<TaskHandle>> {
        let id = id.into();

        if period.is_zero() {
            debug!(task = %id, "period is zero, task not scheduled");
            return Ok(None);
        }

        let mut tasks = self.active_tasks.write().await;

        if let Some(existing) = tasks.get(&id) {
            if existing.is_running() {
                return Ok(Some(existing.handle.clone()));
            }
            tasks.remove(&id);
        }

        if tasks.len() >= self.max_concurrent_tasks {
            return Err(PollingError::TooManyTasks {
                active: tasks.len(),
                limit: self.max_concurrent_tasks,
            });
        }

        let polling_task = PollingTask::start(id.clone(), initial_delay, period, task);
        let handle = polling_task.handle.clone();
        tasks.insert(id.clone(), polling_task);

        debug!(task = %id, ?period, "scheduled poll task");

        Ok(Some(handle))
    }

    /// Stop future runs of the task behind `handle`
    ///
    /// Returns immediately; an in-flight run finishes in the background.
    /// Returns `false` if the handle no longer names a scheduled task.
    pub async fn cancel(&self, handle: &TaskHandle) -> bool {
        handle.cancel();

        let mut tasks = self.active_tasks.write().await;
        match tasks.get(handle.id()) {
            Some(task) if task.handle.same_task(handle) => {
                tasks.remove(handle.id());
                debug!(task = %handle.id(), "cancelled poll task");
                true
            }
            _ => false,
        }
    }

    /// Cancel the task behind `handle` and wait for it to finish
    pub async fn stop(&self, handle: &TaskHandle) -> PollingResult<()> {
        handle.cancel();

        let removed = {
            let mut tasks = self.active_tasks.write().await;
            match tasks.get(handle.id()) {
                Some(task) if task.handle.same_task(handle) => tasks.remove(handle.id()),
                _ => None,
            }
        };

        match removed {
            Some(task) => task.join().await,
            None => Ok(()),
        }
    }

    /// Whether `id` is scheduled and not cancelled
    pub async fn is_scheduled(&self, id: &TaskId) -> bool {
        let tasks = self.active_tasks.read().await;
        tasks.get(id).map(PollingTask::is_running).unwrap_or(false)
    }

    /// Statistics for one task
    pub async fn task_stats(&self, id: &TaskId) -> Option<PollingTaskStats> {
        let tasks = self.active_tasks.read().await;
        tasks.get(id).map(PollingTask::stats)
    }

    /// Statistics for every scheduled task
    pub async fn stats(&self) -> PollSchedulerStats {
        let tasks = self.active_tasks.read().await;

        let mut task_stats: Vec<_> = tasks.values().map(PollingTask::stats).collect();
        task_stats.sort_by(|a, b| a.id.cmp(&b.id));

        PollSchedulerStats {
            total_active_tasks: tasks.len(),
            max_concurrent_tasks: self.max_concurrent_tasks,
            task_stats,
        }
    }

    /// Cancel every task and wait for all of them
    pub async fn shutdown_all(&self) -> PollingResult<()> {
        let drained: Vec<_> = {
            let mut tasks = self.active_tasks.write().await;
            tasks.drain().map(|(_, task)| task).collect()
        };

        let mut first_error = None;
        for task in drained {
            task.handle.cancel();
            let id = task.handle.id.clone();
            match task.join().await {
                Ok(()) => debug!(task = %id, "poll task shut down"),
                Err(e) => {
                    error!(task = %id, error = %e, "poll task failed to shut down");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for the scheduler
#[derive(Debug)]
pub struct PollSchedulerStats {
    pub total_active_tasks: usize,
    pub max_concurrent_tasks: usize,
    pub task_stats: Vec<PollingTaskStats>,
}

impl std::fmt::Display for PollSchedulerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Poll Scheduler Stats:")?;
        writeln!(
            f,
            "  Active tasks: {}/{}",
            self.total_active_tasks, self.max_concurrent_tasks
        )?;

        if !self.task_stats.is_empty() {
            writeln!(f, "  Task details:")?;
            for stat in &self.task_stats {
                writeln!(
                    f,
                    "    {}: every {:?} (polls: {}, errors: {}, running: {})",
                    stat.id, stat.period, stat.poll_count, stat.error_count, stat.is_running
                )?;
            }
        }

        Ok(())
    }
}
