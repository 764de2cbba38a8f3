use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use fasync_core::SchedulerConfig;
use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::metrics::{MetricCounters, SchedulerMetrics};
use crate::priority::Priority;
use crate::queue::PriorityQueue;
use crate::task::TaskThunk;

/// State shared between the facade and every worker.
#[derive(Default)]
pub(super) struct Shared {
    pub(super) queue: PriorityQueue,
    /// Raised once by teardown; workers exit when it is set and the queue is empty.
    pub(super) stop: AtomicBool,
    pub(super) counters: MetricCounters,
}

/// Priority task scheduler backed by a fixed pool of worker threads.
///
/// Submission is fire-and-forget: tasks return nothing and the scheduler
/// hands nothing back. Dropping the scheduler (or calling
/// [`Scheduler::shutdown`]) blocks until every task queued before teardown
/// has run. A task that panics takes its worker thread down with it.
pub struct Scheduler {
    pub(super) shared: Arc<Shared>,
    pub(super) workers: Vec<JoinHandle<()>>,
    pub(super) worker_count: usize,
    pub(super) stopped: bool,
}

impl Scheduler {
    /// Create a scheduler with exactly `workers` threads.
    ///
    /// With `0` workers nothing ever executes: tasks stay queued and are
    /// discarded when the scheduler is dropped.
    pub fn new(workers: usize) -> Result<Self, SchedulerError> {
        Self::with_config(&SchedulerConfig::with_workers(workers))
    }

    /// Create a scheduler with one worker per available CPU.
    pub fn with_available_parallelism() -> Result<Self, SchedulerError> {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Validate `config` and start its workers.
    pub fn with_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        let worker_count = config.resolved_worker_threads();
        let mut scheduler = Self {
            shared: Arc::new(Shared::default()),
            workers: Vec::with_capacity(worker_count),
            worker_count,
            stopped: false,
        };

        // On failure, drop stops and joins whatever was already spawned.
        scheduler.spawn_workers(config)?;

        info!(
            workers = worker_count,
            idle = %config.idle_strategy,
            "scheduler started"
        );
        if worker_count == 0 {
            warn!("scheduler has no workers; submitted tasks will never run");
        }
        Ok(scheduler)
    }

    /// Enqueue `task` at [`Priority::Normal`].
    pub fn add<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_with(Priority::Normal, task);
    }

    /// Enqueue `task` at an explicit priority.
    pub fn add_with<F>(&self, priority: Priority, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(priority, TaskThunk::new(task));
    }

    /// Enqueue `task` at [`Priority::Normal`] with `args` bound now.
    pub fn bind<F, A>(&self, task: F, args: A)
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.bind_with(Priority::Normal, task, args);
    }

    /// Enqueue `task` at an explicit priority with `args` bound now.
    pub fn bind_with<F, A>(&self, priority: Priority, task: F, args: A)
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.submit(priority, TaskThunk::bind(task, args));
    }

    /// Enqueue a prepared thunk. Returns as soon as the push completes.
    pub fn submit(&self, priority: Priority, thunk: TaskThunk) {
        self.shared.counters.record_submission();
        self.shared.queue.push(priority, thunk);
    }

    /// Worker threads this scheduler was started with.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Tasks waiting in the queue right now.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.shared
            .counters
            .snapshot(self.worker_count, self.shared.queue.pending_by_priority())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.worker_count)
            .field("pending", &self.pending())
            .field("stopped", &self.stopped)
            .finish()
    }
}
