use std::sync::Arc;
use std::thread;

use fasync_core::{IdleStrategy, SchedulerConfig};
use tracing::{debug, trace};

use crate::error::SchedulerError;

use super::core::{Scheduler, Shared};

impl Scheduler {
    /// Spawn `worker_count` named threads running [`worker_loop`].
    pub(super) fn spawn_workers(&mut self, config: &SchedulerConfig) -> Result<(), SchedulerError> {
        for id in 0..self.worker_count {
            let mut builder =
                thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, id));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let shared = Arc::clone(&self.shared);
            let strategy = config.idle_strategy;
            let handle = builder.spawn(move || worker_loop(id, &shared, strategy))?;
            self.workers.push(handle);
        }
        Ok(())
    }
}

/// Fetch and execute until teardown has been requested and the queue is empty.
///
/// Thunks run outside the queue lock. A panic inside one unwinds through
/// here and ends the thread.
fn worker_loop(id: usize, shared: &Shared, strategy: IdleStrategy) {
    debug!(worker = id, "worker running");

    while let Some(entry) = shared.queue.pop_or_wait(&shared.stop, strategy) {
        trace!(
            worker = id,
            priority = %entry.priority,
            sequence = entry.sequence,
            "executing task"
        );
        if entry.thunk.run() {
            shared.counters.record_execution();
        } else {
            shared.counters.record_skip();
        }
    }

    debug!(worker = id, "worker stopped");
}
