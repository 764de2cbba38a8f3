use tracing::{debug, error, info, warn};

use crate::error::SchedulerError;
use crate::metrics::SchedulerMetrics;

use super::core::Scheduler;

impl Scheduler {
    /// Stop accepting work, drain the queue and join every worker.
    ///
    /// Returns the final metrics, or [`SchedulerError::WorkerPanicked`] when
    /// one or more workers were killed by a panicking task.
    pub fn shutdown(mut self) -> Result<SchedulerMetrics, SchedulerError> {
        let panicked = self.stop_and_join();
        if panicked > 0 {
            return Err(SchedulerError::WorkerPanicked { count: panicked });
        }
        Ok(self.metrics())
    }

    /// Raise the stop flag, wake idle workers and wait for all of them.
    /// Returns how many workers ended by panic. Idempotent.
    pub(super) fn stop_and_join(&mut self) -> usize {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        debug!(pending = self.pending(), "scheduler shutdown requested");
        self.shared.queue.raise_stop(&self.shared.stop);

        let mut panicked = 0;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                panicked += 1;
                error!(worker = %name, "worker terminated by a panicking task");
            }
        }

        // Only reachable with zero workers or when every worker died.
        let dropped = self.shared.queue.clear();
        if dropped > 0 {
            warn!(dropped, "discarding queued tasks with no live worker");
        }

        let metrics = self.metrics();
        info!(
            executed = metrics.executed,
            skipped = metrics.skipped,
            "scheduler stopped"
        );
        panicked
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
