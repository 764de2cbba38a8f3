use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::priority::Priority;

/// Point-in-time view of a scheduler's activity.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerMetrics {
    /// Worker threads the pool was started with.
    pub workers: usize,
    /// Thunks accepted by `add`/`submit`.
    pub submitted: u64,
    /// Thunks that ran to completion.
    pub executed: u64,
    /// Empty thunks skipped at dispatch.
    pub skipped: u64,
    /// Thunks still waiting in the queue.
    pub pending: usize,
    pub pending_by_priority: BTreeMap<Priority, usize>,
    pub started_at: DateTime<Utc>,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Lock-free counters shared by submitters and workers.
#[derive(Debug)]
pub(crate) struct MetricCounters {
    submitted: AtomicU64,
    executed: AtomicU64,
    skipped: AtomicU64,
    /// Millis since the epoch, `i64::MIN` until the first completion.
    last_completed_ms: AtomicI64,
    started_at: DateTime<Utc>,
}

impl Default for MetricCounters {
    fn default() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            last_completed_ms: AtomicI64::new(i64::MIN),
            started_at: Utc::now(),
        }
    }
}

impl MetricCounters {
    pub(crate) fn record_submission(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_execution(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.last_completed_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, workers: usize, pending: [usize; 3]) -> SchedulerMetrics {
        let last = self.last_completed_ms.load(Ordering::Relaxed);
        let last_completed_at = if last == i64::MIN {
            None
        } else {
            DateTime::from_timestamp_millis(last)
        };

        SchedulerMetrics {
            workers,
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            pending: pending.iter().sum(),
            pending_by_priority: Priority::ALL
                .iter()
                .map(|p| (*p, pending[p.index()]))
                .collect(),
            started_at: self.started_at,
            last_completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot() {
        let m = MetricCounters::default().snapshot(2, [0, 0, 0]);
        assert_eq!(m.workers, 2);
        assert_eq!(m.submitted, 0);
        assert_eq!(m.executed, 0);
        assert_eq!(m.pending, 0);
        assert!(m.last_completed_at.is_none());
        assert_eq!(m.pending_by_priority.len(), 3);
    }

    #[test]
    fn counters_accumulate() {
        let c = MetricCounters::default();
        c.record_submission();
        c.record_submission();
        c.record_submission();
        c.record_execution();
        c.record_skip();

        let m = c.snapshot(1, [1, 0, 0]);
        assert_eq!(m.submitted, 3);
        assert_eq!(m.executed, 1);
        assert_eq!(m.skipped, 1);
        assert_eq!(m.pending, 1);
        assert_eq!(m.pending_by_priority[&Priority::Low], 1);
        assert!(m.last_completed_at.is_some());
        assert!(m.last_completed_at.unwrap() >= m.started_at - chrono::Duration::seconds(1));
    }

    #[test]
    fn snapshot_serializes_priorities_by_name() {
        let m = MetricCounters::default().snapshot(1, [0, 2, 1]);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["pending"], 3);
        assert_eq!(json["pending_by_priority"]["normal"], 2);
        assert_eq!(json["pending_by_priority"]["high"], 1);
    }
}
