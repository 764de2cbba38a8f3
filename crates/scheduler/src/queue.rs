//! Lock-guarded priority queue of pending task thunks.
//!
//! A single mutex serializes every push, pop and emptiness check, so no
//! caller observes a half-applied operation. Entries are ordered by
//! [`Priority`] first and by submission sequence second: within one level,
//! entries pushed by the same thread come out in the order they went in.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use fasync_core::IdleStrategy;

use crate::priority::Priority;
use crate::task::TaskThunk;

/// A pending thunk together with its placement key.
#[derive(Debug)]
pub struct QueueEntry {
    pub priority: Priority,
    /// Monotonic submission counter, assigned under the queue lock.
    pub sequence: u64,
    pub thunk: TaskThunk,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // BinaryHeap is a max-heap: higher priority wins, then the older entry.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
struct Inner {
    heap: BinaryHeap<QueueEntry>,
    next_sequence: u64,
    pending: [usize; 3],
}

impl Inner {
    fn take(&mut self) -> Option<QueueEntry> {
        let entry = self.heap.pop()?;
        self.pending[entry.priority.index()] -= 1;
        Some(entry)
    }
}

/// Unbounded, concurrency-safe priority queue of [`TaskThunk`]s.
#[derive(Default)]
pub struct PriorityQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // The heap is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a thunk. Always succeeds; there is no capacity bound.
    pub fn push(&self, priority: Priority, thunk: TaskThunk) {
        {
            let mut inner = self.lock();
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.pending[priority.index()] += 1;
            inner.heap.push(QueueEntry {
                priority,
                sequence,
                thunk,
            });
        }
        self.available.notify_one();
    }

    /// Remove the highest-priority entry without blocking.
    pub fn try_pop(&self) -> Option<QueueEntry> {
        self.lock().take()
    }

    /// Fetch the next entry for a worker.
    ///
    /// Returns `None` only once `stop` is raised and the queue has been
    /// observed empty under the lock, which is what makes teardown drain
    /// every entry pushed before it.
    pub fn pop_or_wait(&self, stop: &AtomicBool, strategy: IdleStrategy) -> Option<QueueEntry> {
        match strategy {
            IdleStrategy::Block => {
                let mut inner = self.lock();
                loop {
                    if let Some(entry) = inner.take() {
                        return Some(entry);
                    }
                    if stop.load(Ordering::Acquire) {
                        return None;
                    }
                    inner = self
                        .available
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            IdleStrategy::Spin => loop {
                {
                    let mut inner = self.lock();
                    if let Some(entry) = inner.take() {
                        return Some(entry);
                    }
                    if stop.load(Ordering::Acquire) {
                        return None;
                    }
                }
                thread::yield_now();
            },
        }
    }

    /// Raise `stop` and wake every blocked worker.
    ///
    /// The flag is stored while the lock is held, so a worker that has just
    /// found the queue empty cannot miss the wakeup.
    pub fn raise_stop(&self, stop: &AtomicBool) {
        {
            let _inner = self.lock();
            stop.store(true, Ordering::Release);
        }
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Pending entry counts indexed Low, Normal, High.
    pub fn pending_by_priority(&self) -> [usize; 3] {
        self.lock().pending
    }

    /// Drop every pending entry without running it. Returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.heap.len();
        inner.heap.clear();
        inner.pending = [0; 3];
        dropped
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn noop() -> TaskThunk {
        TaskThunk::new(|| {})
    }

    #[test]
    fn empty_queue_pops_nothing() {
        let q = PriorityQueue::new();
        assert!(q.is_empty());
        assert!(q.try_pop().is_none());
    }

    #[test]
    fn pops_highest_priority_first() {
        let q = PriorityQueue::new();
        q.push(Priority::Low, noop());
        q.push(Priority::High, noop());
        q.push(Priority::Normal, noop());
        q.push(Priority::High, noop());

        let order: Vec<Priority> = std::iter::from_fn(|| q.try_pop().map(|e| e.priority)).collect();
        assert_eq!(
            order,
            vec![Priority::High, Priority::High, Priority::Normal, Priority::Low]
        );
    }

    #[test]
    fn fifo_within_priority() {
        let q = PriorityQueue::new();
        for _ in 0..5 {
            q.push(Priority::Normal, noop());
        }
        let seqs: Vec<u64> = std::iter::from_fn(|| q.try_pop().map(|e| e.sequence)).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pending_counts_track_push_and_pop() {
        let q = PriorityQueue::new();
        q.push(Priority::Low, noop());
        q.push(Priority::High, noop());
        q.push(Priority::High, noop());
        assert_eq!(q.pending_by_priority(), [1, 0, 2]);
        assert_eq!(q.len(), 3);

        q.try_pop();
        assert_eq!(q.pending_by_priority(), [1, 0, 1]);

        assert_eq!(q.clear(), 2);
        assert_eq!(q.pending_by_priority(), [0, 0, 0]);
        assert!(q.is_empty());
    }

    #[test]
    fn stop_with_empty_queue_returns_none() {
        let q = PriorityQueue::new();
        let stop = AtomicBool::new(false);
        q.raise_stop(&stop);
        assert!(q.pop_or_wait(&stop, IdleStrategy::Block).is_none());
        assert!(q.pop_or_wait(&stop, IdleStrategy::Spin).is_none());
    }

    #[test]
    fn stop_still_drains_pending_entries() {
        let q = PriorityQueue::new();
        let stop = AtomicBool::new(false);
        q.push(Priority::Low, noop());
        q.push(Priority::Normal, noop());
        q.raise_stop(&stop);

        assert!(q.pop_or_wait(&stop, IdleStrategy::Block).is_some());
        assert!(q.pop_or_wait(&stop, IdleStrategy::Spin).is_some());
        assert!(q.pop_or_wait(&stop, IdleStrategy::Block).is_none());
    }

    #[test]
    fn blocked_waiter_wakes_on_push_and_stop() {
        let q = Arc::new(PriorityQueue::new());
        let stop = Arc::new(AtomicBool::new(false));
        let popped = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let q = Arc::clone(&q);
            let stop = Arc::clone(&stop);
            let popped = Arc::clone(&popped);
            thread::spawn(move || {
                while let Some(entry) = q.pop_or_wait(&stop, IdleStrategy::Block) {
                    entry.thunk.run();
                    popped.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        thread::sleep(Duration::from_millis(20));
        q.push(Priority::Normal, noop());
        q.push(Priority::High, noop());
        thread::sleep(Duration::from_millis(20));
        q.raise_stop(&stop);

        waiter.join().unwrap();
        assert_eq!(popped.load(Ordering::SeqCst), 2);
    }
}
