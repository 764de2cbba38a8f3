//! Integration tests for the scheduler's public contract: priority
//! monotonicity, no task loss under concurrent submission, and
//! drain-to-empty teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use fasync_scheduler::{Priority, Scheduler, SchedulerConfig, TaskThunk};

#[test]
fn concurrent_submitters_lose_nothing() {
    const SUBMITTERS: usize = 8;
    const PER_SUBMITTER: usize = 500;

    let scheduler = Scheduler::new(3).unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        for t in 0..SUBMITTERS {
            let scheduler = &scheduler;
            let count = Arc::clone(&count);
            s.spawn(move || {
                for i in 0..PER_SUBMITTER {
                    let c = Arc::clone(&count);
                    let priority = Priority::ALL[(t + i) % 3];
                    scheduler.add_with(priority, move || {
                        c.fetch_add(1, Ordering::Relaxed);
                    });
                }
            });
        }
    });

    let metrics = scheduler.shutdown().unwrap();
    assert_eq!(count.load(Ordering::Relaxed), SUBMITTERS * PER_SUBMITTER);
    assert_eq!(metrics.executed, (SUBMITTERS * PER_SUBMITTER) as u64);
}

#[test]
fn high_priority_served_before_lower_levels_present_at_the_same_time() {
    let scheduler = Scheduler::new(1).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    // Keep the single worker busy while the queue fills up.
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    scheduler.add(move || {
        started_tx.send(()).unwrap();
        release_rx.recv().unwrap();
    });
    started_rx.recv().unwrap();

    for (i, p) in [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Low,
        Priority::High,
        Priority::Normal,
    ]
    .into_iter()
    .enumerate()
    {
        let log = Arc::clone(&log);
        scheduler.bind_with(
            p,
            move |(priority, idx): (Priority, usize)| log.lock().unwrap().push((priority, idx)),
            (p, i),
        );
    }

    release_tx.send(()).unwrap();
    drop(scheduler);

    let log = log.lock().unwrap();
    let priorities: Vec<Priority> = log.iter().map(|(p, _)| *p).collect();
    let mut sorted = priorities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(priorities, sorted, "entries must come out in non-increasing priority");
    assert_eq!(log.len(), 6);
}

#[test]
fn prepared_thunks_and_closures_mix() {
    let scheduler = Scheduler::with_config(&SchedulerConfig::with_workers(2)).unwrap();
    let total = Arc::new(AtomicUsize::new(0));

    let t = Arc::clone(&total);
    scheduler.submit(
        Priority::Low,
        TaskThunk::bind(
            move |(a, b): (usize, usize)| {
                t.fetch_add(a + b, Ordering::SeqCst);
            },
            (40, 2),
        ),
    );
    let t = Arc::clone(&total);
    scheduler.add(move || {
        t.fetch_add(100, Ordering::SeqCst);
    });

    drop(scheduler);
    assert_eq!(total.load(Ordering::SeqCst), 142);
}

#[test]
fn shutdown_returns_final_metrics() {
    let scheduler = Scheduler::new(2).unwrap();
    scheduler.add(|| {});
    let metrics = scheduler.shutdown().unwrap();
    assert_eq!(metrics.workers, 2);
    assert_eq!(metrics.submitted, 1);
    assert_eq!(metrics.executed, 1);
}
