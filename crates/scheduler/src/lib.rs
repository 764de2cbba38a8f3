//! Priority-ordered background task scheduler backed by a fixed worker pool.
//!
//! Tasks are type-erased [`TaskThunk`]s (a closure plus its already-bound
//! arguments) pushed into a [`PriorityQueue`] and drained by the workers of a
//! [`Scheduler`]. Submission is fire-and-forget; teardown drains the queue
//! before the workers exit.
//!
//! ```no_run
//! use fasync_scheduler::{Priority, Scheduler};
//!
//! let scheduler = Scheduler::new(4)?;
//! scheduler.add(|| println!("normal priority"));
//! scheduler.bind_with(Priority::High, |(a, b): (i32, i32)| println!("{}", a + b), (1, 2));
//! drop(scheduler); // blocks until every queued task has run
//! # Ok::<(), fasync_scheduler::SchedulerError>(())
//! ```

pub mod error;
pub mod metrics;
pub mod priority;
pub mod queue;
pub mod runner;
pub mod task;

pub use error::SchedulerError;
pub use fasync_core::{IdleStrategy, SchedulerConfig};
pub use metrics::SchedulerMetrics;
pub use priority::Priority;
pub use queue::{PriorityQueue, QueueEntry};
pub use runner::Scheduler;
pub use task::TaskThunk;
