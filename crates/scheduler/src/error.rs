/// Errors surfaced by the worker pool lifecycle.
///
/// Submission and dispatch never fail; only building the pool and joining
/// its workers can.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid scheduler config: {0}")]
    Config(#[from] fasync_core::FasyncError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{count} worker thread(s) terminated by a panicking task")]
    WorkerPanicked { count: usize },
}
