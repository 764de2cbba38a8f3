use std::fmt;

use tracing::warn;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A type-erased, single-use unit of deferred work.
///
/// The thunk owns its callable together with every argument bound to it, so
/// nothing the task touches is borrowed from the submitter. It is consumed by
/// [`TaskThunk::run`] and dropped right after.
#[derive(Default)]
pub struct TaskThunk {
    job: Option<Job>,
}

impl TaskThunk {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            job: Some(Box::new(f)),
        }
    }

    /// Bind `args` to `f` now; the call happens when the thunk runs.
    ///
    /// Several arguments are passed as a tuple.
    pub fn bind<F, A>(f: F, args: A) -> Self
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        Self::new(move || f(args))
    }

    /// A thunk with nothing to call. Running it is a logged no-op.
    pub fn empty() -> Self {
        Self { job: None }
    }

    pub fn is_empty(&self) -> bool {
        self.job.is_none()
    }

    /// Invoke the thunk, consuming it. Returns `false` when it was empty.
    pub fn run(self) -> bool {
        match self.job {
            Some(job) => {
                job();
                true
            }
            None => {
                warn!("skipping empty task thunk");
                false
            }
        }
    }
}

impl fmt::Debug for TaskThunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskThunk")
            .field("empty", &self.is_empty())
            .finish()
    }
}
