//! Subscriber list and synchronous delivery.
//!
//! Every delivery works on a snapshot of the list taken when it starts, so
//! subscribing while a notification is in flight is safe and only affects
//! later notifications.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use fasync_core::SignalConfig;
use tracing::{trace, warn};

/// A subscriber callback. Shared so snapshots are cheap to take and can be
/// moved onto emission threads.
pub type Subscriber<A> = Arc<dyn Fn(A) + Send + Sync + 'static>;

/// Ordered multicast channel: every subscriber receives its own copy of the
/// arguments.
///
/// Subscribers are appended in order and never removed. Because callbacks
/// are `'static`, anything they touch is owned by them (typically through an
/// `Arc`), so a delivery running on a background thread cannot outlive the
/// data it uses.
pub struct Signal<A> {
    subscribers: RwLock<Vec<Subscriber<A>>>,
    thread_name_prefix: String,
    stack_size: Option<usize>,
    /// Numbers the threads spawned by asynchronous emissions.
    spawned: AtomicU64,
}

impl<A> Signal<A> {
    pub fn new() -> Self {
        Self::with_config(&SignalConfig::default())
    }

    /// Build a signal whose emission threads follow `config`.
    ///
    /// NUL bytes are dropped from the thread name prefix, since a thread
    /// cannot be spawned with one in its name.
    pub fn with_config(config: &SignalConfig) -> Self {
        let mut thread_name_prefix = config.thread_name_prefix.clone();
        if thread_name_prefix.contains('\0') {
            warn!("dropping NUL bytes from signal thread name prefix");
            thread_name_prefix.retain(|c| c != '\0');
        }
        Self {
            subscribers: RwLock::new(Vec::new()),
            thread_name_prefix,
            stack_size: config.stack_size,
            spawned: AtomicU64::new(0),
        }
    }

    /// Append a subscriber. No de-duplication: subscribing twice means being
    /// called twice.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.push(Arc::new(callback));
        trace!(subscribers = subscribers.len(), "subscriber added");
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current subscriber list, in subscription order.
    pub(crate) fn snapshot(&self) -> Vec<Subscriber<A>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builder for the next emission thread: `{prefix}-{n}`.
    pub(crate) fn thread_builder(&self) -> thread::Builder {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let builder = thread::Builder::new().name(format!("{}-{}", self.thread_name_prefix, n));
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

impl<A: Clone> Signal<A> {
    /// Invoke every subscriber on the calling thread, one after another, in
    /// subscription order. A panicking subscriber propagates to the caller
    /// and the remaining subscribers are not called.
    pub fn notify(&self, args: A) {
        deliver(&self.snapshot(), args);
    }
}

/// Sequential pass over `subscribers`; the last one receives `args` itself.
pub(crate) fn deliver<A: Clone>(subscribers: &[Subscriber<A>], args: A) {
    if let Some((last, rest)) = subscribers.split_last() {
        for subscriber in rest {
            subscriber(args.clone());
        }
        last(args);
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.len())
            .field("thread_name_prefix", &self.thread_name_prefix)
            .finish()
    }
}
