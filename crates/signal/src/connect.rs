//! Free-function helpers for wiring signals to shared targets.

use std::sync::{Arc, Weak};

use tracing::trace;

use crate::signal::Signal;

/// Subscribe a plain callback. Same as [`Signal::subscribe`].
pub fn connect<A, F>(signal: &Signal<A>, callback: F)
where
    F: Fn(A) + Send + Sync + 'static,
{
    signal.subscribe(callback);
}

/// Subscribe `method` bound to `target`.
///
/// The subscriber owns a strong reference, so the target lives at least as
/// long as the signal's subscriber list.
pub fn connect_method<A, T, M>(signal: &Signal<A>, target: Arc<T>, method: M)
where
    T: Send + Sync + 'static,
    M: Fn(&T, A) + Send + Sync + 'static,
{
    signal.subscribe(move |args| method(&target, args));
}

/// Subscribe `method` bound to `target` without keeping it alive.
///
/// Once the last strong reference to the target is gone, deliveries to this
/// subscriber are skipped.
pub fn connect_weak<A, T, M>(signal: &Signal<A>, target: &Arc<T>, method: M)
where
    T: Send + Sync + 'static,
    M: Fn(&T, A) + Send + Sync + 'static,
{
    let target: Weak<T> = Arc::downgrade(target);
    signal.subscribe(move |args| match target.upgrade() {
        Some(target) => method(&target, args),
        None => trace!("signal target dropped, skipping subscriber"),
    });
}

/// Synchronous, blocking emit. Same as [`Signal::notify`].
pub fn emit<A: Clone>(signal: &Signal<A>, args: A) {
    signal.notify(args);
}
