//! Asynchronous emission on dedicated threads.
//!
//! Each emission returns or records a join handle. The caller decides when
//! to wait: side effects of the subscribers are only guaranteed visible after
//! [`Emission::join`] / [`EmissionGroup::join_all`].

use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::error::SignalError;
use crate::signal::{deliver, Signal};

/// Handle to one emission thread.
#[derive(Debug)]
#[must_use = "an emission should be joined or explicitly detached"]
pub struct Emission {
    handle: JoinHandle<()>,
}

impl Emission {
    fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Wait for the emission thread to finish.
    pub fn join(self) -> Result<(), SignalError> {
        self.handle
            .join()
            .map_err(|_| SignalError::SubscriberPanicked { failed: 1 })
    }

    /// Let the thread run to completion unobserved.
    pub fn detach(self) {
        drop(self.handle);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Caller-owned collection of in-flight emissions.
#[derive(Debug, Default)]
pub struct EmissionGroup {
    emissions: Vec<Emission>,
}

impl EmissionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, emission: Emission) {
        self.emissions.push(emission);
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Join every emission in the group, leaving it empty.
    ///
    /// All handles are joined even if some fail. Returns how many were
    /// joined, or the number of emissions that ended in a panic.
    pub fn join_all(&mut self) -> Result<usize, SignalError> {
        let mut joined = 0;
        let mut failed = 0;
        for emission in self.emissions.drain(..) {
            joined += 1;
            if emission.join().is_err() {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!(joined, failed, "emission threads panicked");
            return Err(SignalError::SubscriberPanicked { failed });
        }
        Ok(joined)
    }

    /// Detach every emission in the group, leaving it empty.
    pub fn detach_all(&mut self) {
        for emission in self.emissions.drain(..) {
            emission.detach();
        }
    }
}

impl Drop for EmissionGroup {
    fn drop(&mut self) {
        if !self.emissions.is_empty() {
            debug!(
                emissions = self.emissions.len(),
                "dropping emission group; unjoined threads are detached"
            );
        }
    }
}

impl<A: Clone + Send + 'static> Signal<A> {
    /// Run a full sequential [`notify`](Signal::notify) pass on one new thread.
    pub fn emit_async(&self, args: A) -> Result<Emission, SignalError> {
        let subscribers = self.snapshot();
        let handle = self
            .thread_builder()
            .spawn(move || deliver(&subscribers, args))?;
        Ok(Emission::new(handle))
    }

    /// Like [`emit_async`](Signal::emit_async), recording the handle in `group`.
    pub fn emit_async_into(&self, group: &mut EmissionGroup, args: A) -> Result<(), SignalError> {
        let emission = self.emit_async(args)?;
        group.push(emission);
        Ok(())
    }

    /// Invoke every subscriber on its own thread, all running concurrently.
    ///
    /// Threads are spawned in subscription order; completion order is
    /// unspecified and subscribers touching shared state must synchronize
    /// themselves. Returns the number of threads spawned. If a spawn fails,
    /// the threads already started stay recorded in `group`.
    pub fn emit_async_multi(
        &self,
        group: &mut EmissionGroup,
        args: A,
    ) -> Result<usize, SignalError> {
        let subscribers = self.snapshot();
        let mut spawned = 0;
        for subscriber in subscribers {
            let args = args.clone();
            let handle = self.thread_builder().spawn(move || subscriber(args))?;
            group.push(Emission::new(handle));
            spawned += 1;
        }
        debug!(spawned, "multi emission started");
        Ok(spawned)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};

    use fasync_core::SignalConfig;

    use super::*;

    #[test]
    fn emit_async_runs_sequential_pass_off_thread() {
        let signal: Signal<u32> = Signal::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let caller = std::thread::current().id();

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            signal.subscribe(move |n| {
                assert_ne!(std::thread::current().id(), caller);
                log.lock().unwrap().push(format!("{tag}{n}"));
            });
        }

        signal.emit_async(1).unwrap().join().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn emit_async_into_appends_one_handle() {
        let signal: Signal<()> = Signal::new();
        signal.subscribe(|_| {});
        signal.subscribe(|_| {});

        let mut group = EmissionGroup::new();
        signal.emit_async_into(&mut group, ()).unwrap();
        assert_eq!(group.len(), 1);
        assert_eq!(group.join_all().unwrap(), 1);
        assert!(group.is_empty());
    }

    #[test]
    fn emit_async_multi_spawns_one_thread_per_subscriber() {
        let signal: Signal<usize> = Signal::new();
        let hits: Arc<Vec<AtomicUsize>> = Arc::new((0..4).map(|_| AtomicUsize::new(0)).collect());

        for i in 0..4 {
            let hits = Arc::clone(&hits);
            signal.subscribe(move |n| {
                hits[i].fetch_add(n, Ordering::SeqCst);
            });
        }

        let mut group = EmissionGroup::new();
        assert_eq!(signal.emit_async_multi(&mut group, 1).unwrap(), 4);
        assert_eq!(group.len(), 4);
        assert_eq!(group.join_all().unwrap(), 4);
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn multi_emission_runs_subscribers_concurrently() {
        // Both subscribers must be live at once to exchange messages.
        let signal: Signal<()> = Signal::new();
        let (a_tx, a_rx) = mpsc::channel::<()>();
        let (b_tx, b_rx) = mpsc::channel::<()>();
        let a_rx = Mutex::new(a_rx);
        let b_rx = Mutex::new(b_rx);

        signal.subscribe(move |_| {
            a_tx.send(()).unwrap();
            b_rx.lock().unwrap().recv().unwrap();
        });
        signal.subscribe(move |_| {
            b_tx.send(()).unwrap();
            a_rx.lock().unwrap().recv().unwrap();
        });

        let mut group = EmissionGroup::new();
        signal.emit_async_multi(&mut group, ()).unwrap();
        assert_eq!(group.join_all().unwrap(), 2);
    }

    #[test]
    fn empty_signal_multi_emission_spawns_nothing() {
        let signal: Signal<i32> = Signal::new();
        let mut group = EmissionGroup::new();
        assert_eq!(signal.emit_async_multi(&mut group, 3).unwrap(), 0);
        assert!(group.is_empty());
        assert_eq!(group.join_all().unwrap(), 0);
    }

    #[test]
    fn panicking_subscriber_is_reported_on_join() {
        let signal: Signal<()> = Signal::new();
        let ran = Arc::new(AtomicUsize::new(0));
        signal.subscribe(|_| panic!("subscriber failure"));
        let r = Arc::clone(&ran);
        signal.subscribe(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let mut group = EmissionGroup::new();
        signal.emit_async_multi(&mut group, ()).unwrap();
        let err = group.join_all().unwrap_err();
        assert!(matches!(err, SignalError::SubscriberPanicked { failed: 1 }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        // a sequential pass stops at the panicking subscriber
        let err = signal.emit_async(()).unwrap().join().unwrap_err();
        assert!(matches!(err, SignalError::SubscriberPanicked { failed: 1 }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spawn_failure_is_returned_not_panicked() {
        // no platform can reserve a stack this large
        let signal: Signal<()> = Signal::with_config(&SignalConfig {
            stack_size: Some(1 << 62),
            ..SignalConfig::default()
        });
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        signal.subscribe(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        assert!(matches!(signal.emit_async(()), Err(SignalError::Spawn(_))));

        let mut group = EmissionGroup::new();
        assert!(matches!(
            signal.emit_async_into(&mut group, ()),
            Err(SignalError::Spawn(_))
        ));
        assert!(matches!(
            signal.emit_async_multi(&mut group, ()),
            Err(SignalError::Spawn(_))
        ));
        assert!(group.is_empty());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detached_emission_still_runs() {
        let signal: Signal<()> = Signal::new();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        signal.subscribe(move |_| {
            tx.lock().unwrap().send(()).unwrap();
        });

        signal.emit_async(()).unwrap().detach();
        rx.recv().unwrap();

        let mut group = EmissionGroup::new();
        signal.emit_async_into(&mut group, ()).unwrap();
        group.detach_all();
        assert!(group.is_empty());
        rx.recv().unwrap();
    }
}
