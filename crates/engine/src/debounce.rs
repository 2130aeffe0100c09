//! Debounced save scheduling
//!
//! One named worker thread per debounced store. Each request replaces the
//! pending deadline, so a burst of writes collapses into a single save that
//! runs `delay` after the last request.

use crate::error::{StoreError, StoreResult};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct SchedulerInner {
    deadline: Mutex<Option<Instant>>,
    wake: Condvar,
    shutdown: AtomicBool,
}

/// A cancellable, replaceable deferred task
pub(crate) struct SaveScheduler {
    inner: Arc<SchedulerInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SaveScheduler {
    /// Spawn the worker; `task` runs each time a deadline expires
    pub(crate) fn spawn(task: impl Fn() + Send + 'static) -> StoreResult<Self> {
        let inner = Arc::new(SchedulerInner {
            deadline: Mutex::new(None),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let worker = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("shapestore-save".to_string())
            .spawn(move || worker_loop(&worker, task))
            .map_err(|e| StoreError::Internal(format!("failed to spawn save thread: {}", e)))?;

        Ok(Self {
            inner,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Run the task `delay` from now, replacing any pending deadline
    pub(crate) fn schedule(&self, delay: Duration) {
        let mut deadline = self.inner.deadline.lock();
        *deadline = Some(Instant::now() + delay);
        self.inner.wake.notify_one();
    }

    /// Cancel the pending deadline, returning whether there was one
    pub(crate) fn take_pending(&self) -> bool {
        self.inner.deadline.lock().take().is_some()
    }

    /// Whether a deadline is pending
    pub(crate) fn is_pending(&self) -> bool {
        self.inner.deadline.lock().is_some()
    }

    /// Stop and join the worker. A pending deadline is left in place so the
    /// caller can still run it with [`take_pending`](Self::take_pending).
    pub(crate) fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);

        // Notify under the lock so a worker between its shutdown check and
        // wait() cannot miss the wakeup.
        {
            let _deadline = self.inner.deadline.lock();
            self.inner.wake.notify_all();
        }

        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(inner: &SchedulerInner, task: impl Fn()) {
    let mut deadline = inner.deadline.lock();
    loop {
        if inner.shutdown.load(Ordering::Acquire) {
            return;
        }
        let next = *deadline;
        match next {
            None => inner.wake.wait(&mut deadline),
            Some(at) if Instant::now() >= at => {
                *deadline = None;
                MutexGuard::unlocked(&mut deadline, &task);
            }
            Some(at) => {
                let _ = inner.wake.wait_until(&mut deadline, at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_scheduler() -> (SaveScheduler, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let scheduler = SaveScheduler::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (scheduler, runs)
    }

    #[test]
    fn test_burst_collapses_into_one_run() {
        let (scheduler, runs) = counting_scheduler();
        for _ in 0..5 {
            scheduler.schedule(Duration::from_millis(50));
        }
        assert!(scheduler.is_pending());

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
        scheduler.shutdown();
    }

    #[test]
    fn test_take_pending_cancels() {
        let (scheduler, runs) = counting_scheduler();
        scheduler.schedule(Duration::from_secs(60));
        assert!(scheduler.take_pending());
        assert!(!scheduler.take_pending());
        scheduler.shutdown();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_keeps_pending_deadline() {
        let (scheduler, runs) = counting_scheduler();
        scheduler.schedule(Duration::from_secs(60));
        scheduler.shutdown();
        assert!(scheduler.is_pending());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (scheduler, _runs) = counting_scheduler();
        scheduler.shutdown();
        scheduler.shutdown();
    }
}
