//! Worker threads: one OS thread per worker, bound to the pool's queue for
//! its entire life, executing one item at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::core::error::PoolError;
use crate::core::queue::BoundedQueue;
use crate::core::work::{FailureInfo, FailureObserver, WorkHandle, WorkState};

/// Handle to a single worker thread, exclusively owned by the pool.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread polling `queue` until `stop` is observed.
    pub(crate) fn spawn(
        id: usize,
        queue: Arc<BoundedQueue<WorkHandle>>,
        stop: Arc<AtomicBool>,
        observer: Option<Arc<dyn FailureObserver>>,
    ) -> Result<Self, PoolError> {
        let thread = thread::Builder::new()
            .name(format!("wp-worker-{id}"))
            .spawn(move || run(id, &queue, &stop, observer.as_deref()))
            .map_err(PoolError::Spawn)?;
        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Join the worker thread; a no-op if already joined.
    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                // The run loop catches payload panics, so this indicates a
                // bug in the worker itself rather than in submitted work.
                warn!(worker_id = self.id, "worker thread panicked");
            }
        }
    }
}

/// Worker loop: block on `pop`, run the item, repeat until stopped.
///
/// A stop flag alone cannot wake a worker already blocked in `pop`; the pool
/// pushes one poison item per worker at shutdown to guarantee each worker
/// returns here, observes the flag, and exits.
fn run(
    id: usize,
    queue: &BoundedQueue<WorkHandle>,
    stop: &AtomicBool,
    observer: Option<&dyn FailureObserver>,
) {
    debug!(worker_id = id, "worker thread started");
    loop {
        let item = queue.pop();
        if stop.load(Ordering::Acquire) {
            // The stop signal arrived before this dequeue; the item (real or
            // poison) is abandoned without running.
            item.cancel();
            break;
        }
        execute(id, &item, observer);
    }
    debug!(worker_id = id, "worker thread exiting");
}

/// Run one item inside a failure-isolating boundary.
fn execute(id: usize, item: &WorkHandle, observer: Option<&dyn FailureObserver>) {
    if !item.transition(WorkState::Running) {
        // Already cancelled by a concurrent drain; nothing to run.
        return;
    }
    let Some(job) = item.take_payload() else {
        item.transition(WorkState::Errored);
        return;
    };

    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
        Ok(()) => {
            item.transition(WorkState::Completed);
            debug!(worker_id = id, "work item completed");
        }
        Err(panic) => {
            let failure = FailureInfo::from_panic(panic.as_ref());
            warn!(worker_id = id, %failure, "work item payload failed");
            item.transition(WorkState::Errored);
            if let Some(observer) = observer {
                observer.on_failure(id, item, &failure);
            }
        }
    }
}
