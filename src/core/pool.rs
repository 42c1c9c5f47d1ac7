//! The pool: owns the queue and a fixed set of workers, created together at
//! construction and torn down together at shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::core::error::PoolError;
use crate::core::queue::BoundedQueue;
use crate::core::work::{FailureObserver, WorkHandle};
use crate::core::worker::Worker;

/// A fixed-size worker thread pool.
///
/// Workers are spawned at construction and all poll the shared queue before
/// the constructor returns; the worker count never changes for the pool's
/// lifetime. The pool is an explicit owned value: dropping it shuts it down,
/// and there is no process-wide singleton.
///
/// Submission may block under backpressure when the queue is bounded and
/// full; that is the design, not an error.
#[derive(Debug)]
pub struct Pool {
    queue: Arc<BoundedQueue<WorkHandle>>,
    workers: Mutex<Vec<Worker>>,
    stop: Arc<AtomicBool>,
    worker_count: usize,
}

impl Pool {
    /// Start a pool from `config`, spawning all workers immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] for a rejected configuration and
    /// [`PoolError::Spawn`] if a worker thread cannot be started; in the
    /// latter case all previously spawned workers are stopped and joined
    /// before the error is returned.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Self::build(config, None)
    }

    /// As [`Pool::new`], additionally registering an observer that is
    /// notified of every payload failure.
    pub fn with_observer(
        config: PoolConfig,
        observer: Arc<dyn FailureObserver>,
    ) -> Result<Self, PoolError> {
        Self::build(config, Some(observer))
    }

    fn build(
        config: PoolConfig,
        observer: Option<Arc<dyn FailureObserver>>,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let worker_count = config.effective_worker_count();
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let stop = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            match Worker::spawn(id, Arc::clone(&queue), Arc::clone(&stop), observer.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Retire the workers that did start.
                    stop.store(true, Ordering::Release);
                    for _ in 0..workers.len() {
                        queue.force_push(WorkHandle::poison());
                    }
                    for worker in &mut workers {
                        worker.join();
                    }
                    return Err(e);
                }
            }
        }

        info!(
            worker_count,
            queue_capacity = config.queue_capacity,
            "pool started"
        );

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            stop,
            worker_count,
        })
    }

    /// Submit a unit of work, returning its handle immediately.
    ///
    /// The closure is wrapped in a work item in state `Queued` and enqueued;
    /// if the queue is bounded and full this call blocks until capacity
    /// frees up. Submission does not wait for execution.
    ///
    /// # Errors
    ///
    /// Fails fast with [`PoolError::PoolStopped`] after [`Pool::shutdown`].
    /// A submission racing `shutdown` on another thread either lands before
    /// the queue closes (its item is drained to `Cancelled`) or has its push
    /// refused and errors here; an `Ok` handle always reaches a terminal
    /// state.
    pub fn submit<F>(&self, job: F) -> Result<WorkHandle, PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.stop.load(Ordering::Acquire) {
            return Err(PoolError::PoolStopped);
        }
        let handle = WorkHandle::new(Box::new(job));
        if self.queue.push(handle.clone()).is_err() {
            // Shutdown closed the queue between the stop check and the push.
            return Err(PoolError::PoolStopped);
        }
        debug!("work item submitted");
        Ok(handle)
    }

    /// Block until every handle in `handles` reaches a terminal state.
    ///
    /// No guarantee is made about which handle becomes terminal first.
    pub fn wait_all(&self, handles: &[WorkHandle]) {
        for handle in handles {
            handle.wait();
        }
    }

    /// Shut the pool down: stop all workers, cancel everything still queued,
    /// and join the worker threads. Blocking and idempotent; every caller,
    /// including concurrent ones, returns only after the workers are gone.
    ///
    /// Protocol: set the stop flag, drain the queue (every unstarted item
    /// becomes `Cancelled`), push one poison item per worker so workers
    /// blocked in `pop` wake and observe the flag, then join. The queue is
    /// then closed so racing submissions can no longer land, and a final
    /// drain sweeps out items that arrived before the close, so no item is
    /// left without a terminal state.
    pub fn shutdown(&self) {
        let first = !self.stop.swap(true, Ordering::AcqRel);
        if first {
            info!("shutting down pool");
        }

        let mut cancelled = 0usize;
        self.queue.drain(|item| {
            if item.cancel() {
                cancelled += 1;
            }
        });

        // Concurrent callers serialize on the workers mutex: whichever holds
        // it first poisons and joins the workers, and later callers find the
        // list already empty.
        let mut workers = self.workers.lock();
        for _ in 0..workers.len() {
            self.queue.force_push(WorkHandle::poison());
        }
        for worker in workers.iter_mut() {
            worker.join();
        }
        workers.clear();

        // Close before the final sweep: a racing submission either landed
        // before the close (cancelled below) or has its push refused and
        // reports the pool as stopped.
        self.queue.close();
        self.queue.drain(|item| {
            if item.cancel() {
                cancelled += 1;
            }
        });

        if first {
            info!(cancelled, "pool shut down");
        }
    }

    /// Apply `func` to every element of `items` in parallel, in place.
    ///
    /// A pure composition of [`Pool::submit`] and [`Pool::wait_all`]: one
    /// item is submitted per element and the call blocks until the whole
    /// batch is terminal. Elements keep their original positions.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolStopped`] if the pool is shut down before or
    /// during submission; elements are restored to `items` either way, with
    /// any element whose item was cancelled left unprocessed.
    pub fn for_each<T, F>(&self, func: F, items: &mut Vec<T>) -> Result<(), PoolError>
    where
        T: Send + 'static,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        let cells: Vec<Arc<Mutex<Option<T>>>> = items
            .drain(..)
            .map(|value| Arc::new(Mutex::new(Some(value))))
            .collect();

        let mut handles = Vec::with_capacity(cells.len());
        let mut submit_err = None;
        for cell in &cells {
            let cell = Arc::clone(cell);
            let func = Arc::clone(&func);
            match self.submit(move || {
                let mut slot = cell.lock();
                if let Some(value) = slot.as_mut() {
                    func(value);
                }
            }) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    submit_err = Some(e);
                    break;
                }
            }
        }
        self.wait_all(&handles);

        for cell in cells {
            // Workers release their clone of the cell once the item is
            // terminal, so unwrapping normally succeeds; the fallback covers
            // an item cancelled while the closure still held its clone.
            let value = match Arc::try_unwrap(cell) {
                Ok(cell) => cell.into_inner(),
                Err(shared) => shared.lock().take(),
            };
            if let Some(value) = value {
                items.push(value);
            }
        }

        match submit_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Apply `func` to every index in `0..count` in parallel; blocks until
    /// the whole batch is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolStopped`] if the pool is shut down before or
    /// during submission; the already-submitted part of the batch is waited
    /// on either way, so no payload is still running when this returns.
    pub fn for_index<F>(&self, func: F, count: usize) -> Result<(), PoolError>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        let mut handles = Vec::with_capacity(count);
        let mut submit_err = None;
        for index in 0..count {
            let func = Arc::clone(&func);
            match self.submit(move || func(index)) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    submit_err = Some(e);
                    break;
                }
            }
        }
        self.wait_all(&handles);
        match submit_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of worker threads, fixed for the pool's lifetime.
    pub fn size(&self) -> usize {
        self.worker_count
    }

    /// Number of items currently waiting in the queue (snapshot).
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
