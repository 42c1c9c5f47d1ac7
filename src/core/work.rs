//! Work items: a submitted closure plus its observable lifecycle state.
//!
//! A [`WorkHandle`] is shared between the submitter and the worker that
//! eventually runs the item. The state machine is monotonic:
//!
//! ```text
//! Queued -> Running -> Completed
//!                   \-> Errored
//! Queued -> Cancelled
//! ```
//!
//! Once terminal, the state never changes again. Every transition notifies
//! all threads blocked in [`WorkHandle::wait`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// The unit of work carried by an item: no arguments, no return value.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle state of a submitted work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    /// Waiting in the queue; no worker has picked it up yet.
    Queued,
    /// A worker is currently executing the payload.
    Running,
    /// The payload returned normally. Terminal.
    Completed,
    /// The payload panicked during execution. Terminal.
    Errored,
    /// The item was discarded without ever running (shutdown drain, or a
    /// worker observed the stop signal at dequeue time). Terminal.
    Cancelled,
}

impl WorkState {
    /// Whether no further transition can occur from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

/// Report describing why a payload failed.
///
/// A closed variant type: either the panic carried a string message, or the
/// panic payload was something we cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureInfo {
    /// The payload panicked with a string message.
    Payload {
        /// The panic message.
        message: String,
    },
    /// The payload panicked with a non-string payload.
    Unknown,
}

impl FailureInfo {
    /// Build a failure report from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Self::Payload {
                message: (*message).to_owned(),
            }
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self::Payload {
                message: message.clone(),
            }
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload { message } => write!(f, "payload failure: {message}"),
            Self::Unknown => write!(f, "unknown failure"),
        }
    }
}

/// Observer for payload failures, registered on the pool.
///
/// Invoked by the worker thread after the item has transitioned to
/// `Errored`. The failure is never propagated to the submitter as a panic;
/// this callback is the only push-style notification channel.
pub trait FailureObserver: Send + Sync {
    /// Called once per failed payload with the id of the worker that ran it.
    fn on_failure(&self, worker_id: usize, item: &WorkHandle, failure: &FailureInfo);
}

/// Inner shared record for one work item.
///
/// The state mutex/condvar pair is independent per item: waiting on one item
/// never blocks progress on another.
struct WorkItem {
    state: Mutex<WorkState>,
    done: Condvar,
    payload: Mutex<Option<Job>>,
}

/// Cloneable handle to a submitted work item.
///
/// Held by the submitter (returned from `Pool::submit`) and by the queue /
/// worker until execution. Safe to drop at any time; state reads and writes
/// are synchronized internally.
#[derive(Clone)]
pub struct WorkHandle {
    item: Arc<WorkItem>,
}

impl WorkHandle {
    /// Wrap a job in a fresh item in state `Queued`.
    pub(crate) fn new(job: Job) -> Self {
        Self {
            item: Arc::new(WorkItem {
                state: Mutex::new(WorkState::Queued),
                done: Condvar::new(),
                payload: Mutex::new(Some(job)),
            }),
        }
    }

    /// A harmless no-op item, pushed at shutdown solely to wake a blocked
    /// worker.
    pub(crate) fn poison() -> Self {
        Self::new(Box::new(|| {}))
    }

    /// Current lifecycle state (non-blocking snapshot).
    pub fn state(&self) -> WorkState {
        *self.item.state.lock()
    }

    /// Whether the item is still waiting in the queue.
    pub fn is_queued(&self) -> bool {
        self.state() == WorkState::Queued
    }

    /// Whether a worker is currently executing the payload.
    pub fn is_running(&self) -> bool {
        self.state() == WorkState::Running
    }

    /// Whether the payload ran to completion.
    pub fn is_completed(&self) -> bool {
        self.state() == WorkState::Completed
    }

    /// Whether the payload panicked during execution.
    pub fn is_errored(&self) -> bool {
        self.state() == WorkState::Errored
    }

    /// Whether the item was discarded without running.
    pub fn is_cancelled(&self) -> bool {
        self.state() == WorkState::Cancelled
    }

    /// Whether the item has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Block until the item reaches a terminal state.
    ///
    /// Returns immediately if it already has.
    pub fn wait(&self) {
        let mut state = self.item.state.lock();
        while !state.is_terminal() {
            self.item.done.wait(&mut state);
        }
    }

    /// Block until the item reaches a terminal state or `timeout` elapses.
    ///
    /// Returns `true` if the item is terminal, `false` on timeout; on
    /// `false` the caller must re-check the state before acting.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.item.state.lock();
        while !state.is_terminal() {
            if self.item.done.wait_until(&mut state, deadline).timed_out() {
                return state.is_terminal();
            }
        }
        true
    }

    /// Take the payload out of the item; `None` if it was already consumed
    /// or dropped by cancellation.
    pub(crate) fn take_payload(&self) -> Option<Job> {
        self.item.payload.lock().take()
    }

    /// Attempt a state transition, refusing anything outside the legal
    /// paths. Returns whether the transition happened.
    ///
    /// All waiters are notified on success.
    pub(crate) fn transition(&self, to: WorkState) -> bool {
        let mut state = self.item.state.lock();
        let legal = matches!(
            (*state, to),
            (WorkState::Queued, WorkState::Running)
                | (WorkState::Queued, WorkState::Cancelled)
                | (WorkState::Running, WorkState::Completed)
                | (WorkState::Running, WorkState::Errored)
        );
        if legal {
            *state = to;
            self.item.done.notify_all();
        }
        legal
    }

    /// Cancel an item that never ran. Returns whether the item was still
    /// cancellable (i.e. in `Queued`).
    ///
    /// The unrun payload is dropped before waiters observe the terminal
    /// state, so resources captured by the closure are released by the time
    /// `wait()` returns.
    pub(crate) fn cancel(&self) -> bool {
        drop(self.item.payload.lock().take());
        self.transition(WorkState::Cancelled)
    }
}

impl fmt::Debug for WorkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkHandle").field("state", &self.state()).finish()
    }
}
