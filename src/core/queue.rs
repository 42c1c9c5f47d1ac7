//! Bounded blocking FIFO queue.
//!
//! This is the synchronization backbone of the pool: a single mutex around a
//! deque plus two condition variables (`not_full` for producers, `not_empty`
//! for consumers). Capacity bounding gives backpressure; a slow consumer side
//! throttles producers instead of growing memory without limit.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Shared queue state guarded by one mutex: the items and the closed bit are
/// read and written under the same lock, so a producer can never slip an
/// item past a close.
#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A thread-safe FIFO queue with an optional capacity bound.
///
/// `push` blocks while the queue is at capacity, `pop` blocks while it is
/// empty. A capacity of `0` means unbounded: `push` never blocks.
///
/// The queue can be closed for producers: a closed queue refuses further
/// pushes (handing the item back) and wakes any producer blocked on
/// capacity. Closing affects producers only; `pop` keeps serving remaining
/// items and still blocks when the queue is empty.
///
/// FIFO order is preserved: the N-th item pushed is the N-th item popped.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items; `0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Create an unbounded queue.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// The configured capacity bound; `0` means unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `item` at the tail, blocking while the queue is at capacity.
    ///
    /// Wakes one blocked consumer on success. Once the queue has been
    /// closed the push is refused and the item is handed back, including
    /// for producers that were already blocked on capacity when the close
    /// happened.
    pub fn push(&self, item: T) -> Result<(), T> {
        let cap = self.capacity;
        let mut state = self.state.lock();
        self.not_full.wait_while(&mut state, |state| {
            !state.closed && cap > 0 && state.items.len() >= cap
        });
        if state.closed {
            return Err(item);
        }
        state.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Append `item` at the tail without honoring the capacity bound or the
    /// closed bit.
    ///
    /// Used by the pool's shutdown protocol to inject poison items even when
    /// racing producers have refilled the queue; a capacity-respecting push
    /// could otherwise block forever once the workers are gone.
    pub(crate) fn force_push(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Remove and return the head item, blocking while the queue is empty.
    ///
    /// Wakes one blocked producer.
    pub fn pop(&self) -> T {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Atomically remove all currently queued items, invoking `callback` for
    /// each in FIFO order.
    ///
    /// All blocked producers are woken since the queue is empty afterwards.
    /// The callback runs outside the queue lock.
    pub fn drain<F>(&self, mut callback: F)
    where
        F: FnMut(T),
    {
        let drained = {
            let mut state = self.state.lock();
            let drained = std::mem::take(&mut state.items);
            self.not_full.notify_all();
            drained
        };
        for item in drained {
            callback(item);
        }
    }

    /// Close the queue for producers: every subsequent or currently blocked
    /// `push` is refused. Idempotent. Consumers are unaffected.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_full.notify_all();
    }

    /// Whether the queue has been closed for producers.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of queued items.
    ///
    /// A snapshot only: under concurrent mutation it may be stale the instant
    /// it returns. Callers must not act on it without re-checking under the
    /// lock they would use for the action itself.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue currently holds no items. Snapshot semantics as
    /// [`BoundedQueue::len`].
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Whether the queue is currently at capacity. Always `false` for an
    /// unbounded queue. Snapshot semantics as [`BoundedQueue::len`].
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.state.lock().items.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::unbounded();
        for i in 0..100 {
            queue.push(i).unwrap();
        }
        for i in 0..100 {
            assert_eq!(queue.pop(), i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshots() {
        let queue = BoundedQueue::new(2);
        assert!(queue.is_empty());
        assert!(!queue.is_full());

        queue.push(1).unwrap();
        assert_eq!(queue.len(), 1);
        queue.push(2).unwrap();
        assert!(queue.is_full());

        let unbounded = BoundedQueue::unbounded();
        unbounded.push(1).unwrap();
        assert!(!unbounded.is_full());
    }

    #[test]
    fn test_push_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(0).unwrap();

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let queue = Arc::clone(&queue);
            let pushed = Arc::clone(&pushed);
            thread::spawn(move || {
                queue.push(1).unwrap();
                pushed.store(true, Ordering::Release);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!pushed.load(Ordering::Acquire), "push should block on a full queue");

        assert_eq!(queue.pop(), 0);
        producer.join().unwrap();
        assert!(pushed.load(Ordering::Acquire));
        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_pop_blocks_when_empty() {
        let queue = Arc::new(BoundedQueue::<u32>::unbounded());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(42).unwrap();
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn test_capacity_never_exceeded_under_concurrent_producers() {
        let cap = 4;
        let queue = Arc::new(BoundedQueue::new(cap));
        let mut producers = Vec::new();
        for base in 0..8 {
            let queue = Arc::clone(&queue);
            producers.push(thread::spawn(move || {
                for i in 0..50 {
                    queue.push(base * 50 + i).unwrap();
                }
            }));
        }

        let mut consumed = 0;
        while consumed < 8 * 50 {
            assert!(queue.len() <= cap);
            queue.pop();
            consumed += 1;
        }
        for producer in producers {
            producer.join().unwrap();
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_preserves_fifo_and_empties() {
        let queue = BoundedQueue::unbounded();
        for i in 0..10 {
            queue.push(i).unwrap();
        }

        let mut seen = Vec::new();
        queue.drain(|item| seen.push(item));
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert!(queue.is_empty());

        // Draining an empty queue invokes nothing.
        queue.drain(|_: i32| panic!("queue should be empty"));
    }

    #[test]
    fn test_drain_wakes_blocked_producers() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(0).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(1).unwrap())
        };

        thread::sleep(Duration::from_millis(20));
        queue.drain(|_| {});
        producer.join().unwrap();
        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_push_refused_once_closed() {
        let queue = BoundedQueue::unbounded();
        queue.push(1).unwrap();
        queue.close();
        assert!(queue.is_closed());

        // The refused item is handed back.
        assert_eq!(queue.push(2), Err(2));

        // Items queued before the close are still consumable.
        assert_eq!(queue.pop(), 1);
    }

    #[test]
    fn test_close_wakes_blocked_producer_with_refusal() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(0).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(1))
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(producer.join().unwrap(), Err(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue = BoundedQueue::<u32>::new(1);
        queue.close();
        queue.close();
        assert_eq!(queue.push(7), Err(7));
    }
}
