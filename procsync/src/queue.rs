//! An unbounded FIFO queue for handing work between execution units.
//!
//! See [`WorkQueue`].
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, PoisonError};

use tracing::trace;

use crate::sync::{Condvar, Mutex, MutexGuard};
use crate::{Error, Result};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

/// An unbounded, multi-producer, multi-consumer FIFO queue.
///
/// Items are dequeued in the order in which their enqueue operations completed,
/// regardless of which unit enqueued them.
///
/// [`is_empty`](WorkQueue::is_empty) and [`len`](WorkQueue::len) are
/// snapshots, not synchronization: another unit may take the last item between
/// a check and a following [`try_dequeue`](WorkQueue::try_dequeue).
///
/// Closing the queue rejects further items, but everything already enqueued is
/// still handed out. Consumers blocked in
/// [`dequeue_blocking`](WorkQueue::dequeue_blocking) wake up with
/// [`Error::QueueClosed`] once the queue is both closed and drained.
///
/// # Examples
///
/// ```
/// use procsync::{unit, WorkQueue};
///
/// let queue = WorkQueue::new();
///
/// let producer = {
///     let queue = queue.clone();
///     unit::spawn("producer", move || -> procsync::Result<()> {
///         for i in 0..5 {
///             queue.enqueue(i)?;
///         }
///         queue.close();
///         Ok(())
///     })
/// };
///
/// let mut consumed = Vec::new();
/// while let Ok(item) = queue.dequeue_blocking() {
///     consumed.push(item);
/// }
///
/// producer.join().unwrap().unwrap();
/// assert_eq!(consumed, vec![0, 1, 2, 3, 4]);
/// ```
pub struct WorkQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> WorkQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: VecDeque::new(),
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item to the tail of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the queue has been closed. The item is
    /// dropped.
    pub fn enqueue(&self, item: T) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::QueueClosed);
        }
        state.items.push_back(item);
        trace!(len = state.items.len(), "enqueued item");
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Removes and returns the head of the queue, waiting for an item if the
    /// queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the queue is closed and has no items
    /// left.
    pub fn dequeue_blocking(&self) -> Result<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                trace!(len = state.items.len(), "dequeued item");
                return Ok(item);
            }
            if state.closed {
                return Err(Error::QueueClosed);
            }
            state = self
                .shared
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the head of the queue, or `None` if it is empty.
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Returns whether the queue held no items at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the number of items the queue held at the time of the call.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Stops the queue from accepting items and wakes every blocked consumer.
    ///
    /// Closing an already closed queue has no effect.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            trace!(remaining = state.items.len(), "closed queue");
        }
        drop(state);
        self.shared.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("WorkQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
