//! Thread-safe FIFO with a bounded blocking `pop`.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// FIFO guarded by one mutex/condition-variable pair.
///
/// `push` never blocks and never fails. `pop` waits at most `timeout` for an
/// item and returns `None` when the wait expires. Each pushed item is
/// delivered to exactly one caller, in push order.
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    signal: Condvar,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
        }
    }

    /// Append to the tail and wake waiters.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.signal.notify_all();
    }

    /// Remove the head, waiting up to `timeout` for one to arrive.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        let (mut guard, _) = self
            .signal
            .wait_timeout_while(guard, timeout, |items| items.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        guard.pop_front()
    }

    /// Remove the head without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // Push/pop leave the deque consistent at every await point, so a
        // panic elsewhere cannot corrupt it.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .finish()
    }
}
