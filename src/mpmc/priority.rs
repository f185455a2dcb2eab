//! MPMC priority queue.
//!
//! One [`Queue`](crate::mpmc::Queue) per priority level; a pop drains the
//! highest non-empty priority. Any thread may push or pop.
//!
//! The ordering guarantee is the same as for the SPSC variant: a pop
//! observed every higher-priority sub-queue empty during its scan, so only
//! pushes that happened-before the pop are guaranteed to win over
//! lower-priority elements. Within one priority the order is FIFO.
//!
//! # Example
//!
//! ```
//! use riptide::mpmc::PriorityQueue;
//!
//! let q = PriorityQueue::<u64, 16, 4>::new();
//!
//! q.push(256, 2).unwrap();
//! q.push(1024, 0).unwrap();
//! q.push(512, 3).unwrap();
//!
//! assert_eq!(q.pop(), Some(512));
//! assert_eq!(q.pop(), Some(256));
//! assert_eq!(q.pop(), Some(1024));
//! ```

use std::fmt;

use crate::mpmc::queue::Queue;
use crate::Full;

/// A fixed-capacity MPMC queue with `P` priority levels.
///
/// Each level is an independent sub-queue of capacity `N` (a power of two
/// greater than 2), so a full level rejects pushes even while other levels
/// have room. The queue is `Sync`; share it by reference or `Arc`.
pub struct PriorityQueue<T, const N: usize, const P: usize> {
    queues: [Queue<T, N>; P],
}

impl<T: Copy, const N: usize, const P: usize> PriorityQueue<T, N, P> {
    const _ASSERT_PRIORITIES: () = assert!(P > 0, "at least one priority level is required");

    /// Creates an empty priority queue.
    pub fn new() -> Self {
        let _ = Self::_ASSERT_PRIORITIES;
        Self {
            queues: std::array::from_fn(|_| Queue::new()),
        }
    }

    /// Attempts to push an element at the given priority.
    ///
    /// Higher values are more urgent. May be called from any thread.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] holding the rejected value if the sub-queue for
    /// `priority` is full.
    ///
    /// # Panics
    ///
    /// Panics if `priority >= P`.
    #[inline]
    pub fn push(&self, value: T, priority: usize) -> Result<(), Full<T>> {
        assert!(priority < P, "priority out of range");
        self.queues[priority].push(value)
    }

    /// Attempts to pop the oldest element of the highest non-empty
    /// priority, returning `None` if every level is empty. May be called
    /// from any thread.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        for queue in self.queues.iter().rev() {
            if let Some(value) = queue.pop() {
                return Some(value);
            }
        }
        None
    }

    /// Returns the capacity of each priority level, `N`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the total number of elements across all priorities.
    ///
    /// A snapshot; it may be stale by the time it is observed.
    pub fn len(&self) -> usize {
        self.queues.iter().map(Queue::len).sum()
    }

    /// Returns `true` if every priority level is empty. A snapshot, like
    /// [`len`](PriorityQueue::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Copy, const N: usize, const P: usize> Default for PriorityQueue<T, N, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize, const P: usize> fmt::Debug for PriorityQueue<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("priorities", &P)
            .field("capacity_per_priority", &N)
            .finish_non_exhaustive()
    }
}
