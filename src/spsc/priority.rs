//! SPSC priority queue.
//!
//! One [`Queue`](crate::spsc::Queue) per priority level; a pop drains the
//! highest non-empty priority. Since each sub-queue keeps its own index
//! pair, pushing and popping stay CAS-free and a pop costs at most `P`
//! empty checks.
//!
//! A pop that returns a priority-`p` element observed every higher
//! sub-queue empty during its scan. A push to a higher priority that was
//! not yet published when the scan passed it can therefore be overtaken by
//! a lower-priority element — ordering across priorities is exact only for
//! pushes that happened-before the pop. Within one priority the order is
//! FIFO.
//!
//! # Example
//!
//! ```
//! use riptide::spsc::PriorityQueue;
//!
//! let (mut tx, mut rx) = PriorityQueue::<u64, 10, 4>::new();
//!
//! tx.push(256, 2).unwrap();
//! tx.push(1024, 0).unwrap();
//! tx.push(512, 3).unwrap();
//!
//! assert_eq!(rx.pop(), Some(512));
//! assert_eq!(rx.pop(), Some(256));
//! assert_eq!(rx.pop(), Some(1024));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::spsc::queue::Queue;
use crate::Full;

/// A fixed-capacity SPSC queue with `P` priority levels.
///
/// Each level is an independent sub-queue of capacity `N` (usable `N - 1`),
/// so a full level rejects pushes even while other levels have room.
/// Created with [`PriorityQueue::new`], which returns the two role handles.
pub struct PriorityQueue<T, const N: usize, const P: usize> {
    queues: [Queue<T, N>; P],
}

impl<T: Copy, const N: usize, const P: usize> PriorityQueue<T, N, P> {
    const _ASSERT_PRIORITIES: () = assert!(P > 0, "at least one priority level is required");

    /// Creates a priority queue, returning its producer and consumer halves.
    pub fn new() -> (Producer<T, N, P>, Consumer<T, N, P>) {
        let _ = Self::_ASSERT_PRIORITIES;
        let shared = Arc::new(Self {
            queues: std::array::from_fn(|_| Queue::empty()),
        });
        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        )
    }

    fn len(&self) -> usize {
        self.queues.iter().map(Queue::len).sum()
    }
}

impl<T, const N: usize, const P: usize> fmt::Debug for PriorityQueue<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("priorities", &P)
            .field("capacity_per_priority", &(N - 1))
            .finish_non_exhaustive()
    }
}

/// The producing half of an SPSC priority queue.
pub struct Producer<T, const N: usize, const P: usize> {
    shared: Arc<PriorityQueue<T, N, P>>,
}

impl<T: Copy, const N: usize, const P: usize> Producer<T, N, P> {
    /// Attempts to push an element at the given priority.
    ///
    /// Higher values are more urgent.
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
    pub fn push(&mut self, value: T, priority: usize) -> Result<(), Full<T>> {
        assert!(priority < P, "priority out of range");
        // SAFETY: `&mut self` makes us the sole producer of every sub-queue.
        unsafe { self.shared.queues[priority].raw_push(value) }
    }

    /// Returns the usable capacity of each priority level, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the total number of elements across all priorities.
    ///
    /// A snapshot; it may be stale by the time it is observed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if every priority level is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const N: usize, const P: usize> fmt::Debug for Producer<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("priorities", &P)
            .finish_non_exhaustive()
    }
}

/// The consuming half of an SPSC priority queue.
pub struct Consumer<T, const N: usize, const P: usize> {
    shared: Arc<PriorityQueue<T, N, P>>,
}

impl<T: Copy, const N: usize, const P: usize> Consumer<T, N, P> {
    /// Attempts to pop the oldest element of the highest non-empty
    /// priority, returning `None` if every level is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        for queue in self.shared.queues.iter().rev() {
            // SAFETY: `&mut self` makes us the sole consumer of every
            // sub-queue.
            if let Some(value) = unsafe { queue.raw_pop() } {
                return Some(value);
            }
        }
        None
    }

    /// Returns the usable capacity of each priority level, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the total number of elements across all priorities.
    ///
    /// A snapshot; it may be stale by the time it is observed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if every priority level is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const N: usize, const P: usize> fmt::Debug for Consumer<T, N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("priorities", &P)
            .finish_non_exhaustive()
    }
}
