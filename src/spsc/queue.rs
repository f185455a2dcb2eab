//! SPSC bounded queue for single elements.
//!
//! One cell of the backing array is kept as a sentinel so a single pair of
//! indices can distinguish full from empty; the usable capacity is `N - 1`.
//! Capacity does not have to be a power of two, so index wrapping is a
//! compare instead of a mask.
//!
//! # Example
//!
//! ```
//! use riptide::spsc::Queue;
//!
//! let (mut tx, mut rx) = Queue::<u32, 8>::new();
//!
//! tx.push(42).unwrap();
//! assert_eq!(rx.pop(), Some(42));
//! assert_eq!(rx.pop(), None);
//! ```

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::pad::Pad;
use crate::Full;

/// A fixed-capacity SPSC queue.
///
/// `N` must be greater than 2 (enforced at compile time); `N - 1` elements
/// are usable. Created with [`Queue::new`], which returns the two role
/// handles.
pub struct Queue<T, const N: usize> {
    /// Read index. Owned by the consumer, read by the producer.
    r: Pad<AtomicUsize>,
    /// Write index. Owned by the producer, read by the consumer.
    w: Pad<AtomicUsize>,
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

// SAFETY: slot access is handed between the two roles by the release store
// of the owning index and the acquire load on the opposite side.
unsafe impl<T: Send, const N: usize> Send for Queue<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for Queue<T, N> {}

impl<T, const N: usize> Queue<T, N> {
    const _ASSERT_SIZE: () = assert!(N > 2, "queue capacity must be bigger than 2");

    /// Creates a queue, returning its producer and consumer halves.
    pub fn new() -> (Producer<T, N>, Consumer<T, N>) {
        let shared = Arc::new(Self::empty());
        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        )
    }

    pub(crate) fn empty() -> Self {
        let _ = Self::_ASSERT_SIZE;
        Self {
            r: Pad::new(AtomicUsize::new(0)),
            w: Pad::new(AtomicUsize::new(0)),
            // SAFETY: an array of `UnsafeCell<MaybeUninit<T>>` is valid in
            // any byte state.
            slots: unsafe { MaybeUninit::uninit().assume_init() },
        }
    }

    /// Next slot index, wrapping to 0 at `N`. A compare instead of a modulo
    /// because `N` is not required to be a power of two.
    #[inline(always)]
    const fn advance(index: usize) -> usize {
        let next = index + 1;
        if next == N {
            0
        } else {
            next
        }
    }

    #[inline(always)]
    fn slot(&self, index: usize) -> *mut T {
        debug_assert!(index < N);
        // SAFETY: index is in [0, N) for every caller.
        unsafe { UnsafeCell::raw_get(self.slots.as_ptr().add(index)).cast::<T>() }
    }

    /// Attempts to push an element.
    ///
    /// # Safety
    ///
    /// Caller must be the sole producer for the duration of the call.
    #[inline]
    pub(crate) unsafe fn raw_push(&self, value: T) -> Result<(), Full<T>> {
        let w = self.w.load(Ordering::Relaxed);
        let next = Self::advance(w);

        // Acquire pairs with the consumer's release store of `r`, so the
        // cell at `w` is known to have been drained before we overwrite it.
        if next == self.r.load(Ordering::Acquire) {
            return Err(Full(value));
        }

        // SAFETY: the cell at `w` is not visible to the consumer until the
        // release store below, and the full check above keeps it out of the
        // consumer's readable range.
        unsafe { self.slot(w).write(value) };

        self.w.store(next, Ordering::Release);
        Ok(())
    }

    /// Attempts to pop an element.
    ///
    /// # Safety
    ///
    /// Caller must be the sole consumer for the duration of the call.
    #[inline]
    pub(crate) unsafe fn raw_pop(&self) -> Option<T> {
        let r = self.r.load(Ordering::Relaxed);

        // Acquire pairs with the producer's release store of `w`, making the
        // cell contents visible before we read them.
        if r == self.w.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `r != w`, so the cell at `r` holds a value the producer
        // published and will not touch until we release it below.
        let value = unsafe { self.slot(r).read() };

        self.r.store(Self::advance(r), Ordering::Release);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        let w = self.w.load(Ordering::Relaxed);
        let r = self.r.load(Ordering::Relaxed);
        if w >= r {
            w - r
        } else {
            N - (r - w)
        }
    }
}

impl<T, const N: usize> Drop for Queue<T, N> {
    fn drop(&mut self) {
        let w = self.w.load(Ordering::Relaxed);
        let mut r = self.r.load(Ordering::Relaxed);

        // Drop whatever was pushed but never popped.
        while r != w {
            unsafe { self.slot(r).drop_in_place() };
            r = Self::advance(r);
        }
    }
}

impl<T, const N: usize> fmt::Debug for Queue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &(N - 1))
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// The producing half of an SPSC queue.
///
/// `Send` but operations take `&mut self`, so only one thread at a time can
/// push.
pub struct Producer<T, const N: usize> {
    shared: Arc<Queue<T, N>>,
}

impl<T, const N: usize> Producer<T, N> {
    /// Attempts to push an element into the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] holding the rejected value if the queue is full.
    ///
    /// # Example
    ///
    /// ```
    /// use riptide::spsc::Queue;
    ///
    /// let (mut tx, _rx) = Queue::<u32, 4>::new();
    ///
    /// tx.push(1).unwrap();
    /// tx.push(2).unwrap();
    /// tx.push(3).unwrap();
    ///
    /// // One cell is the sentinel: capacity is N - 1
    /// assert_eq!(tx.push(4), Err(riptide::Full(4)));
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        // SAFETY: `&mut self` makes us the sole producer.
        unsafe { self.shared.raw_push(value) }
    }

    /// Returns the usable capacity, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the number of elements currently queued.
    ///
    /// A snapshot; it may be stale by the time it is observed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const N: usize> fmt::Debug for Producer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// The consuming half of an SPSC queue.
pub struct Consumer<T, const N: usize> {
    shared: Arc<Queue<T, N>>,
}

impl<T, const N: usize> Consumer<T, N> {
    /// Attempts to pop the oldest element, returning `None` if the queue is
    /// empty.
    ///
    /// # Example
    ///
    /// ```
    /// use riptide::spsc::Queue;
    ///
    /// let (mut tx, mut rx) = Queue::<&str, 4>::new();
    ///
    /// assert_eq!(rx.pop(), None);
    /// tx.push("hello").unwrap();
    /// assert_eq!(rx.pop(), Some("hello"));
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` makes us the sole consumer.
        unsafe { self.shared.raw_pop() }
    }

    /// Returns the usable capacity, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the number of elements currently queued.
    ///
    /// A snapshot; it may be stale by the time it is observed.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const N: usize> fmt::Debug for Consumer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
