//! MPMC bounded queue.
//!
//! Each slot carries an access counter that records every push and pop ever
//! performed on it. The counter's parity is the occupancy state (even =
//! empty, odd = full) and its value divided by two is the revolution number,
//! so a producer can tell "empty, but from a lap I haven't reached yet"
//! apart from "empty and mine to fill". Producers race each other on a
//! global monotonic write counter to claim slots, consumers race on a read
//! counter; the two roles never contend on the same atomic except the slot
//! handshake itself.
//!
//! All `N` slots are usable. `N` must be a power of two greater than 2 so
//! that slot indices and revolution numbers survive counter wraparound.
//!
//! # Example
//!
//! ```
//! use riptide::mpmc::Queue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let q = Arc::new(Queue::<u64, 64>::new());
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let q = Arc::clone(&q);
//!         thread::spawn(move || {
//!             while q.push(t).is_err() {
//!                 std::hint::spin_loop();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//! assert_eq!(q.len(), 4);
//! ```

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::Backoff;

use crate::pad::Pad;
use crate::Full;

struct Slot<T> {
    value: UnsafeCell<MaybeUninit<T>>,
    /// Counts every push and pop performed on this slot. Even (`2R`): empty,
    /// ready for the R-th push. Odd (`2R + 1`): full, ready for the R-th pop.
    access: AtomicUsize,
}

/// A fixed-capacity MPMC queue.
///
/// `N` must be a power of two greater than 2 (enforced at compile time);
/// all `N` slots are usable. The queue is `Sync`: share it by reference (or
/// `Arc`) and call [`push`](Queue::push)/[`pop`](Queue::pop) from any
/// thread.
pub struct Queue<T, const N: usize> {
    slots: [Slot<T>; N],
    /// Monotonic count of claimed pops.
    r_count: Pad<AtomicUsize>,
    /// Monotonic count of claimed pushes.
    w_count: Pad<AtomicUsize>,
}

// SAFETY: slot access is serialized by the counter protocol; winning the
// CAS on w_count/r_count grants exclusive slot access until the release
// store of the slot counter.
unsafe impl<T: Send, const N: usize> Sync for Queue<T, N> {}

impl<T: Copy, const N: usize> Queue<T, N> {
    const _ASSERT_SIZE: () = assert!(
        N > 2 && N.is_power_of_two(),
        "queue capacity must be a power of two bigger than 2"
    );

    const MASK: usize = N - 1;

    /// Clips slot push/pop counts to the range of revolution numbers, which
    /// keeps the turn check correct through counter wraparound.
    const REV_MASK: usize = usize::MAX / N;

    /// Creates an empty queue.
    pub fn new() -> Self {
        let _ = Self::_ASSERT_SIZE;
        Self {
            slots: std::array::from_fn(|_| Slot {
                value: UnsafeCell::new(MaybeUninit::uninit()),
                access: AtomicUsize::new(0),
            }),
            r_count: Pad::new(AtomicUsize::new(0)),
            w_count: Pad::new(AtomicUsize::new(0)),
        }
    }

    /// Attempts to push an element.
    ///
    /// May be called from any thread. Fails only when the queue is full at
    /// the claimed slot; contention with other producers is retried
    /// internally.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] holding the rejected value if the queue is full.
    pub fn push(&self, value: T) -> Result<(), Full<T>> {
        let backoff = Backoff::new();
        let mut w_count = self.w_count.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[w_count & Self::MASK];

            // Acquire pairs with the release store of the pop that emptied
            // this slot for the current revolution.
            let access = slot.access.load(Ordering::Acquire);
            let push_count = access.wrapping_add(1) / 2;
            let pop_count = access / 2;

            // Odd count: the slot still holds an unpopped value
            if push_count > pop_count {
                return Err(Full(value));
            }

            let revolution = (w_count / N) & Self::REV_MASK;
            if revolution == (push_count & Self::REV_MASK) {
                // Our turn: claim the slot by bumping the write counter
                match self.w_count.compare_exchange_weak(
                    w_count,
                    w_count.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the counter race grants exclusive
                        // access to the slot until the release store below.
                        unsafe { slot.value.get().cast::<T>().write(value) };
                        slot.access.store(access.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => {
                        w_count = current;
                        backoff.spin();
                    }
                }
            } else {
                // Another producer advanced past us while we were reading
                w_count = self.w_count.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Attempts to pop the oldest element, returning `None` if the queue is
    /// empty.
    ///
    /// May be called from any thread. Contention with other consumers is
    /// retried internally.
    pub fn pop(&self) -> Option<T> {
        let backoff = Backoff::new();
        let mut r_count = self.r_count.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[r_count & Self::MASK];

            // Acquire pairs with the release store of the push that filled
            // this slot.
            let access = slot.access.load(Ordering::Acquire);
            let push_count = access.wrapping_add(1) / 2;
            let pop_count = access / 2;

            // Even count: slot empty
            if pop_count == push_count {
                return None;
            }

            let revolution = (r_count / N) & Self::REV_MASK;
            if revolution == (pop_count & Self::REV_MASK) {
                // Our turn: claim the slot by bumping the read counter
                match self.r_count.compare_exchange_weak(
                    r_count,
                    r_count.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the counter race grants exclusive
                        // access to the slot, and the acquire load above saw
                        // the push that initialized it.
                        let value = unsafe { slot.value.get().cast::<T>().read() };
                        slot.access.store(access.wrapping_add(1), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => {
                        r_count = current;
                        backoff.spin();
                    }
                }
            } else {
                // Another consumer advanced past us while we were reading
                r_count = self.r_count.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Returns the capacity, `N`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of elements currently queued.
    ///
    /// A snapshot of the claim counters; it may be stale by the time it is
    /// observed and can transiently include claims still being published.
    pub fn len(&self) -> usize {
        let w = self.w_count.load(Ordering::Relaxed);
        let r = self.r_count.load(Ordering::Relaxed);
        w.wrapping_sub(r)
    }

    /// Returns `true` if the queue is empty. A snapshot, like [`len`](Queue::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the queue is full. A snapshot, like [`len`](Queue::len).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }
}

impl<T: Copy, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> fmt::Debug for Queue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &N)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
