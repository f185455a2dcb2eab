//! Bounded lock-free queues and buffers for inter-thread communication.
//!
//! `riptide` provides fixed-capacity, allocation-free primitives that work
//! anywhere from bare-metal microcontrollers to large shared-memory machines:
//!
//! - [`spsc::Queue`]: single-producer single-consumer FIFO
//! - [`spsc::RingBuffer`]: SPSC FIFO with bulk read/write/peek/skip
//! - [`spsc::BipartiteBuffer`]: SPSC buffer handing out contiguous spans for
//!   zero-copy transfers (DMA, sockets)
//! - [`mpmc::Queue`]: multi-producer multi-consumer FIFO
//! - [`spsc::PriorityQueue`] / [`mpmc::PriorityQueue`]: highest-priority-first
//!   layers over the queues above
//!
//! # Quick Start
//!
//! ```
//! use riptide::spsc;
//!
//! let (mut tx, mut rx) = spsc::Queue::<u64, 1024>::new();
//!
//! tx.push(42).unwrap();
//! assert_eq!(rx.pop(), Some(42));
//! ```
//!
//! # Guarantees
//!
//! Every operation completes in a bounded number of steps without mutual
//! exclusion. SPSC operations never loop at all; MPMC operations retry only
//! while racing other threads of the same role, never on a full or empty
//! queue. Capacity is a const generic, so no operation allocates and
//! misconfigured sizes fail to compile.
//!
//! # Feature Flags
//!
//! - `cache-coherent` (default): place producer and consumer metadata on
//!   separate cache lines to eliminate false sharing. Disable it to pack the
//!   indices tightly, which is the right trade on uniprocessors and small
//!   MCUs where the padding only wastes RAM.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, missing_debug_implementations)]

use core::fmt;

pub(crate) mod pad;

pub mod mpmc;
pub mod spsc;

/// Error returned when pushing to a full queue.
///
/// Contains the value that could not be pushed, returning ownership to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}
