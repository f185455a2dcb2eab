//! Single-producer single-consumer (SPSC) primitives.
//!
//! These are the fastest variants: each side owns exactly one atomic index,
//! the hot path is a pair of loads and a release store, and no operation
//! ever performs a compare-and-swap.
//!
//! Construction splits each primitive into two halves, one per role:
//!
//! ```
//! use riptide::spsc::Queue;
//!
//! let (mut tx, mut rx) = Queue::<u64, 16>::new();
//!
//! tx.push(1).unwrap();
//! tx.push(2).unwrap();
//!
//! assert_eq!(rx.pop(), Some(1));
//! assert_eq!(rx.pop(), Some(2));
//! ```
//!
//! The halves are `Send` but their operations take `&mut self`, so the
//! single-producer/single-consumer contract is enforced by the borrow
//! checker rather than by documentation.

pub mod bipartite;
pub mod priority;
pub mod queue;
pub mod ring_buffer;

pub use bipartite::BipartiteBuffer;
pub use priority::PriorityQueue;
pub use queue::Queue;
pub use ring_buffer::RingBuffer;
