//! Multi-producer multi-consumer (MPMC) primitives.
//!
//! Any number of threads may push and pop concurrently through a shared
//! reference; slot handoff is arbitrated by per-slot generation counters
//! instead of locks. Operations are lock-free: a thread only ever retries
//! while another thread of the same role is making progress, and a full or
//! empty queue reports failure instead of spinning.
//!
//! ```
//! use riptide::mpmc::Queue;
//!
//! let q = Queue::<u32, 8>::new();
//!
//! q.push(1).unwrap();
//! q.push(2).unwrap();
//!
//! assert_eq!(q.pop(), Some(1));
//! assert_eq!(q.pop(), Some(2));
//! ```

pub mod priority;
pub mod queue;

pub use priority::PriorityQueue;
pub use queue::Queue;
