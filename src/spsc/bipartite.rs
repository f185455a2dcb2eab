//! SPSC bipartite buffer: contiguous grants over a ring.
//!
//! A ring buffer hands back data in up to two pieces once the indices wrap.
//! That is useless for consumers that need one flat region — DMA engines,
//! `writev`-less sockets, parsers working on a borrowed slice. The
//! bipartite buffer trades a little capacity bookkeeping for strictly
//! contiguous access: the writer asks for a linear span of `n` slots and
//! gets either all of them in one piece or nothing, possibly at the front
//! of the buffer before the occupied tail has drained. A third index marks
//! where the valid tail region ends so the reader can finish draining it
//! before following the writer to the front.
//!
//! Grants borrow their half mutably, so acquire and release cannot be
//! mispaired: committing consumes the grant, and a dropped grant simply
//! abandons the reservation.
//!
//! # Example
//!
//! ```
//! use riptide::spsc::BipartiteBuffer;
//!
//! let (mut wr, mut rd) = BipartiteBuffer::<u32, 64>::new();
//!
//! let mut grant = wr.grant(8).unwrap();
//! for slot in grant.iter_mut() {
//!     slot.write(7);
//! }
//! // SAFETY: all 8 slots were just initialized
//! unsafe { grant.commit(8) };
//!
//! let view = rd.read().unwrap();
//! assert_eq!(&*view, &[7; 8]);
//! view.release(8);
//! ```

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::slice;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::pad::Pad;

/// A fixed-capacity SPSC buffer handing out contiguous spans.
///
/// `N` must be greater than 2 (enforced at compile time); `N - 1` slots are
/// usable. Created with [`BipartiteBuffer::new`], which returns the two
/// role handles.
pub struct BipartiteBuffer<T, const N: usize> {
    /// Read index. Owned by the reader, read by the writer.
    r: Pad<AtomicUsize>,
    /// Write index. Owned by the writer, read by the reader.
    w: Pad<AtomicUsize>,
    /// Invalidate index: end of the valid region that survived the last
    /// writer wrap. Owned by the writer, read by the reader.
    i: Pad<AtomicUsize>,
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

// SAFETY: span ownership is handed between the roles by release/acquire on
// `w` and `r`; `i` rides along under the same release store of `w`.
unsafe impl<T: Send, const N: usize> Send for BipartiteBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for BipartiteBuffer<T, N> {}

impl<T: Copy, const N: usize> BipartiteBuffer<T, N> {
    const _ASSERT_SIZE: () = assert!(N > 2, "bipartite buffer capacity must be bigger than 2");

    /// Creates a bipartite buffer, returning its writer and reader halves.
    pub fn new() -> (Writer<T, N>, Reader<T, N>) {
        let _ = Self::_ASSERT_SIZE;
        let shared = Arc::new(Self {
            r: Pad::new(AtomicUsize::new(0)),
            w: Pad::new(AtomicUsize::new(0)),
            i: Pad::new(AtomicUsize::new(0)),
            // SAFETY: an array of `UnsafeCell<MaybeUninit<T>>` is valid in
            // any byte state.
            slots: unsafe { MaybeUninit::uninit().assume_init() },
        });
        (
            Writer {
                shared: Arc::clone(&shared),
            },
            Reader { shared },
        )
    }

    #[inline(always)]
    fn base(&self) -> *mut MaybeUninit<T> {
        UnsafeCell::raw_get(self.slots.as_ptr())
    }

    #[inline(always)]
    const fn calc_free(w: usize, r: usize) -> usize {
        if r > w {
            (r - w) - 1
        } else {
            (N - (w - r)) - 1
        }
    }
}

impl<T, const N: usize> fmt::Debug for BipartiteBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BipartiteBuffer")
            .field("capacity", &(N - 1))
            .finish_non_exhaustive()
    }
}

/// The writing half of a bipartite buffer.
pub struct Writer<T, const N: usize> {
    shared: Arc<BipartiteBuffer<T, N>>,
}

impl<T: Copy, const N: usize> Writer<T, N> {
    /// Reserves a contiguous span of exactly `count` slots.
    ///
    /// The span is taken after the current write position when it fits
    /// before the end of the backing array, otherwise at the front of the
    /// array, in which case the not-yet-drained tail stays readable until
    /// the reader catches up. Returns `None` when no linear region of
    /// `count` slots exists.
    ///
    /// The writer does not have to fill the whole span; committing fewer
    /// elements (or dropping the grant) is allowed.
    pub fn grant(&mut self, count: usize) -> Option<WriteGrant<'_, T, N>> {
        let bb = &*self.shared;
        let w = bb.w.load(Ordering::Relaxed);
        // Pairs with the reader's release store of `r`: everything the
        // reader drained is really free.
        let r = bb.r.load(Ordering::Acquire);

        let free = BipartiteBuffer::<T, N>::calc_free(w, r);
        let linear_free = free.min(N - w);

        // Prefer the region up to the end of the array
        if count <= linear_free {
            return Some(WriteGrant {
                writer: self,
                start: w,
                len: count,
                wrapped: false,
            });
        }

        // Otherwise try the region at the front, before the read index
        if count <= free - linear_free {
            return Some(WriteGrant {
                writer: self,
                start: 0,
                len: count,
                wrapped: true,
            });
        }

        None
    }

    /// Returns the usable capacity, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

impl<T, const N: usize> fmt::Debug for Writer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer").finish_non_exhaustive()
    }
}

/// A reserved contiguous span of uninitialized slots.
///
/// Derefs to `[MaybeUninit<T>]` of the requested length. The span is owned
/// exclusively by the writer until [`commit`](WriteGrant::commit) publishes
/// it or the grant is dropped.
pub struct WriteGrant<'a, T: Copy, const N: usize> {
    writer: &'a mut Writer<T, N>,
    start: usize,
    len: usize,
    /// The span was taken at the front of the array, skipping the region
    /// between the write index and the end.
    wrapped: bool,
}

impl<T: Copy, const N: usize> WriteGrant<'_, T, N> {
    /// Publishes the first `written` elements of the span to the reader.
    ///
    /// If the grant skipped to the front of the array, the region between
    /// the old write index and the end of the array is marked as the tail
    /// the reader must drain before wrapping.
    ///
    /// # Panics
    ///
    /// Panics if `written` exceeds the granted length.
    ///
    /// # Safety
    ///
    /// The first `written` slots of the span must have been initialized;
    /// the reader will hand them out as `&[T]`.
    pub unsafe fn commit(self, written: usize) {
        assert!(written <= self.len, "committed more than was granted");

        let bb = &*self.writer.shared;
        let mut w = bb.w.load(Ordering::Relaxed);
        let mut i = bb.i.load(Ordering::Relaxed);

        // The grant skipped to the front: everything before the old write
        // index stays valid, everything after it is dead.
        if self.wrapped {
            i = w;
            w = 0;
        }

        w += written;
        debug_assert!(w <= N);

        // Writing past the previous invalidate mark revalidates those cells
        if w > i {
            i = w;
        }

        // A write ending exactly at the array end still raised `i` above,
        // which is what keeps the span readable after this normalization.
        if w == N {
            w = 0;
        }

        // `i` only needs to be ordered by the release store of `w` below.
        bb.i.store(i, Ordering::Relaxed);
        bb.w.store(w, Ordering::Release);
    }
}

impl<T: Copy, const N: usize> Deref for WriteGrant<'_, T, N> {
    type Target = [MaybeUninit<T>];

    fn deref(&self) -> &Self::Target {
        // SAFETY: [start, start + len) is in bounds and owned by this grant.
        unsafe { slice::from_raw_parts(self.writer.shared.base().add(self.start), self.len) }
    }
}

impl<T: Copy, const N: usize> DerefMut for WriteGrant<'_, T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: as for Deref; `&mut self` gives unique access.
        unsafe { slice::from_raw_parts_mut(self.writer.shared.base().add(self.start), self.len) }
    }
}

impl<T: Copy, const N: usize> fmt::Debug for WriteGrant<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGrant")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// The reading half of a bipartite buffer.
pub struct Reader<T, const N: usize> {
    shared: Arc<BipartiteBuffer<T, N>>,
}

impl<T: Copy, const N: usize> Reader<T, N> {
    /// Borrows the longest available contiguous span of published elements.
    ///
    /// Returns `None` when nothing is readable. After the writer has
    /// wrapped, this first returns the remaining tail region; once that is
    /// drained it follows the writer to the front of the array.
    pub fn read(&mut self) -> Option<ReadGrant<'_, T, N>> {
        let bb = &*self.shared;
        let r = bb.r.load(Ordering::Relaxed);
        // Pairs with the writer's release store of `w`: the cells below and
        // the value of `i` are visible.
        let w = bb.w.load(Ordering::Acquire);

        if r == w {
            return None;
        }

        // Straight case: unread data between the two indices
        if r < w {
            return Some(ReadGrant {
                reader: self,
                start: r,
                len: w - r,
                wrapped: false,
            });
        }

        let i = bb.i.load(Ordering::Relaxed);

        // The tail is drained; follow the writer to the front
        if r == i {
            if w == 0 {
                return None;
            }
            return Some(ReadGrant {
                reader: self,
                start: 0,
                len: w,
                wrapped: true,
            });
        }

        // Still draining the tail the writer left behind when it wrapped
        Some(ReadGrant {
            reader: self,
            start: r,
            len: i - r,
            wrapped: false,
        })
    }

    /// Returns the usable capacity, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }
}

impl<T, const N: usize> fmt::Debug for Reader<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
}

/// A borrowed contiguous span of published elements.
///
/// Derefs to `[T]`. The elements stay in the buffer until
/// [`release`](ReadGrant::release) consumes them; dropping the grant
/// consumes nothing.
pub struct ReadGrant<'a, T: Copy, const N: usize> {
    reader: &'a mut Reader<T, N>,
    start: usize,
    len: usize,
    /// The span is at the front of the array; releasing must wrap the read
    /// index there first.
    wrapped: bool,
}

impl<T: Copy, const N: usize> ReadGrant<'_, T, N> {
    /// Frees the first `read` elements of the span for reuse by the writer.
    ///
    /// # Panics
    ///
    /// Panics if `read` exceeds the span length.
    pub fn release(self, read: usize) {
        assert!(read <= self.len, "released more than was readable");

        let bb = &*self.reader.shared;
        let mut r = bb.r.load(Ordering::Relaxed);

        if self.wrapped {
            r = 0;
        }

        r += read;
        debug_assert!(r <= N);
        if r == N {
            r = 0;
        }

        bb.r.store(r, Ordering::Release);
    }
}

impl<T: Copy, const N: usize> Deref for ReadGrant<'_, T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        // SAFETY: [start, start + len) holds elements the writer committed;
        // commit's contract guarantees they are initialized.
        unsafe {
            slice::from_raw_parts(
                self.reader.shared.base().add(self.start).cast::<T>(),
                self.len,
            )
        }
    }
}

impl<T: Copy + fmt::Debug, const N: usize> fmt::Debug for ReadGrant<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGrant")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
