//! SPSC ring buffer with bulk transfers.
//!
//! The same index protocol as [`crate::spsc::Queue`], generalized to move
//! `cnt` elements per call. Transfers are all-or-nothing: a write that does
//! not fit or a read that over-asks fails without moving anything. A
//! transfer that crosses the wrap point is two plain memcpys; capacity is
//! arbitrary, so there is no power-of-two masking.
//!
//! Element types must be `Copy`: slots are moved as raw bytes with no
//! ownership ceremony.
//!
//! # Example
//!
//! ```
//! use riptide::spsc::RingBuffer;
//!
//! let (mut wr, mut rd) = RingBuffer::<u8, 128>::new();
//!
//! wr.write(&[1, 2, 3]).unwrap();
//!
//! let mut buf = [0u8; 3];
//! rd.read(&mut buf).unwrap();
//! assert_eq!(buf, [1, 2, 3]);
//! ```

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::pad::Pad;

/// Error returned when a bulk transfer does not fit.
///
/// Contains the number of slots that were actually usable: free slots for a
/// failed write, occupied slots for a failed read, peek or skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooFewSlots(pub usize);

impl fmt::Display for TooFewSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "only {} slots available", self.0)
    }
}

impl std::error::Error for TooFewSlots {}

/// A fixed-capacity SPSC ring buffer for bulk transfers.
///
/// `N` must be greater than 2 (enforced at compile time); `N - 1` elements
/// are usable. Created with [`RingBuffer::new`], which returns the two role
/// handles.
pub struct RingBuffer<T, const N: usize> {
    /// Read index. Owned by the reader, read by the writer.
    r: Pad<AtomicUsize>,
    /// Write index. Owned by the writer, read by the reader.
    w: Pad<AtomicUsize>,
    slots: [UnsafeCell<MaybeUninit<T>>; N],
}

// SAFETY: cell ranges are handed between the roles by release/acquire on
// the indices, exactly as in the single-element queue.
unsafe impl<T: Send, const N: usize> Send for RingBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for RingBuffer<T, N> {}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    const _ASSERT_SIZE: () = assert!(N > 2, "ring buffer capacity must be bigger than 2");

    /// Creates a ring buffer, returning its writer and reader halves.
    pub fn new() -> (Writer<T, N>, Reader<T, N>) {
        let _ = Self::_ASSERT_SIZE;
        let shared = Arc::new(Self {
            r: Pad::new(AtomicUsize::new(0)),
            w: Pad::new(AtomicUsize::new(0)),
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

    /// Resets the buffer to empty.
    ///
    /// Taking both halves by `&mut` guarantees neither role is mid-call, so
    /// no synchronization is needed beyond the stores themselves.
    ///
    /// # Panics
    ///
    /// Panics if the halves belong to different buffers.
    pub fn clear(writer: &mut Writer<T, N>, reader: &mut Reader<T, N>) {
        assert!(
            Arc::ptr_eq(&writer.shared, &reader.shared),
            "clear called with halves of different buffers"
        );
        writer.shared.w.store(0, Ordering::Relaxed);
        writer.shared.r.store(0, Ordering::Relaxed);
    }

    #[inline(always)]
    fn base(&self) -> *mut T {
        UnsafeCell::raw_get(self.slots.as_ptr()).cast::<T>()
    }

    #[inline(always)]
    const fn calc_free(w: usize, r: usize) -> usize {
        if r > w {
            (r - w) - 1
        } else {
            (N - (w - r)) - 1
        }
    }

    #[inline(always)]
    const fn calc_available(w: usize, r: usize) -> usize {
        if w >= r {
            w - r
        } else {
            N - (r - w)
        }
    }
}

/// The writing half of an SPSC ring buffer.
pub struct Writer<T, const N: usize> {
    shared: Arc<RingBuffer<T, N>>,
}

impl<T: Copy, const N: usize> Writer<T, N> {
    /// Copies all of `src` into the buffer, or nothing at all.
    ///
    /// # Errors
    ///
    /// Returns [`TooFewSlots`] with the current free count if `src` does not
    /// fit.
    ///
    /// # Example
    ///
    /// ```
    /// use riptide::spsc::RingBuffer;
    ///
    /// let (mut wr, _rd) = RingBuffer::<u32, 4>::new();
    ///
    /// wr.write(&[1, 2, 3]).unwrap();
    /// assert!(wr.write(&[4]).is_err());
    /// ```
    pub fn write(&mut self, src: &[T]) -> Result<(), TooFewSlots> {
        let rb = &*self.shared;
        let mut w = rb.w.load(Ordering::Relaxed);
        let r = rb.r.load(Ordering::Acquire);

        let free = RingBuffer::<T, N>::calc_free(w, r);
        if free < src.len() {
            return Err(TooFewSlots(free));
        }

        let cnt = src.len();
        let base = rb.base();
        if w + cnt <= N {
            // SAFETY: [w, w + cnt) is in bounds and free; the reader cannot
            // observe it until the release store below.
            unsafe { ptr::copy_nonoverlapping(src.as_ptr(), base.add(w), cnt) };
            w += cnt;
            if w == N {
                w = 0;
            }
        } else {
            let linear_free = N - w;
            let remaining = cnt - linear_free;
            // SAFETY: as above, split across the wrap point.
            unsafe {
                ptr::copy_nonoverlapping(src.as_ptr(), base.add(w), linear_free);
                ptr::copy_nonoverlapping(src.as_ptr().add(linear_free), base, remaining);
            }
            w = remaining;
        }

        rb.w.store(w, Ordering::Release);
        Ok(())
    }

    /// Returns the number of free slots.
    ///
    /// Exact from the writer's point of view: only the reader can change it
    /// concurrently, and it only grows.
    pub fn free(&self) -> usize {
        let w = self.shared.w.load(Ordering::Relaxed);
        let r = self.shared.r.load(Ordering::Acquire);
        RingBuffer::<T, N>::calc_free(w, r)
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

/// The reading half of an SPSC ring buffer.
pub struct Reader<T, const N: usize> {
    shared: Arc<RingBuffer<T, N>>,
}

impl<T: Copy, const N: usize> Reader<T, N> {
    /// Fills all of `dst` from the buffer and consumes the elements, or does
    /// nothing at all.
    ///
    /// # Errors
    ///
    /// Returns [`TooFewSlots`] with the current occupancy if fewer than
    /// `dst.len()` elements are buffered.
    pub fn read(&mut self, dst: &mut [T]) -> Result<(), TooFewSlots> {
        let r = self.copy_out(dst)?;
        self.shared.r.store(r, Ordering::Release);
        Ok(())
    }

    /// Fills all of `dst` without consuming the elements.
    ///
    /// # Errors
    ///
    /// Returns [`TooFewSlots`] with the current occupancy if fewer than
    /// `dst.len()` elements are buffered.
    pub fn peek(&self, dst: &mut [T]) -> Result<(), TooFewSlots> {
        self.copy_out(dst)?;
        Ok(())
    }

    /// Consumes `cnt` elements without copying them.
    ///
    /// # Errors
    ///
    /// Returns [`TooFewSlots`] with the current occupancy if fewer than
    /// `cnt` elements are buffered.
    pub fn skip(&mut self, cnt: usize) -> Result<(), TooFewSlots> {
        let rb = &*self.shared;
        let mut r = rb.r.load(Ordering::Relaxed);
        let w = rb.w.load(Ordering::Acquire);

        let available = RingBuffer::<T, N>::calc_available(w, r);
        if available < cnt {
            return Err(TooFewSlots(available));
        }

        r += cnt;
        if r >= N {
            r -= N;
        }

        rb.r.store(r, Ordering::Release);
        Ok(())
    }

    /// Returns the number of buffered elements.
    ///
    /// Exact from the reader's point of view: only the writer can change it
    /// concurrently, and it only grows.
    pub fn available(&self) -> usize {
        let r = self.shared.r.load(Ordering::Relaxed);
        let w = self.shared.w.load(Ordering::Acquire);
        RingBuffer::<T, N>::calc_available(w, r)
    }

    /// Returns the usable capacity, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Copies `dst.len()` elements out without storing the new read index.
    /// Returns the advanced index for `read` to publish.
    fn copy_out(&self, dst: &mut [T]) -> Result<usize, TooFewSlots> {
        let rb = &*self.shared;
        let mut r = rb.r.load(Ordering::Relaxed);
        let w = rb.w.load(Ordering::Acquire);

        let available = RingBuffer::<T, N>::calc_available(w, r);
        if available < dst.len() {
            return Err(TooFewSlots(available));
        }

        let cnt = dst.len();
        let base = rb.base();
        if r + cnt <= N {
            // SAFETY: [r, r + cnt) holds elements the writer published
            // before the acquire-read of `w` above.
            unsafe { ptr::copy_nonoverlapping(base.add(r), dst.as_mut_ptr(), cnt) };
            r += cnt;
            if r == N {
                r = 0;
            }
        } else {
            let linear_available = N - r;
            let remaining = cnt - linear_available;
            // SAFETY: as above, split across the wrap point.
            unsafe {
                ptr::copy_nonoverlapping(base.add(r), dst.as_mut_ptr(), linear_available);
                ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(linear_available), remaining);
            }
            r = remaining;
        }

        Ok(r)
    }
}

impl<T, const N: usize> fmt::Debug for Reader<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").finish_non_exhaustive()
    }
}

impl<T, const N: usize> fmt::Debug for RingBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &(N - 1))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_and_available_empty() {
        let (wr, rd) = RingBuffer::<f32, 1024>::new();

        assert_eq!(wr.free(), 1023);
        assert_eq!(rd.available(), 0);
    }

    #[test]
    fn free_and_available_after_write() {
        let (mut wr, rd) = RingBuffer::<f32, 1024>::new();

        wr.write(&[2.71828; 120]).unwrap();

        assert_eq!(wr.free(), 1024 - 1 - 120);
        assert_eq!(rd.available(), 120);
    }

    #[test]
    fn fill_to_capacity() {
        let (mut wr, rd) = RingBuffer::<f32, 1024>::new();

        wr.write(&[2.71828; 1023]).unwrap();

        assert_eq!(wr.free(), 0);
        assert_eq!(rd.available(), 1023);
    }

    #[test]
    fn counts_after_wrapping_write() {
        let (mut wr, mut rd) = RingBuffer::<f64, 1024>::new();

        wr.write(&[123.123; 360]).unwrap();
        rd.skip(360).unwrap();

        wr.write(&[3.1416; 900]).unwrap();

        assert_eq!(wr.free(), 1024 - 1 - 900);
        assert_eq!(rd.available(), 900);
    }

    #[test]
    fn skip_and_skip_wrapping() {
        let (mut wr, mut rd) = RingBuffer::<i32, 100>::new();

        wr.write(&[-125; 60]).unwrap();
        rd.skip(60).unwrap();
        assert_eq!(wr.free(), 99);

        wr.write(&[-125; 60]).unwrap();
        rd.skip(60).unwrap();
        assert_eq!(wr.free(), 99);
    }

    #[test]
    fn skip_empty() {
        let (_wr, mut rd) = RingBuffer::<i32, 100>::new();
        assert_eq!(rd.skip(1), Err(TooFewSlots(0)));
    }

    #[test]
    fn write_without_enough_space() {
        let (mut wr, _rd) = RingBuffer::<u8, 512>::new();

        wr.write(&[0xE5; 320]).unwrap();
        assert_eq!(wr.write(&[0xE5; 320]), Err(TooFewSlots(191)));
    }

    #[test]
    fn round_trip() {
        let (mut wr, mut rd) = RingBuffer::<u8, 512>::new();
        let src: Vec<u8> = (0..=255).collect();

        wr.write(&src).unwrap();

        let mut dst = [0u8; 256];
        rd.read(&mut dst).unwrap();
        assert_eq!(&dst[..], &src[..]);
    }

    #[test]
    fn round_trip_wrapping() {
        let (mut wr, mut rd) = RingBuffer::<u16, 100>::new();

        wr.write(&[7; 60]).unwrap();
        rd.skip(60).unwrap();

        // This write wraps around the end of the backing array
        let src: Vec<u16> = (0..80).collect();
        wr.write(&src).unwrap();

        let mut dst = [0u16; 80];
        rd.read(&mut dst).unwrap();
        assert_eq!(&dst[..], &src[..]);
    }

    #[test]
    fn peek_does_not_consume() {
        let (mut wr, mut rd) = RingBuffer::<u8, 16>::new();

        wr.write(&[1, 2, 3]).unwrap();

        let mut dst = [0u8; 3];
        rd.peek(&mut dst).unwrap();
        assert_eq!(dst, [1, 2, 3]);
        assert_eq!(rd.available(), 3);

        rd.read(&mut dst).unwrap();
        assert_eq!(dst, [1, 2, 3]);
        assert_eq!(rd.available(), 0);
    }

    #[test]
    fn read_more_than_available() {
        let (mut wr, mut rd) = RingBuffer::<u8, 16>::new();

        wr.write(&[1, 2, 3]).unwrap();

        let mut dst = [0u8; 4];
        assert_eq!(rd.read(&mut dst), Err(TooFewSlots(3)));
    }

    #[test]
    fn clear_resets_counts() {
        let (mut wr, mut rd) = RingBuffer::<u8, 64>::new();

        wr.write(&[9; 40]).unwrap();
        RingBuffer::clear(&mut wr, &mut rd);

        assert_eq!(rd.available(), 0);
        assert_eq!(wr.free(), 63);
    }

    #[test]
    #[should_panic(expected = "different buffers")]
    fn clear_rejects_mismatched_halves() {
        let (mut wr, _rd) = RingBuffer::<u8, 64>::new();
        let (_wr2, mut rd2) = RingBuffer::<u8, 64>::new();

        RingBuffer::clear(&mut wr, &mut rd2);
    }

    #[test]
    fn cross_thread_streaming() {
        use std::thread;

        let (mut wr, mut rd) = RingBuffer::<u32, 1024>::new();
        const TOTAL: u32 = 50_000;
        const CHUNK: usize = 16;

        let producer = thread::spawn(move || {
            let mut next = 0u32;
            while next < TOTAL {
                let chunk: Vec<u32> = (next..next + CHUNK as u32).collect();
                while wr.write(&chunk).is_err() {
                    std::hint::spin_loop();
                }
                next += CHUNK as u32;
            }
        });

        let mut expected = 0u32;
        let mut buf = [0u32; CHUNK];
        while expected < TOTAL {
            if rd.read(&mut buf).is_ok() {
                for v in buf {
                    assert_eq!(v, expected);
                    expected += 1;
                }
            } else {
                std::hint::spin_loop();
            }
        }

        producer.join().unwrap();
    }
}
