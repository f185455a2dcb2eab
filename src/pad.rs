//! Cache-line padding for producer/consumer metadata.
//!
//! With the `cache-coherent` feature (default) indices are wrapped in
//! [`crossbeam_utils::CachePadded`], which aligns to the target's cache line
//! (64 bytes on x86-64, 128 on aarch64-macos, per crossbeam's table). Without
//! it the wrapper is transparent and the indices pack tightly.

#[cfg(feature = "cache-coherent")]
pub(crate) use crossbeam_utils::CachePadded as Pad;

#[cfg(not(feature = "cache-coherent"))]
pub(crate) use packed::Pad;

#[cfg(not(feature = "cache-coherent"))]
mod packed {
    use core::ops::Deref;

    /// Transparent stand-in for `CachePadded` when padding is disabled.
    #[repr(transparent)]
    pub(crate) struct Pad<T>(T);

    impl<T> Pad<T> {
        pub(crate) const fn new(value: T) -> Self {
            Pad(value)
        }
    }

    impl<T> Deref for Pad<T> {
        type Target = T;

        fn deref(&self) -> &T {
            &self.0
        }
    }
}
