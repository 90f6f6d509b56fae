//! Low-level primitives for obtaining and returning system memory.
//!
//! This is one of the two modules permitted to use `unsafe`. Every block
//! is allocated with [`SEGMENT_ALIGNMENT`] so that the first bump in a
//! fresh segment satisfies the strongest alignment the zone promises.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::segment::SEGMENT_ALIGNMENT;

/// An owned, uninitialised block of system memory.
///
/// Freed exactly once, on drop. The block never moves, so pointers into it
/// stay valid for as long as the `RawBlock` is alive.
pub(crate) struct RawBlock {
    start: NonNull<u8>,
    layout: Layout,
}

impl RawBlock {
    /// Obtain `capacity` bytes from the system allocator.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or cannot form a valid layout. Aborts
    /// through [`alloc::handle_alloc_error`] if the allocator is exhausted.
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "zone segments must have non-zero capacity");
        let layout = match Layout::from_size_align(capacity, SEGMENT_ALIGNMENT) {
            Ok(layout) => layout,
            Err(_) => panic!("zone segment of {capacity} bytes exceeds the address space"),
        };
        // SAFETY: `layout` has non-zero size, checked above.
        let ptr = unsafe { alloc::alloc(layout) };
        let start = match NonNull::new(ptr) {
            Some(start) => start,
            None => alloc::handle_alloc_error(layout),
        };
        Self { start, layout }
    }

    /// First byte of the block.
    pub(crate) fn start(&self) -> NonNull<u8> {
        self.start
    }

    /// Size of the block in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        // SAFETY: `start` came from `alloc::alloc` with exactly this layout
        // and is released only here.
        unsafe { alloc::dealloc(self.start.as_ptr(), self.layout) }
    }
}

/// A non-null, [`SEGMENT_ALIGNMENT`]-aligned address for zero-length
/// allocations made before any segment exists.
///
/// Never dereferenced; carries no provenance.
pub(crate) fn dangling() -> NonNull<u8> {
    // SAFETY: SEGMENT_ALIGNMENT is a non-zero constant.
    unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(SEGMENT_ALIGNMENT)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_segment_aligned() {
        let block = RawBlock::new(100);
        assert_eq!(block.start().as_ptr().addr() % SEGMENT_ALIGNMENT, 0);
        assert_eq!(block.len(), 100);
    }

    #[test]
    fn dangling_is_aligned_and_non_null() {
        let ptr = dangling();
        assert_eq!(ptr.as_ptr().addr(), SEGMENT_ALIGNMENT);
    }

    #[test]
    #[should_panic(expected = "non-zero capacity")]
    fn zero_capacity_block_panics() {
        let _ = RawBlock::new(0);
    }
}
