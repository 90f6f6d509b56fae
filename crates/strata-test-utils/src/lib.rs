//! Test utilities for strata development.
//!
//! Provides zone configurations sized for tests, a small zone-allocated
//! syntax tree in [`fixtures`], address-range assertions, and a
//! deterministic [`SizeStream`] of request sizes.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::ops::Range;
use std::ptr::NonNull;

pub use fixtures::{scenario_config, tiny_config, BinaryOp, Expr};

/// Panic unless `ptr` is a multiple of `align`.
pub fn assert_aligned(ptr: NonNull<u8>, align: usize) {
    let addr = ptr.as_ptr().addr();
    assert!(
        addr % align == 0,
        "address {addr:#x} is not aligned to {align} bytes"
    );
}

/// Panic if any two of `ranges` overlap.
///
/// Empty ranges never overlap anything.
pub fn assert_disjoint(ranges: &[Range<usize>]) {
    let mut sorted: Vec<&Range<usize>> = ranges.iter().filter(|r| !r.is_empty()).collect();
    sorted.sort_by_key(|r| r.start);
    for pair in sorted.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "ranges {:#x?} and {:#x?} overlap",
            pair[0],
            pair[1]
        );
    }
}

/// Byte range covered by an allocation of `size` bytes at `ptr`.
pub fn span(ptr: NonNull<u8>, size: usize) -> Range<usize> {
    let start = ptr.as_ptr().addr();
    start..start + size
}

/// Deterministic stream of allocation sizes in `0..=max`.
///
/// A 64-bit linear congruential generator: the same seed always yields the
/// same sequence, on every platform.
#[derive(Clone, Debug)]
pub struct SizeStream {
    state: u64,
    max: usize,
}

impl SizeStream {
    pub fn new(seed: u64, max: usize) -> Self {
        Self { state: seed, max }
    }
}

impl Iterator for SizeStream {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // High bits of an LCG are the well-distributed ones.
        let sample = (self.state >> 33) as usize;
        Some(sample % (self.max + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_stream_is_deterministic() {
        let a: Vec<usize> = SizeStream::new(42, 100).take(50).collect();
        let b: Vec<usize> = SizeStream::new(42, 100).take(50).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| s <= 100));
    }

    #[test]
    fn size_stream_seeds_differ() {
        let a: Vec<usize> = SizeStream::new(1, 1000).take(20).collect();
        let b: Vec<usize> = SizeStream::new(2, 1000).take(20).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn disjoint_accepts_touching_ranges() {
        assert_disjoint(&[16..32, 0..16, 32..48, 40..40]);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn disjoint_rejects_overlap() {
        assert_disjoint(&[0..16, 8..24]);
    }

    #[test]
    #[should_panic(expected = "not aligned")]
    fn aligned_rejects_odd_address() {
        let mut bytes = [0u64; 2];
        let base = NonNull::from(&mut bytes).cast::<u8>();
        let ptr = NonNull::new(base.as_ptr().wrapping_add(1)).unwrap();
        assert_aligned(ptr, 8);
    }
}
