//! Raw allocation interface shared by zones and their consumers.
//!
//! [`AllocationPolicy`] is the minimal contract: raw allocation, plus a
//! deallocation hook that zones ignore. The zone-backed containers place
//! their elements through the typed [`Zone`] methods and hand abandoned
//! storage (outgrown buffers, removed nodes) to
//! [`deallocate`](AllocationPolicy::deallocate). Code that only needs raw
//! bytes can be written against the trait.

use std::ptr::NonNull;

use crate::zone::Zone;

/// Raw allocation capability for containers.
pub trait AllocationPolicy {
    /// Allocate `size` bytes with at least pointer alignment.
    fn allocate(&self, size: usize) -> NonNull<u8>;

    /// Hand back storage obtained from [`allocate`](Self::allocate).
    ///
    /// Implementations may ignore this entirely; callers must not assume
    /// anything is reclaimed.
    fn deallocate(&self, ptr: NonNull<u8>) {
        let _ = ptr;
    }
}

impl AllocationPolicy for Zone {
    fn allocate(&self, size: usize) -> NonNull<u8> {
        Zone::allocate(self, size)
    }

    // Individual deallocation is accepted and ignored; storage is reclaimed
    // only by `bulk_free`.
    fn deallocate(&self, _ptr: NonNull<u8>) {}
}
