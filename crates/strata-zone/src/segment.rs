//! Contiguous memory segments and the zone's segment chain.
//!
//! A [`Segment`] is one block obtained from the system allocator. Segments
//! form a singly linked stack: each owns the segment allocated immediately
//! before it, so the head of the chain is always the newest.

use std::mem;
use std::ptr::NonNull;

use crate::raw::RawBlock;

/// Alignment of every address returned by [`Zone::allocate`](crate::Zone::allocate).
pub const ZONE_ALIGNMENT: usize = mem::size_of::<usize>();

/// Alignment of addresses returned for sizes that are a multiple of it,
/// and of every segment's payload start.
pub const SEGMENT_ALIGNMENT: usize = 2 * ZONE_ALIGNMENT;

/// A single contiguous block of zone memory.
///
/// The payload is never moved or resized after creation. Pointers into it
/// remain valid until the segment is dropped, which only happens during
/// [`Zone::bulk_free`](crate::Zone::bulk_free),
/// [`Zone::release_kept_segment`](crate::Zone::release_kept_segment), or
/// when the zone itself is dropped.
pub struct Segment {
    /// Segment allocated immediately before this one.
    next: Option<Box<Segment>>,
    /// Payload storage.
    block: RawBlock,
}

impl Segment {
    /// Obtain a new, unlinked segment with the given payload capacity.
    pub(crate) fn new(capacity: usize) -> Box<Self> {
        Box::new(Self {
            next: None,
            block: RawBlock::new(capacity),
        })
    }

    /// Payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// First byte of the payload.
    pub fn start(&self) -> *mut u8 {
        self.block.start().as_ptr()
    }

    pub(crate) fn payload(&self) -> NonNull<u8> {
        self.block.start()
    }

    /// One past the last byte of the payload.
    pub fn end(&self) -> *mut u8 {
        self.start().wrapping_add(self.capacity())
    }

    /// Whether `addr` lies within this segment's payload.
    pub fn contains(&self, addr: *const u8) -> bool {
        let addr = addr.addr();
        addr >= self.start().addr() && addr < self.end().addr()
    }

    /// The previously allocated segment, if any.
    pub fn next(&self) -> Option<&Segment> {
        self.next.as_deref()
    }

    /// Attach `next` behind this segment.
    pub(crate) fn link(&mut self, next: Option<Box<Segment>>) {
        debug_assert!(self.next.is_none(), "segment is already linked");
        self.next = next;
    }

    /// Detach and return the rest of the chain.
    pub(crate) fn unlink(&mut self) -> Option<Box<Segment>> {
        self.next.take()
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("start", &self.start())
            .field("capacity", &self.capacity())
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// Release every segment in a chain.
///
/// Unlinks iteratively so that long chains cannot overflow the stack
/// through recursive `Box` drops. Returns `(segments, bytes)` released.
pub(crate) fn release_chain(mut head: Option<Box<Segment>>) -> (usize, usize) {
    let mut segments = 0;
    let mut bytes = 0;
    while let Some(mut segment) = head {
        head = segment.unlink();
        segments += 1;
        bytes += segment.capacity();
    }
    (segments, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_segment_reports_capacity() {
        let seg = Segment::new(4096);
        assert_eq!(seg.capacity(), 4096);
        assert_eq!(seg.end().addr() - seg.start().addr(), 4096);
        assert!(seg.next().is_none());
    }

    #[test]
    fn payload_start_is_segment_aligned() {
        for capacity in [1, 7, 24, 8192] {
            let seg = Segment::new(capacity);
            assert_eq!(seg.start().addr() % SEGMENT_ALIGNMENT, 0);
        }
    }

    #[test]
    fn contains_is_half_open() {
        let seg = Segment::new(64);
        assert!(seg.contains(seg.start()));
        assert!(seg.contains(seg.start().wrapping_add(63)));
        assert!(!seg.contains(seg.end()));
        assert!(!seg.contains(seg.start().wrapping_sub(1)));
    }

    #[test]
    fn link_and_unlink_round_trip() {
        let older = Segment::new(32);
        let older_start = older.start();
        let mut newer = Segment::new(64);
        newer.link(Some(older));
        assert_eq!(newer.next().map(Segment::start), Some(older_start));

        let detached = newer.unlink();
        assert!(newer.next().is_none());
        assert_eq!(detached.map(|s| s.capacity()), Some(32));
    }

    #[test]
    fn release_chain_counts_all_segments() {
        let mut head: Option<Box<Segment>> = None;
        for capacity in [16, 32, 64] {
            let mut seg = Segment::new(capacity);
            seg.link(head.take());
            head = Some(seg);
        }
        assert_eq!(release_chain(head), (3, 112));
    }

    #[test]
    fn release_long_chain_does_not_recurse() {
        let mut head: Option<Box<Segment>> = None;
        for _ in 0..100_000 {
            let mut seg = Segment::new(16);
            seg.link(head.take());
            head = Some(seg);
        }
        assert_eq!(release_chain(head), (100_000, 1_600_000));
    }

    #[test]
    fn release_empty_chain() {
        assert_eq!(release_chain(None), (0, 0));
    }
}
