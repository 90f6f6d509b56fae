//! The zone allocator: bump allocation over a chain of segments.
//!
//! The free region of the head segment is the half-open range
//! `[position, limit)`. Requests that fit are served by advancing
//! `position`; requests that do not trigger [`Zone::expand`], which pushes a
//! new (or the kept) segment onto the chain. Nothing is freed until
//! [`Zone::bulk_free`].

use std::cell::{Cell, RefCell};
use std::ops::Range;
use std::ptr::{self, NonNull};

use tracing::{debug, trace};

use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::raw;
use crate::segment::{release_chain, Segment, SEGMENT_ALIGNMENT, ZONE_ALIGNMENT};
use crate::stats::ZoneStats;

/// A region allocator whose memory is released all at once.
///
/// No memory is requested from the system until the first non-empty
/// allocation. The zone is single-threaded: it is neither `Send` nor
/// `Sync`, and one zone per thread is the intended usage.
///
/// Raw allocation goes through [`allocate`](Self::allocate); typed
/// placement goes through [`alloc`](Self::alloc) and friends or the
/// [`ZoneObject`](crate::ZoneObject) trait. Lifetimes are managed by
/// [`ZoneScope`](crate::ZoneScope) guards.
#[derive(Debug)]
pub struct Zone {
    /// Next free byte in the head segment; null when no segment is wired.
    position: Cell<*mut u8>,
    /// One past the last free byte in the head segment.
    limit: Cell<*mut u8>,
    /// Newest segment; owns the rest of the chain.
    head: RefCell<Option<Box<Segment>>>,
    /// Small segment retained by the last bulk free, not yet reused.
    kept: RefCell<Option<Box<Segment>>>,
    config: ZoneConfig,
    bytes_from_system: Cell<usize>,
    bytes_handed_out: Cell<usize>,
    segment_count: Cell<usize>,
    bulk_frees: u64,
    /// Live `ZoneScope` count. Only scopes mutate it, through `&mut Zone`.
    scope_nesting: u32,
    /// Live `AssertNoZoneAllocation` count.
    suppress_depth: Cell<u32>,
}

impl Zone {
    /// Create an empty zone with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::InvalidConfig`] if `config` fails
    /// [`ZoneConfig::validate`].
    pub fn new(config: ZoneConfig) -> Result<Self, ZoneError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ZoneConfig) -> Self {
        Self {
            position: Cell::new(ptr::null_mut()),
            limit: Cell::new(ptr::null_mut()),
            head: RefCell::new(None),
            kept: RefCell::new(None),
            config,
            bytes_from_system: Cell::new(0),
            bytes_handed_out: Cell::new(0),
            segment_count: Cell::new(0),
            bulk_frees: 0,
            scope_nesting: 0,
            suppress_depth: Cell::new(0),
        }
    }

    /// The configuration this zone was built with.
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Allocate `size` bytes, expanding the zone on demand.
    ///
    /// The returned address is aligned to [`ZONE_ALIGNMENT`]; if `size` is a
    /// multiple of [`SEGMENT_ALIGNMENT`] it is aligned to that as well. A
    /// zero-length request returns a valid, aligned address that must not be
    /// read or written. The memory is uninitialised and stays valid until the
    /// next [`bulk_free`](Self::bulk_free).
    ///
    /// # Panics
    ///
    /// In debug builds, panics if an [`AssertNoZoneAllocation`](crate::AssertNoZoneAllocation)
    /// guard is active on this zone. Panics if `size` overflows the address
    /// space; aborts if the system allocator is exhausted.
    #[inline]
    pub fn allocate(&self, size: usize) -> NonNull<u8> {
        debug_assert!(
            self.suppress_depth.get() == 0,
            "zone allocation while AssertNoZoneAllocation is active"
        );
        let size = round_up(size);
        self.bytes_handed_out
            .set(self.bytes_handed_out.get().saturating_add(size));
        match self.bump(size) {
            Some(ptr) => ptr,
            None => self.expand(size),
        }
    }

    /// Serve `size` (already rounded) bytes from the head segment, if it fits.
    #[inline]
    fn bump(&self, size: usize) -> Option<NonNull<u8>> {
        let position = self.position.get();
        if position.is_null() {
            return (size == 0).then(raw::dangling);
        }
        let padding = padding_for(position.addr(), size);
        let available = self.limit.get().addr() - position.addr();
        if padding.checked_add(size)? > available {
            // An empty request never warrants a new segment.
            return (size == 0).then(raw::dangling);
        }
        let start = position.wrapping_add(padding);
        self.position.set(start.wrapping_add(size));
        NonNull::new(start)
    }

    /// Push a segment large enough for `size` bytes and allocate from it.
    ///
    /// A fresh segment's payload is [`SEGMENT_ALIGNMENT`]-aligned, so the
    /// request needs no padding.
    #[cold]
    #[inline(never)]
    fn expand(&self, size: usize) -> NonNull<u8> {
        let mut segment = match self.take_kept_segment(size) {
            Some(kept) => kept,
            None => {
                let capacity = self.next_segment_capacity(size);
                let segment = Segment::new(capacity);
                debug!(capacity, requested = size, "zone segment obtained from system");
                segment
            }
        };

        let start = segment.payload();
        self.position.set(start.as_ptr().wrapping_add(size));
        self.limit.set(segment.end());
        self.bytes_from_system
            .set(self.bytes_from_system.get() + segment.capacity());
        self.segment_count.set(self.segment_count.get() + 1);

        let mut head = self.head.borrow_mut();
        segment.link(head.take());
        *head = Some(segment);
        start
    }

    /// Take the kept segment if it can hold `size` bytes; otherwise release it.
    fn take_kept_segment(&self, size: usize) -> Option<Box<Segment>> {
        let kept = self.kept.borrow_mut().take()?;
        if kept.capacity() >= size {
            debug!(capacity = kept.capacity(), requested = size, "zone reusing kept segment");
            Some(kept)
        } else {
            trace!(
                capacity = kept.capacity(),
                requested = size,
                "kept segment too small, releasing"
            );
            None
        }
    }

    /// High-water-mark growth: `size + 2 * head_capacity`, clamped to the
    /// configured bounds, but never smaller than `size`.
    fn next_segment_capacity(&self, size: usize) -> usize {
        let head_capacity = self
            .head
            .borrow()
            .as_ref()
            .map_or(0, |segment| segment.capacity());
        let grown = size.saturating_add(head_capacity.saturating_mul(2));
        if grown < self.config.min_segment_bytes {
            self.config.min_segment_bytes
        } else if grown > self.config.max_segment_bytes {
            size.max(self.config.max_segment_bytes)
        } else {
            grown
        }
    }

    /// Release every segment, keeping the head if it is small enough.
    ///
    /// If the head segment's capacity is at most
    /// [`max_kept_segment_bytes`](ZoneConfig::max_kept_segment_bytes) it is
    /// detached and retained for the next expansion; all other segments go
    /// back to the system allocator. Afterwards the zone is empty and
    /// [`bytes_allocated_from_system`](Self::bytes_allocated_from_system) is
    /// zero.
    ///
    /// Normally invoked by the outermost delete-on-exit
    /// [`ZoneScope`](crate::ZoneScope), not mid-phase.
    pub fn bulk_free(&mut self) {
        let mut segments_released = 0;
        let mut bytes_released = 0;

        if let Some(mut head) = self.head.get_mut().take() {
            let rest = head.unlink();
            if head.capacity() <= self.config.max_kept_segment_bytes {
                debug_assert!(
                    self.kept.get_mut().is_none(),
                    "kept segment must be consumed before the chain grows"
                );
                *self.kept.get_mut() = Some(head);
            } else {
                segments_released += 1;
                bytes_released += head.capacity();
            }
            let (segments, bytes) = release_chain(rest);
            segments_released += segments;
            bytes_released += bytes;
        }

        self.position.set(ptr::null_mut());
        self.limit.set(ptr::null_mut());
        self.bytes_from_system.set(0);
        self.bytes_handed_out.set(0);
        self.segment_count.set(0);
        self.bulk_frees += 1;

        debug!(
            segments_released,
            bytes_released,
            kept_bytes = self.kept_segment_bytes().unwrap_or(0),
            "zone bulk free"
        );
    }

    /// Release the segment retained by the last [`bulk_free`](Self::bulk_free).
    ///
    /// Returns `true` if a segment was released. Useful when the owning
    /// context wants to return every byte to the system, e.g. under memory
    /// pressure.
    pub fn release_kept_segment(&mut self) -> bool {
        match self.kept.get_mut().take() {
            Some(kept) => {
                debug!(capacity = kept.capacity(), "zone kept segment released");
                true
            }
            None => false,
        }
    }

    /// Whether more bytes have been obtained from the system than the
    /// configured excess threshold. Advisory only.
    pub fn is_over_excess_threshold(&self) -> bool {
        self.bytes_from_system.get() > self.config.excess_threshold_bytes
    }

    /// Sum of capacities of segments obtained since the last bulk free.
    pub fn bytes_allocated_from_system(&self) -> usize {
        self.bytes_from_system.get()
    }

    /// Capacity of the retained segment, if one is waiting for reuse.
    pub fn kept_segment_bytes(&self) -> Option<usize> {
        self.kept.borrow().as_ref().map(|segment| segment.capacity())
    }

    /// Number of live [`ZoneScope`](crate::ZoneScope)s over this zone.
    pub fn scope_nesting(&self) -> u32 {
        self.scope_nesting
    }

    /// `false` while an [`AssertNoZoneAllocation`](crate::AssertNoZoneAllocation)
    /// guard is alive on this zone.
    pub fn allocation_allowed(&self) -> bool {
        self.suppress_depth.get() == 0
    }

    /// Whether `addr` lies inside the payload of a segment in the chain.
    pub fn contains_address(&self, addr: *const u8) -> bool {
        let head = self.head.borrow();
        let mut current = head.as_deref();
        while let Some(segment) = current {
            if segment.contains(addr) {
                return true;
            }
            current = segment.next();
        }
        false
    }

    /// Address ranges of the segments in the chain, newest first.
    pub fn segment_ranges(&self) -> Vec<Range<usize>> {
        let head = self.head.borrow();
        let mut ranges = Vec::with_capacity(self.segment_count.get());
        let mut current = head.as_deref();
        while let Some(segment) = current {
            ranges.push(segment.start().addr()..segment.end().addr());
            current = segment.next();
        }
        ranges
    }

    /// Snapshot of the zone's accounting counters.
    pub fn stats(&self) -> ZoneStats {
        ZoneStats {
            segment_count: self.segment_count.get(),
            bytes_allocated_from_system: self.bytes_from_system.get(),
            bytes_handed_out: self.bytes_handed_out.get(),
            kept_segment_bytes: self.kept_segment_bytes(),
            bulk_frees: self.bulk_frees,
            scope_nesting: self.scope_nesting,
        }
    }

    pub(crate) fn enter_scope(&mut self) {
        self.scope_nesting += 1;
    }

    /// Returns the nesting depth after leaving.
    pub(crate) fn exit_scope(&mut self) -> u32 {
        assert!(
            self.scope_nesting > 0,
            "ZoneScope unwound more times than it was entered"
        );
        self.scope_nesting -= 1;
        self.scope_nesting
    }

    /// Returns whether allocation was already suppressed.
    pub(crate) fn suppress_allocation(&self) -> bool {
        let depth = self.suppress_depth.get();
        self.suppress_depth.set(depth + 1);
        depth > 0
    }

    pub(crate) fn restore_allocation(&self) {
        let depth = self.suppress_depth.get();
        debug_assert!(depth > 0, "allocation suppression underflow");
        self.suppress_depth.set(depth.saturating_sub(1));
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::from_valid_config(ZoneConfig::default())
    }
}

impl Drop for Zone {
    fn drop(&mut self) {
        release_chain(self.head.get_mut().take());
    }
}

/// Round `size` up to [`ZONE_ALIGNMENT`].
#[inline]
fn round_up(size: usize) -> usize {
    match size.checked_add(ZONE_ALIGNMENT - 1) {
        Some(padded) => padded & !(ZONE_ALIGNMENT - 1),
        None => size_overflow(size),
    }
}

/// Padding needed before a `size`-byte allocation at `addr`.
///
/// Sizes that are a multiple of [`SEGMENT_ALIGNMENT`] are placed on that
/// boundary; everything else only needs the [`ZONE_ALIGNMENT`] that
/// `position` always has.
#[inline]
fn padding_for(addr: usize, size: usize) -> usize {
    if size % SEGMENT_ALIGNMENT == 0 {
        addr.wrapping_neg() & (SEGMENT_ALIGNMENT - 1)
    } else {
        0
    }
}

#[cold]
fn size_overflow(size: usize) -> ! {
    panic!("zone allocation of {size} bytes overflows the address space")
}
