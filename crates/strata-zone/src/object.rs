//! Typed placement of values into zone memory.
//!
//! Zone-allocated values are never destroyed individually: their storage
//! disappears wholesale at the next [`Zone::bulk_free`], and no destructor
//! ever runs. To keep that sound and leak-free, every typed entry point
//! rejects at compile time any type that needs `Drop`:
//!
//! ```compile_fail
//! use strata_zone::{Zone, ZoneObject};
//!
//! struct Named {
//!     name: String,
//! }
//! impl ZoneObject for Named {}
//!
//! let zone = Zone::default();
//! let _ = Named { name: "x".into() }.new_in(&zone);
//! ```
//!
//! Types whose alignment exceeds [`SEGMENT_ALIGNMENT`] are rejected the
//! same way.
//!
//! This is one of the two modules permitted to use `unsafe`.

#![allow(unsafe_code)]

use std::mem;
use std::ptr;
use std::slice;
use std::str;

use crate::segment::SEGMENT_ALIGNMENT;
use crate::zone::Zone;

/// A type whose instances are constructed directly in a zone.
///
/// Implementors get placement construction via [`new_in`](Self::new_in).
/// There is no way to destroy an instance on its own: the returned
/// reference cannot release storage, and the type may not need `Drop`.
///
/// ```
/// use strata_zone::{Zone, ZoneObject};
///
/// #[derive(Debug, PartialEq)]
/// struct Literal {
///     value: i64,
/// }
/// impl ZoneObject for Literal {}
///
/// let zone = Zone::default();
/// let lit = Literal { value: 7 }.new_in(&zone);
/// lit.value += 1;
/// assert_eq!(*lit, Literal { value: 8 });
/// ```
pub trait ZoneObject: Sized {
    /// Move `self` into `zone` and return a reference valid until the
    /// zone's next bulk free.
    #[allow(clippy::mut_from_ref)]
    fn new_in(self, zone: &Zone) -> &mut Self {
        zone.alloc(self)
    }
}

/// Post-monomorphisation check shared by every typed entry point.
const fn assert_placeable<T>() {
    assert!(
        !mem::needs_drop::<T>(),
        "zone-allocated types must not need Drop: the zone never runs destructors"
    );
    assert!(
        mem::align_of::<T>() <= SEGMENT_ALIGNMENT,
        "zone-allocated types must not be aligned beyond SEGMENT_ALIGNMENT"
    );
}

/// Byte size of `len` elements of `T`.
fn array_bytes<T>(len: usize) -> usize {
    match mem::size_of::<T>().checked_mul(len) {
        Some(bytes) => bytes,
        None => panic!("zone array of {len} elements overflows the address space"),
    }
}

// Alignment argument shared by the SAFETY comments below: `allocate`
// returns ZONE_ALIGNMENT-aligned memory, and SEGMENT_ALIGNMENT-aligned
// memory when the size is a multiple of it. A type with alignment above
// ZONE_ALIGNMENT (at most SEGMENT_ALIGNMENT, checked above) has a size that
// is a multiple of its alignment, so any array of it gets the stronger
// guarantee. The memory is exclusively ours until `bulk_free`, which takes
// `&mut Zone` and therefore outlives every reference returned here.
impl Zone {
    /// Move `value` into the zone.
    ///
    /// The returned reference lives as long as the shared borrow of the
    /// zone. `value` is never dropped.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T>(&self, value: T) -> &mut T {
        const { assert_placeable::<T>() };
        let ptr = self.allocate(mem::size_of::<T>()).cast::<T>();
        // SAFETY: see the alignment argument above; `ptr` is valid for a
        // write of one `T` and not aliased.
        unsafe {
            ptr.as_ptr().write(value);
            &mut *ptr.as_ptr()
        }
    }

    /// Copy `src` into a new zone slice.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &mut [T] {
        const { assert_placeable::<T>() };
        let ptr = self.allocate(array_bytes::<T>(src.len())).cast::<T>();
        // SAFETY: `ptr` is valid for `src.len()` writes of `T`, freshly
        // allocated, so it cannot overlap `src`.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            slice::from_raw_parts_mut(ptr.as_ptr(), src.len())
        }
    }

    /// Allocate a slice of `len` copies of `value`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_fill<T: Copy>(&self, len: usize, value: T) -> &mut [T] {
        self.alloc_slice_fill_with(len, |_| value)
    }

    /// Allocate a slice of `len` elements produced by `f(index)`.
    ///
    /// If `f` panics, the elements written so far are abandoned in the zone.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_fill_with<T, F>(&self, len: usize, mut f: F) -> &mut [T]
    where
        F: FnMut(usize) -> T,
    {
        const { assert_placeable::<T>() };
        let ptr = self.allocate(array_bytes::<T>(len)).cast::<T>();
        for index in 0..len {
            // SAFETY: `index < len`, so the write stays inside the allocation.
            unsafe { ptr.as_ptr().add(index).write(f(index)) };
        }
        // SAFETY: all `len` elements were initialised above.
        unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    /// Copy `s` into the zone.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_str(&self, s: &str) -> &mut str {
        let bytes = self.alloc_slice_copy(s.as_bytes());
        // SAFETY: `bytes` is a verbatim copy of a valid `str`.
        unsafe { str::from_utf8_unchecked_mut(bytes) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::segment::ZONE_ALIGNMENT;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }
    impl ZoneObject for Point {}

    #[repr(align(16))]
    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Wide(u8);

    fn small_zone() -> Zone {
        Zone::new(
            ZoneConfig::new()
                .with_min_segment_bytes(64)
                .with_max_segment_bytes(256),
        )
        .unwrap()
    }

    #[test]
    fn alloc_stores_value() {
        let zone = small_zone();
        let p = zone.alloc(Point { x: 1, y: 2 });
        p.x = 10;
        assert_eq!(*p, Point { x: 10, y: 2 });
    }

    #[test]
    fn new_in_places_object() {
        let zone = small_zone();
        let p = Point { x: 3, y: 4 }.new_in(&zone);
        assert!(zone.contains_address((p as *const Point).cast()));
    }

    #[test]
    fn values_survive_expansion() {
        let zone = small_zone();
        let values: Vec<&mut u64> = (0..100u64).map(|i| zone.alloc(i * 3)).collect();
        assert!(zone.stats().segment_count > 1);
        for (i, v) in values.iter().enumerate() {
            assert_eq!(**v, i as u64 * 3);
        }
    }

    #[test]
    fn slice_copy_matches_source() {
        let zone = small_zone();
        let src = [1u16, 2, 3, 4, 5];
        let copy = zone.alloc_slice_copy(&src);
        copy[0] = 9;
        assert_eq!(copy, &[9, 2, 3, 4, 5]);
        assert_eq!(src[0], 1);
    }

    #[test]
    fn slice_fill_and_fill_with() {
        let zone = small_zone();
        assert_eq!(zone.alloc_slice_fill(4, 7u8), &[7, 7, 7, 7]);
        assert_eq!(
            zone.alloc_slice_fill_with(4, |i| i as u32 * i as u32),
            &[0, 1, 4, 9]
        );
    }

    #[test]
    fn empty_slices_are_valid() {
        let zone = small_zone();
        let empty: &mut [u64] = zone.alloc_slice_copy(&[]);
        assert!(empty.is_empty());
        assert_eq!(zone.bytes_allocated_from_system(), 0);
    }

    #[test]
    fn str_is_copied() {
        let zone = small_zone();
        let s = zone.alloc_str("identifier");
        s.make_ascii_uppercase();
        assert_eq!(s, "IDENTIFIER");
    }

    #[test]
    fn zero_sized_values() {
        let zone = small_zone();
        let _unit: &mut () = zone.alloc(());
        assert_eq!(zone.alloc_slice_fill(10, ()).len(), 10);
        assert_eq!(zone.bytes_allocated_from_system(), 0);
    }

    #[test]
    fn over_aligned_values_are_aligned() {
        let zone = small_zone();
        zone.alloc(1u8);
        let wide = zone.alloc(Wide(5));
        assert_eq!((wide as *const Wide).addr() % 16, 0);
        let wides = zone.alloc_slice_fill(3, Wide(1));
        assert_eq!(wides.as_ptr().addr() % 16, 0);
    }

    #[test]
    fn pointer_sized_values_are_aligned() {
        let zone = small_zone();
        zone.alloc(1u8);
        let r = zone.alloc(42usize);
        assert_eq!((r as *const usize).addr() % ZONE_ALIGNMENT, 0);
    }

    #[test]
    #[should_panic(expected = "overflows the address space")]
    fn huge_array_panics() {
        let zone = small_zone();
        zone.alloc_slice_fill(usize::MAX, 0u64);
    }
}
