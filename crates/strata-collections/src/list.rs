//! Growable arrays backed by zone memory.
//!
//! A [`ZoneList`] behaves like a `Vec` whose buffer is carved out of a
//! [`Zone`]. Growing allocates a fresh, larger buffer in the zone and copies
//! the elements over; the old buffer is handed back through the zone's
//! no-op deallocation and stays in place until the zone is bulk-freed.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use strata_zone::{AllocationPolicy, Zone};

/// A growable list of `Copy` elements stored in a zone.
///
/// Dereferences to `[T]`, so the usual slice methods (`get`, `first`,
/// `last`, `iter`, `contains`, `sort`, ...) are available directly.
///
/// ```
/// use strata_collections::ZoneList;
/// use strata_zone::Zone;
///
/// let zone = Zone::default();
/// let mut list = ZoneList::new(&zone);
/// list.push(3);
/// list.push(1);
/// list.push(2);
/// list.sort();
/// assert_eq!(&list[..], &[1, 2, 3]);
/// assert_eq!(list.pop(), Some(3));
/// ```
pub struct ZoneList<'z, T: Copy> {
    zone: &'z Zone,
    /// Backing buffer. Its length is the list's capacity.
    data: &'z mut [T],
    len: usize,
    /// Capacity requested up front, materialised on the first growth.
    reserved: usize,
}

impl<'z, T: Copy> ZoneList<'z, T> {
    /// Create an empty list. Nothing is allocated until the first push.
    pub fn new(zone: &'z Zone) -> Self {
        Self::with_capacity(zone, 0)
    }

    /// Create an empty list that will hold at least `capacity` elements
    /// before it needs to grow.
    ///
    /// The buffer is allocated on the first insertion.
    pub fn with_capacity(zone: &'z Zone, capacity: usize) -> Self {
        Self {
            zone,
            data: &mut [],
            len: 0,
            reserved: capacity,
        }
    }

    /// Create a list holding a copy of `items`.
    pub fn from_slice(zone: &'z Zone, items: &[T]) -> Self {
        Self {
            zone,
            data: zone.alloc_slice_copy(items),
            len: items.len(),
            reserved: 0,
        }
    }

    /// Copy this list's elements into a new list in `zone`.
    pub fn clone_in<'y>(&self, zone: &'y Zone) -> ZoneList<'y, T> {
        ZoneList::from_slice(zone, self)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the list can hold without growing.
    pub fn capacity(&self) -> usize {
        if self.data.is_empty() {
            self.reserved
        } else {
            self.data.len()
        }
    }

    /// Append `value`.
    pub fn push(&mut self, value: T) {
        if self.len == self.data.len() {
            self.grow(self.len + 1, value);
        }
        self.data[self.len] = value;
        self.len += 1;
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.data[self.len])
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );
        if self.len == self.data.len() {
            self.grow(self.len + 1, value);
        }
        self.data.copy_within(index..self.len, index + 1);
        self.data[index] = value;
        self.len += 1;
    }

    /// Remove and return the element at `index`, shifting later elements left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {index}) should be < len (is {})",
            self.len
        );
        let value = self.data[index];
        self.data.copy_within(index + 1..self.len, index);
        self.len -= 1;
        value
    }

    /// Append every element of `items`.
    pub fn extend_from_slice(&mut self, items: &[T]) {
        let Some(&first) = items.first() else {
            return;
        };
        let needed = self.len + items.len();
        if needed > self.data.len() {
            self.grow(needed, first);
        }
        self.data[self.len..needed].copy_from_slice(items);
        self.len = needed;
    }

    /// Shorten the list to `len` elements, keeping its storage.
    ///
    /// Has no effect if `len` is not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// Remove every element and abandon the storage.
    pub fn clear(&mut self) {
        let old = mem::take(&mut self.data);
        self.release(old);
        self.len = 0;
        self.reserved = 0;
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }

    /// Move to a buffer of at least `needed` elements.
    ///
    /// Capacity grows to `2 * capacity + 1`; `fill` initialises the unused
    /// tail so the new buffer is never read uninitialised.
    fn grow(&mut self, needed: usize, fill: T) {
        let doubled = self.data.len().saturating_mul(2).saturating_add(1);
        let capacity = needed.max(doubled).max(self.reserved);
        let zone = self.zone;
        let data = zone.alloc_slice_fill(capacity, fill);
        data[..self.len].copy_from_slice(&self.data[..self.len]);
        let old = mem::replace(&mut self.data, data);
        self.release(old);
        self.reserved = 0;
    }

    fn release(&self, old: &'z mut [T]) {
        if !old.is_empty() {
            self.zone.deallocate(NonNull::from(old).cast());
        }
    }
}

impl<T: Copy> Deref for ZoneList<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy> DerefMut for ZoneList<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy> Extend<T> for ZoneList<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy> IntoIterator for &'a ZoneList<'_, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for ZoneList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
