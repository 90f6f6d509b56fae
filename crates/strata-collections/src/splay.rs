//! Ordered map stored as a top-down splay tree in zone memory.
//!
//! Every lookup splays the touched key (or its nearest neighbour) to the
//! root, so repeated access to a small working set stays cheap. Nodes are
//! placed in the zone and linked through `Cell`s, which lets the tree
//! restructure itself through shared node references without `unsafe`.
//! Removed nodes are handed to the zone's no-op deallocation and reclaimed
//! with everything else at the next bulk free.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;

use smallvec::SmallVec;
use strata_zone::{AllocationPolicy, Zone};

type Link<'z, K, V> = Option<&'z Node<'z, K, V>>;

struct Node<'z, K, V> {
    key: K,
    value: Cell<V>,
    left: Cell<Link<'z, K, V>>,
    right: Cell<Link<'z, K, V>>,
}

/// Splay tree map from `K` to `V` whose nodes live in a zone.
///
/// Keys are unique. Lookups take `&mut self` because they restructure the
/// tree.
///
/// ```
/// use strata_collections::ZoneSplayTree;
/// use strata_zone::Zone;
///
/// let zone = Zone::default();
/// let mut offsets = ZoneSplayTree::new(&zone);
/// assert!(offsets.insert(10, 'a'));
/// assert!(offsets.insert(20, 'b'));
/// assert!(!offsets.insert(10, 'z'));
///
/// assert_eq!(offsets.find(&10), Some('a'));
/// assert_eq!(offsets.find_greatest_less_than(&15), Some((10, 'a')));
/// assert_eq!(offsets.find_least_greater_than(&15), Some((20, 'b')));
/// ```
pub struct ZoneSplayTree<'z, K: Ord + Copy, V: Copy> {
    zone: &'z Zone,
    root: Link<'z, K, V>,
    len: usize,
}

impl<'z, K: Ord + Copy, V: Copy> ZoneSplayTree<'z, K, V> {
    /// Create an empty tree allocating its nodes in `zone`.
    pub fn new(zone: &'z Zone) -> Self {
        Self {
            zone,
            root: None,
            len: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert `key` with `value`.
    ///
    /// Returns `false` and leaves the stored value untouched if `key` is
    /// already present; use [`update`](Self::update) to overwrite.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let Some(root) = self.splay(&key) else {
            self.root = Some(self.new_node(key, value));
            self.len = 1;
            return true;
        };
        let node = match key.cmp(&root.key) {
            Ordering::Equal => return false,
            Ordering::Greater => {
                let node = self.new_node(key, value);
                node.right.set(root.right.take());
                node.left.set(Some(root));
                node
            }
            Ordering::Less => {
                let node = self.new_node(key, value);
                node.left.set(root.left.take());
                node.right.set(Some(root));
                node
            }
        };
        self.root = Some(node);
        self.len += 1;
        true
    }

    /// Value stored under `key`.
    pub fn find(&mut self, key: &K) -> Option<V> {
        self.find_node(key).map(|node| node.value.get())
    }

    /// Whether `key` is present.
    pub fn contains(&mut self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Overwrite the value under an existing `key`.
    ///
    /// Returns `false` if `key` is absent; nothing is inserted.
    pub fn update(&mut self, key: &K, value: V) -> bool {
        match self.find_node(key) {
            Some(node) => {
                node.value.set(value);
                true
            }
            None => false,
        }
    }

    /// Remove `key` and return its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.find_node(key)?;
        let right = removed.right.get();
        // Every key in the left subtree is smaller than `key`, so splaying
        // for it lifts the subtree's maximum, which has no right child.
        self.root = removed.left.get();
        match self.splay(key) {
            Some(root) => root.right.set(right),
            None => self.root = right,
        }
        self.len -= 1;
        let value = removed.value.get();
        self.zone.deallocate(NonNull::from(removed).cast());
        Some(value)
    }

    /// Entry with the smallest key.
    pub fn find_min(&self) -> Option<(K, V)> {
        leftmost(self.root).map(entry)
    }

    /// Entry with the largest key.
    pub fn find_max(&self) -> Option<(K, V)> {
        rightmost(self.root).map(entry)
    }

    /// Entry with the greatest key that is less than or equal to `key`.
    pub fn find_greatest_less_than(&mut self, key: &K) -> Option<(K, V)> {
        let root = self.splay(key)?;
        if root.key <= *key {
            Some(entry(root))
        } else {
            rightmost(root.left.get()).map(entry)
        }
    }

    /// Entry with the least key that is greater than or equal to `key`.
    pub fn find_least_greater_than(&mut self, key: &K) -> Option<(K, V)> {
        let root = self.splay(key)?;
        if root.key >= *key {
            Some(entry(root))
        } else {
            leftmost(root.right.get()).map(entry)
        }
    }

    /// Call `f` on every entry in ascending key order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(K, V),
    {
        let mut stack: SmallVec<[&Node<'z, K, V>; 32]> = SmallVec::new();
        let mut current = self.root;
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.get();
            }
            let Some(node) = stack.pop() else {
                break;
            };
            f(node.key, node.value.get());
            current = node.right.get();
        }
    }

    fn new_node(&self, key: K, value: V) -> &'z Node<'z, K, V> {
        let zone: &'z Zone = self.zone;
        zone.alloc(Node {
            key,
            value: Cell::new(value),
            left: Cell::new(None),
            right: Cell::new(None),
        })
    }

    fn find_node(&mut self, key: &K) -> Link<'z, K, V> {
        self.splay(key).filter(|root| root.key == *key)
    }

    /// Top-down splay: move `key`, or the last node on its search path, to
    /// the root and return the new root.
    fn splay(&mut self, key: &K) -> Link<'z, K, V> {
        let mut current = self.root?;
        // Nodes known to be smaller than `key`, linked through `right`.
        let mut small_root: Link<'z, K, V> = None;
        let mut small_tail: Link<'z, K, V> = None;
        // Nodes known to be larger than `key`, linked through `left`.
        let mut large_root: Link<'z, K, V> = None;
        let mut large_tail: Link<'z, K, V> = None;

        loop {
            match key.cmp(&current.key) {
                Ordering::Less => {
                    let Some(child) = current.left.get() else {
                        break;
                    };
                    let next = if *key < child.key {
                        // Rotate right.
                        current.left.set(child.right.get());
                        child.right.set(Some(current));
                        current = child;
                        match current.left.get() {
                            Some(next) => next,
                            None => break,
                        }
                    } else {
                        child
                    };
                    match large_tail {
                        Some(tail) => tail.left.set(Some(current)),
                        None => large_root = Some(current),
                    }
                    large_tail = Some(current);
                    current = next;
                }
                Ordering::Greater => {
                    let Some(child) = current.right.get() else {
                        break;
                    };
                    let next = if *key > child.key {
                        // Rotate left.
                        current.right.set(child.left.get());
                        child.left.set(Some(current));
                        current = child;
                        match current.right.get() {
                            Some(next) => next,
                            None => break,
                        }
                    } else {
                        child
                    };
                    match small_tail {
                        Some(tail) => tail.right.set(Some(current)),
                        None => small_root = Some(current),
                    }
                    small_tail = Some(current);
                    current = next;
                }
                Ordering::Equal => break,
            }
        }

        match small_tail {
            Some(tail) => tail.right.set(current.left.get()),
            None => small_root = current.left.get(),
        }
        match large_tail {
            Some(tail) => tail.left.set(current.right.get()),
            None => large_root = current.right.get(),
        }
        current.left.set(small_root);
        current.right.set(large_root);
        self.root = Some(current);
        self.root
    }
}

fn entry<K: Copy, V: Copy>(node: &Node<'_, K, V>) -> (K, V) {
    (node.key, node.value.get())
}

fn leftmost<'z, K, V>(mut link: Link<'z, K, V>) -> Link<'z, K, V> {
    while let Some(next) = link?.left.get() {
        link = Some(next);
    }
    link
}

fn rightmost<'z, K, V>(mut link: Link<'z, K, V>) -> Link<'z, K, V> {
    while let Some(next) = link?.right.get() {
        link = Some(next);
    }
    link
}

impl<K: Ord + Copy + fmt::Debug, V: Copy + fmt::Debug> fmt::Debug for ZoneSplayTree<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.for_each(|key, value| {
            map.entry(&key, &value);
        });
        map.finish()
    }
}
