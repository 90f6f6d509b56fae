//! Scope guards that decide when a zone is torn down.
//!
//! A [`ZoneScope`] brackets one phase of work (parsing, compiling a
//! function, ...). Scopes nest; each increments the zone's nesting depth on
//! construction and decrements it on drop. The zone is bulk-freed only when
//! a delete-on-exit scope brings the depth back to zero, so an inner phase
//! can never release memory an outer phase still uses.
//!
//! ```
//! use strata_zone::{Zone, ZoneScope, ZoneScopeMode};
//!
//! let mut zone = Zone::default();
//! {
//!     let mut outer = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
//!     outer.allocate(64);
//!     {
//!         let inner = outer.nest(ZoneScopeMode::DontDeleteOnExit);
//!         inner.allocate(128);
//!         assert_eq!(inner.scope_nesting(), 2);
//!     }
//!     assert_eq!(outer.stats().bulk_frees, 0);
//! }
//! assert_eq!(zone.stats().bulk_frees, 1);
//! assert_eq!(zone.bytes_allocated_from_system(), 0);
//! ```

use std::ops::Deref;

use crate::zone::Zone;

/// Whether a scope frees its zone when it is the last one to unwind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoneScopeMode {
    /// Bulk-free the zone if this scope unwinds at nesting depth zero.
    DeleteOnExit,
    /// Leave the zone's contents in place on exit.
    DontDeleteOnExit,
}

/// Nesting guard over a [`Zone`].
///
/// Holds the exclusive borrow of the zone (or of the enclosing scope) for
/// its whole lifetime, so scopes are forced to unwind in reverse order of
/// construction. Dereferences to `&Zone` for allocation only: code inside
/// a scope cannot replace the zone or bulk-free it mid-phase.
///
/// ```compile_fail
/// use strata_zone::{Zone, ZoneScope, ZoneScopeMode};
///
/// let mut zone = Zone::default();
/// let mut scope = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
/// scope.bulk_free();
/// ```
///
/// ```compile_fail
/// use strata_zone::{Zone, ZoneScope, ZoneScopeMode};
///
/// let mut zone = Zone::default();
/// let mut scope = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
/// *scope = Zone::default();
/// ```
#[must_use]
pub struct ZoneScope<'z> {
    zone: &'z mut Zone,
    mode: ZoneScopeMode,
}

impl<'z> ZoneScope<'z> {
    /// Enter a new scope over `zone`.
    ///
    /// Use [`nest`](Self::nest) to open a scope inside an existing one.
    pub fn new(zone: &'z mut Zone, mode: ZoneScopeMode) -> Self {
        zone.enter_scope();
        Self { zone, mode }
    }

    /// Enter a scope nested inside this one.
    ///
    /// The inner scope borrows this one exclusively, so it must unwind
    /// first.
    pub fn nest(&mut self, mode: ZoneScopeMode) -> ZoneScope<'_> {
        ZoneScope::new(self.zone, mode)
    }

    /// Request bulk-free on exit for a scope created with
    /// [`ZoneScopeMode::DontDeleteOnExit`].
    ///
    /// Lets an inner phase declare cleanup safe once it knows no outer
    /// phase holds zone data. Still only takes effect if this scope is the
    /// last to unwind.
    pub fn upgrade_to_delete_on_exit(&mut self) {
        self.mode = ZoneScopeMode::DeleteOnExit;
    }

    /// This scope's current mode.
    pub fn mode(&self) -> ZoneScopeMode {
        self.mode
    }

    /// Whether dropping this scope right now would bulk-free the zone.
    pub fn should_delete_on_exit(&self) -> bool {
        self.mode == ZoneScopeMode::DeleteOnExit && self.zone.scope_nesting() == 1
    }
}

impl Deref for ZoneScope<'_> {
    type Target = Zone;

    fn deref(&self) -> &Zone {
        self.zone
    }
}

impl Drop for ZoneScope<'_> {
    fn drop(&mut self) {
        let remaining = self.zone.exit_scope();
        if remaining == 0 && self.mode == ZoneScopeMode::DeleteOnExit {
            self.zone.bulk_free();
        }
    }
}

impl std::fmt::Debug for ZoneScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneScope")
            .field("mode", &self.mode)
            .field("nesting", &self.zone.scope_nesting())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;

    fn zone() -> Zone {
        Zone::new(
            ZoneConfig::new()
                .with_min_segment_bytes(64)
                .with_max_segment_bytes(256),
        )
        .unwrap()
    }

    #[test]
    fn construction_and_drop_track_depth() {
        let mut zone = zone();
        {
            let mut outer = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
            assert_eq!(outer.scope_nesting(), 1);
            {
                let inner = outer.nest(ZoneScopeMode::DontDeleteOnExit);
                assert_eq!(inner.scope_nesting(), 2);
            }
            assert_eq!(outer.scope_nesting(), 1);
        }
        assert_eq!(zone.scope_nesting(), 0);
    }

    #[test]
    fn single_delete_on_exit_scope_frees() {
        let mut zone = zone();
        {
            let scope = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
            scope.allocate(100);
            assert!(scope.bytes_allocated_from_system() > 0);
        }
        assert_eq!(zone.stats().bulk_frees, 1);
        assert_eq!(zone.bytes_allocated_from_system(), 0);
    }

    #[test]
    fn dont_delete_scope_leaves_contents() {
        let mut zone = zone();
        {
            let scope = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
            scope.allocate(100);
        }
        assert_eq!(zone.stats().bulk_frees, 0);
        assert!(zone.bytes_allocated_from_system() > 0);
    }

    #[test]
    fn inner_delete_scope_does_not_free_outer_data() {
        // G1 dont-delete, G2 delete-on-exit: G2 unwinds at depth 1 and G1
        // is not delete-on-exit, so nothing is freed.
        let mut zone = zone();
        {
            let mut g1 = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
            let outer_ptr = g1.allocate(16);
            {
                let g2 = g1.nest(ZoneScopeMode::DeleteOnExit);
                g2.allocate(16);
                assert!(!g2.should_delete_on_exit());
            }
            assert_eq!(g1.stats().bulk_frees, 0);
            assert!(g1.contains_address(outer_ptr.as_ptr()));
        }
        assert_eq!(zone.stats().bulk_frees, 0);
    }

    #[test]
    fn outer_delete_scope_frees_once_after_inner() {
        // G1 delete-on-exit, G2 dont-delete: only G1's drop frees.
        let mut zone = zone();
        {
            let mut g1 = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
            {
                let g2 = g1.nest(ZoneScopeMode::DontDeleteOnExit);
                g2.allocate(16);
            }
            assert_eq!(g1.stats().bulk_frees, 0);
            assert!(g1.should_delete_on_exit());
        }
        assert_eq!(zone.stats().bulk_frees, 1);
    }

    #[test]
    fn upgrade_takes_effect_at_depth_zero() {
        let mut zone = zone();
        {
            let mut scope = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
            scope.allocate(16);
            assert!(!scope.should_delete_on_exit());
            scope.upgrade_to_delete_on_exit();
            assert_eq!(scope.mode(), ZoneScopeMode::DeleteOnExit);
            assert!(scope.should_delete_on_exit());
        }
        assert_eq!(zone.stats().bulk_frees, 1);
    }

    #[test]
    fn upgraded_inner_scope_still_waits_for_depth_zero() {
        let mut zone = zone();
        {
            let mut outer = ZoneScope::new(&mut zone, ZoneScopeMode::DontDeleteOnExit);
            {
                let mut inner = outer.nest(ZoneScopeMode::DontDeleteOnExit);
                inner.upgrade_to_delete_on_exit();
            }
            assert_eq!(outer.stats().bulk_frees, 0);
        }
        assert_eq!(zone.stats().bulk_frees, 0);
    }

    #[test]
    fn sequential_phases_each_free() {
        let mut zone = zone();
        for phase in 1..=3u64 {
            let scope = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
            scope.allocate(32);
            drop(scope);
            assert_eq!(zone.stats().bulk_frees, phase);
        }
        // Each phase fit in the kept segment after the first.
        assert_eq!(zone.kept_segment_bytes(), Some(64));
    }

    #[test]
    fn nested_scope_unwinds_before_outer_reuse() {
        let mut zone = zone();
        {
            let mut outer = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
            for _ in 0..3 {
                let mut inner = outer.nest(ZoneScopeMode::DeleteOnExit);
                let innermost = inner.nest(ZoneScopeMode::DeleteOnExit);
                innermost.allocate(16);
                assert_eq!(innermost.scope_nesting(), 3);
                drop(innermost);
                assert_eq!(inner.scope_nesting(), 2);
                assert!(!inner.should_delete_on_exit());
            }
            assert_eq!(outer.scope_nesting(), 1);
            assert_eq!(outer.stats().bulk_frees, 0);
        }
        assert_eq!(zone.stats().bulk_frees, 1);
    }

    #[test]
    fn debug_shows_mode_and_nesting() {
        let mut zone = zone();
        let scope = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
        let text = format!("{scope:?}");
        assert!(text.contains("DeleteOnExit"));
        assert!(text.contains("nesting: 1"));
    }
}
