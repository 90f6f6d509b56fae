//! Guard asserting that a region of code never allocates in a zone.
//!
//! [`AssertNoZoneAllocation`] raises the zone's suppression depth for its
//! lifetime. In debug builds any [`Zone::allocate`] call made while the
//! depth is non-zero panics. Guards nest; each restores exactly the depth it
//! found. Release builds keep the counter but skip the check.

use crate::zone::Zone;

/// Scoped proof that no zone allocation happens while it is alive.
#[must_use]
pub struct AssertNoZoneAllocation<'z> {
    zone: &'z Zone,
    prev: bool,
}

impl<'z> AssertNoZoneAllocation<'z> {
    /// Forbid allocation in `zone` until the guard is dropped.
    pub fn new(zone: &'z Zone) -> Self {
        let prev = zone.suppress_allocation();
        Self { zone, prev }
    }

    /// Whether allocation was already forbidden when this guard was created.
    pub fn was_already_active(&self) -> bool {
        self.prev
    }
}

impl Drop for AssertNoZoneAllocation<'_> {
    fn drop(&mut self) {
        self.zone.restore_allocation();
    }
}

impl std::fmt::Debug for AssertNoZoneAllocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertNoZoneAllocation")
            .field("prev", &self.prev)
            .finish()
    }
}
