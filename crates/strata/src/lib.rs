//! Zone allocation for phase-scoped data.
//!
//! Strata hands out memory from a [`Zone`](zone::Zone): a chain of
//! segments served by bumping a cursor, released all at once when the
//! outermost delete-on-exit [`ZoneScope`](zone::ZoneScope) unwinds. It is
//! built for workloads like compiler front ends, where a phase builds a
//! large, densely linked structure and then discards all of it.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! #[derive(Debug)]
//! struct Token<'z> {
//!     text: &'z str,
//!     offset: u32,
//! }
//! impl ZoneObject for Token<'_> {}
//!
//! let mut zone = Zone::new(ZoneConfig::default()).unwrap();
//! {
//!     let phase = ZoneScope::new(&mut zone, ZoneScopeMode::DeleteOnExit);
//!     let mut tokens = ZoneList::new(&phase);
//!     for (offset, word) in [(0, "let"), (4, "x")] {
//!         let text: &str = phase.alloc_str(word);
//!         let token: &Token = Token { text, offset }.new_in(&phase);
//!         tokens.push(token);
//!     }
//!     assert_eq!(tokens[1].text, "x");
//!     assert_eq!(tokens[1].offset, 4);
//! }
//! // The phase's memory went back in one sweep.
//! assert_eq!(zone.bytes_allocated_from_system(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`zone`] | `strata-zone` | Zone, segments, scopes, allocation guards, typed placement |
//! | [`collections`] | `strata-collections` | Zone-backed list and splay tree |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Zones, segments, scopes and typed placement (`strata-zone`).
///
/// Most users only need [`zone::Zone`], [`zone::ZoneScope`] and
/// [`zone::ZoneObject`], which are also in the [`prelude`].
pub use strata_zone as zone;

/// Containers whose storage lives in a zone (`strata-collections`).
///
/// [`collections::ZoneList`] for growable arrays,
/// [`collections::ZoneSplayTree`] for ordered maps.
pub use strata_collections as collections;

/// Common imports for typical strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Zone and configuration
    pub use strata_zone::{Zone, ZoneConfig, ZoneError, ZoneStats};

    // Scopes and guards
    pub use strata_zone::{AssertNoZoneAllocation, ZoneScope, ZoneScopeMode};

    // Typed placement and container plumbing
    pub use strata_zone::{AllocationPolicy, ZoneObject};

    // Containers
    pub use strata_collections::{ZoneList, ZoneSplayTree};
}
