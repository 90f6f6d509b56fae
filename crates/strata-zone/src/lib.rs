//! Segmented bump allocation with scope-based bulk deallocation.
//!
//! A [`Zone`] hands out memory by advancing a cursor through a chain of
//! segments obtained from the system allocator. Individual allocations are
//! never freed; instead the whole zone is released in one sweep when the
//! outermost delete-on-exit [`ZoneScope`] unwinds. This suits phase-scoped,
//! densely linked data such as a syntax tree built during compilation.
//!
//! # Architecture
//!
//! ```text
//! Zone (single-threaded, !Send + !Sync)
//! ├── [position, limit)      free range in the head segment
//! ├── Segment chain          newest at head, each owns the previous
//! │   └── RawBlock           payload from the system allocator
//! ├── kept segment           one small segment retained across bulk_free
//! └── counters               bytes from system, nesting, suppression
//!
//! ZoneScope                  nesting guard, bulk-frees at depth 0
//! AssertNoZoneAllocation     forbids allocation while alive
//! ```
//!
//! # Safety
//!
//! All `unsafe` code lives in `raw.rs` (system memory acquisition) and
//! `object.rs` (typed placement into zone memory). Typed references are
//! tied to a shared borrow of the zone, and [`Zone::bulk_free`] takes
//! `&mut self`, so no reference handed out by the zone can outlive the
//! segment it points into.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod no_alloc;
pub mod object;
pub mod policy;
mod raw;
pub mod scope;
pub mod segment;
pub mod stats;
pub mod zone;

// Public re-exports for the primary API surface.
pub use config::ZoneConfig;
pub use error::ZoneError;
pub use no_alloc::AssertNoZoneAllocation;
pub use object::ZoneObject;
pub use policy::AllocationPolicy;
pub use scope::{ZoneScope, ZoneScopeMode};
pub use segment::{SEGMENT_ALIGNMENT, ZONE_ALIGNMENT};
pub use stats::ZoneStats;
pub use zone::Zone;
