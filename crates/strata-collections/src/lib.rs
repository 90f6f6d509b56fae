//! Containers whose storage lives in a [`Zone`](strata_zone::Zone).
//!
//! - [`ZoneList`]: growable array with constant-time indexing.
//! - [`ZoneSplayTree`]: ordered map with amortised logarithmic operations.
//!
//! Neither container frees anything on its own. Storage abandoned by growth
//! or removal is handed to the zone's no-op
//! [`deallocate`](strata_zone::AllocationPolicy::deallocate) and reclaimed
//! only when the zone is bulk-freed. Element types must be `Copy`, so no
//! destructor is ever skipped.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod list;
pub mod splay;

pub use list::ZoneList;
pub use splay::ZoneSplayTree;
