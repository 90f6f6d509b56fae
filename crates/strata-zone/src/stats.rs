//! Point-in-time zone accounting.

/// Snapshot of a zone's accounting counters.
///
/// Produced by [`Zone::stats`](crate::Zone::stats). Owning contexts use it
/// for telemetry and to decide when a collection pass is worthwhile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneStats {
    /// Number of segments currently in the chain (the kept segment excluded).
    pub segment_count: usize,
    /// Sum of the capacities of segments obtained since the last bulk free.
    pub bytes_allocated_from_system: usize,
    /// Sum of rounded request sizes handed out since the last bulk free.
    pub bytes_handed_out: usize,
    /// Capacity of the segment retained across the last bulk free, if any.
    pub kept_segment_bytes: Option<usize>,
    /// Number of bulk frees performed over the zone's lifetime.
    pub bulk_frees: u64,
    /// Number of currently live [`ZoneScope`](crate::ZoneScope)s.
    pub scope_nesting: u32,
}

impl ZoneStats {
    /// Bytes obtained from the system but not handed out: padding, unused
    /// tails of retired segments, and the free range of the head segment.
    pub fn slack_bytes(&self) -> usize {
        self.bytes_allocated_from_system
            .saturating_sub(self.bytes_handed_out)
    }
}
