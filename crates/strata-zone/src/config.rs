//! Zone configuration parameters.

use crate::error::ZoneError;

/// Configuration for a [`Zone`](crate::Zone).
///
/// Controls segment sizing, kept-segment retention, and the advisory
/// excess-allocation threshold. Validated when the zone is constructed;
/// immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneConfig {
    /// Never allocate segments smaller than this, in bytes.
    ///
    /// Default: 8 KiB. Must be non-zero.
    pub min_segment_bytes: usize,

    /// Never allocate segments larger than this, in bytes, unless a single
    /// request is itself larger (that request gets an exactly-sized segment).
    ///
    /// Default: 1 MiB.
    pub max_segment_bytes: usize,

    /// Largest head segment retained across [`Zone::bulk_free`](crate::Zone::bulk_free).
    ///
    /// Default: 64 KiB. Zero disables retention.
    pub max_kept_segment_bytes: usize,

    /// Bytes obtained from the system above which
    /// [`Zone::is_over_excess_threshold`](crate::Zone::is_over_excess_threshold)
    /// reports `true`.
    ///
    /// Default: 256 MiB.
    pub excess_threshold_bytes: usize,
}

impl ZoneConfig {
    /// Default minimum segment size: 8 KiB.
    pub const DEFAULT_MIN_SEGMENT_BYTES: usize = 8 * 1024;

    /// Default maximum segment size: 1 MiB.
    pub const DEFAULT_MAX_SEGMENT_BYTES: usize = 1024 * 1024;

    /// Default maximum kept-segment size: 64 KiB.
    pub const DEFAULT_MAX_KEPT_SEGMENT_BYTES: usize = 64 * 1024;

    /// Default excess-allocation threshold: 256 MiB.
    pub const DEFAULT_EXCESS_THRESHOLD_BYTES: usize = 256 * 1024 * 1024;

    /// Upper bound accepted for `max_segment_bytes`.
    ///
    /// Leaves headroom so that the growth arithmetic and `Layout`
    /// construction can never overflow.
    pub const MAX_SEGMENT_LIMIT: usize = isize::MAX as usize / 2;

    /// Create a config with all default values.
    pub fn new() -> Self {
        Self {
            min_segment_bytes: Self::DEFAULT_MIN_SEGMENT_BYTES,
            max_segment_bytes: Self::DEFAULT_MAX_SEGMENT_BYTES,
            max_kept_segment_bytes: Self::DEFAULT_MAX_KEPT_SEGMENT_BYTES,
            excess_threshold_bytes: Self::DEFAULT_EXCESS_THRESHOLD_BYTES,
        }
    }

    /// Set the minimum segment size.
    pub fn with_min_segment_bytes(mut self, bytes: usize) -> Self {
        self.min_segment_bytes = bytes;
        self
    }

    /// Set the maximum segment size.
    pub fn with_max_segment_bytes(mut self, bytes: usize) -> Self {
        self.max_segment_bytes = bytes;
        self
    }

    /// Set the maximum kept-segment size.
    pub fn with_max_kept_segment_bytes(mut self, bytes: usize) -> Self {
        self.max_kept_segment_bytes = bytes;
        self
    }

    /// Set the excess-allocation threshold.
    pub fn with_excess_threshold_bytes(mut self, bytes: usize) -> Self {
        self.excess_threshold_bytes = bytes;
        self
    }

    /// Check the structural invariants of this config.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::InvalidConfig`] if the minimum segment size is
    /// zero, exceeds the maximum, or the maximum is above
    /// [`MAX_SEGMENT_LIMIT`](Self::MAX_SEGMENT_LIMIT).
    pub fn validate(&self) -> Result<(), ZoneError> {
        if self.min_segment_bytes == 0 {
            return Err(ZoneError::InvalidConfig {
                reason: "min_segment_bytes must be non-zero".into(),
            });
        }
        if self.min_segment_bytes > self.max_segment_bytes {
            return Err(ZoneError::InvalidConfig {
                reason: format!(
                    "min_segment_bytes ({}) exceeds max_segment_bytes ({})",
                    self.min_segment_bytes, self.max_segment_bytes
                ),
            });
        }
        if self.max_segment_bytes > Self::MAX_SEGMENT_LIMIT {
            return Err(ZoneError::InvalidConfig {
                reason: format!(
                    "max_segment_bytes ({}) exceeds limit ({})",
                    self.max_segment_bytes,
                    Self::MAX_SEGMENT_LIMIT
                ),
            });
        }
        Ok(())
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self::new()
    }
}
