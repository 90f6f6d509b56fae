//! Zone-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur when constructing a zone.
///
/// Allocation itself never returns an error: exhausting the system
/// allocator is fatal, and protocol violations are assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneError {
    /// The [`ZoneConfig`](crate::ZoneConfig) failed validation.
    InvalidConfig {
        /// Human-readable description of the violated constraint.
        reason: String,
    },
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid zone config: {reason}")
            }
        }
    }
}

impl Error for ZoneError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = ZoneError::InvalidConfig {
            reason: "min_segment_bytes must be non-zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid zone config: min_segment_bytes must be non-zero"
        );
    }
}
