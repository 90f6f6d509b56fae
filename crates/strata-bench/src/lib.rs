//! Benchmark workloads for the strata zone allocator.
//!
//! - [`compile_profile`]: zone sizing used for compile-phase workloads
//! - [`request_sizes`]: deterministic mix of small allocation sizes
//! - [`run_phase`]: one delete-on-exit phase serving a batch of requests

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_test_utils::SizeStream;
use strata_zone::{Zone, ZoneConfig, ZoneScope, ZoneScopeMode};

/// Zone sizing for compile-phase benchmarks.
///
/// Default growth limits with a kept segment large enough that a typical
/// phase restarts in the retained segment.
pub fn compile_profile() -> ZoneConfig {
    ZoneConfig::new().with_max_kept_segment_bytes(256 * 1024)
}

/// `count` request sizes in `1..=max`, reproducible from `seed`.
pub fn request_sizes(seed: u64, count: usize, max: usize) -> Vec<usize> {
    SizeStream::new(seed, max.saturating_sub(1))
        .take(count)
        .map(|size| size + 1)
        .collect()
}

/// Serve `sizes` inside a delete-on-exit scope.
///
/// Returns the bytes obtained from the system before the scope freed them.
pub fn run_phase(zone: &mut Zone, sizes: &[usize]) -> usize {
    let scope = ZoneScope::new(zone, ZoneScopeMode::DeleteOnExit);
    for &size in sizes {
        scope.allocate(size);
    }
    scope.bytes_allocated_from_system()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_profile_validates() {
        compile_profile().validate().unwrap();
    }

    #[test]
    fn request_sizes_are_non_zero_and_bounded() {
        let sizes = request_sizes(7, 1000, 64);
        assert_eq!(sizes.len(), 1000);
        assert!(sizes.iter().all(|&s| (1..=64).contains(&s)));
        assert_eq!(sizes, request_sizes(7, 1000, 64));
    }

    #[test]
    fn run_phase_frees_on_exit() {
        let mut zone = Zone::new(compile_profile()).unwrap();
        let sizes = request_sizes(1, 500, 48);
        let used = run_phase(&mut zone, &sizes);
        assert!(used >= sizes.iter().sum::<usize>());
        assert_eq!(zone.bytes_allocated_from_system(), 0);
        assert_eq!(zone.stats().bulk_frees, 1);
        assert!(zone.kept_segment_bytes().is_some());
    }
}
