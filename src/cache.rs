//! Cache for the last disk space collection.
//!
//! This module provides the `MetricsCache` structure holding the last sample
//! served by `/metrics`, along with metadata about the cache state.

use hdd_space_exporter::Sample;
use std::time::{Duration, Instant};

/// Cache state for the last collection with update timing information.
#[derive(Clone, Default)]
pub struct MetricsCache {
    pub sample: Sample,
    pub last_updated: Option<Instant>,
    pub update_duration_seconds: f64,
    pub update_success: bool,
}

impl MetricsCache {
    /// Whether the cached sample is older than `ttl` (or was never filled).
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.last_updated.map_or(true, |t| t.elapsed() >= ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stale() {
        let mut cache = MetricsCache::default();
        assert!(cache.is_stale(Duration::from_secs(60)));

        cache.last_updated = Some(Instant::now());
        assert!(!cache.is_stale(Duration::from_secs(60)));
        assert!(cache.is_stale(Duration::ZERO));
    }
}
