//! Application state management for the serve mode.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use hdd_space_exporter::DfService;
use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::MetricsCache;
use crate::config::Config;
use crate::health_stats::HealthStats;
use crate::metrics::DiskSpaceMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub metrics: DiskSpaceMetrics,
    pub scrape_duration: Gauge,
    pub cache: RwLock<MetricsCache>,
    pub cache_ttl: Duration,
    /// Serializes collections so concurrent scrapes run `df` only once.
    pub collect_lock: Mutex<()>,
    pub service: DfService,
    /// Devices registered by the initial check.
    pub devices: Vec<String>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
}

impl AppState {
    /// Builds the state for a service whose `check()` already ran.
    ///
    /// Registers all metrics in a fresh registry. The cache starts empty.
    pub fn new(service: DfService, config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();
        let metrics = DiskSpaceMetrics::new(&registry)?;
        let scrape_duration = Gauge::new(
            "hdd_space_exporter_scrape_duration_seconds",
            "Time spent serving /metrics request",
        )?;
        registry.register(Box::new(scrape_duration.clone()))?;
        debug!("All metrics registered successfully");

        let devices: Vec<String> = service
            .registered_devices()
            .into_iter()
            .map(String::from)
            .collect();
        metrics.devices.set(devices.len() as f64);

        Ok(Self {
            registry,
            metrics,
            scrape_duration,
            cache: RwLock::new(MetricsCache::default()),
            cache_ttl: Duration::from_secs(config.effective_cache_ttl()),
            collect_lock: Mutex::new(()),
            service,
            devices,
            config: Arc::new(config),
            health_stats: Arc::new(HealthStats::new()),
        })
    }

    /// Re-runs the collection when the cached sample is stale.
    ///
    /// Returns `true` when a fresh collection was attempted.
    pub async fn refresh_if_stale(&self) -> bool {
        if !self.cache.read().await.is_stale(self.cache_ttl) {
            self.health_stats.record_cache_hit();
            return false;
        }

        let _guard = self.collect_lock.lock().await;
        // Another request may have refreshed while we waited
        if !self.cache.read().await.is_stale(self.cache_ttl) {
            self.health_stats.record_cache_hit();
            return false;
        }

        let start = Instant::now();
        let result = self.service.get_data().await;
        let duration = start.elapsed().as_secs_f64();

        let mut cache = self.cache.write().await;
        cache.last_updated = Some(Instant::now());
        cache.update_duration_seconds = duration;

        match result {
            Ok(sample) => {
                debug!(
                    "Collected {} devices in {:.2}ms",
                    sample.drives.len(),
                    duration * 1000.0
                );
                self.health_stats
                    .record_collection_success(duration, sample.drives.len());
                self.metrics.set_sample(&sample, &self.devices);
                cache.sample = sample;
                cache.update_success = true;
            }
            Err(e) => {
                warn!("Collection failed: {}", e);
                self.health_stats
                    .record_collection_failure(duration, &e.to_string());
                cache.update_success = false;
            }
        }

        self.metrics.collection_duration_seconds.set(duration);
        self.metrics
            .collection_success
            .set(if cache.update_success { 1.0 } else { 0.0 });
        true
    }
}
