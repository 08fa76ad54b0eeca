//! Prometheus metrics definitions for hdd-space-exporter.
//!
//! One gauge vector per disk space chart, labelled by device, plus a few
//! exporter-internal gauges about the last collection.

use hdd_space_exporter::{dimension_id, ChartKind, Sample};
use prometheus::{Gauge, GaugeVec, Opts, Registry};

/// Collection of Prometheus metrics for the serve mode.
#[derive(Clone)]
pub struct DiskSpaceMetrics {
    // ========== Disk Space Metrics ==========
    pub avail_gigabytes: GaugeVec,       // labels: device
    pub used_gigabytes: GaugeVec,        // labels: device
    pub used_percent: GaugeVec,          // labels: device
    pub avail_percent: GaugeVec,         // labels: device

    // ========== Exporter Metrics ==========
    pub collection_duration_seconds: Gauge,
    pub collection_success: Gauge,
    pub devices: Gauge,
}

impl DiskSpaceMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let avail_gigabytes = GaugeVec::new(
            Opts::new(
                "hdd_space_avail_gigabytes",
                "HDD space available in GB (10^6 kB)",
            ),
            &["device"],
        )?;
        let used_gigabytes = GaugeVec::new(
            Opts::new("hdd_space_used_gigabytes", "HDD space used in GB (10^6 kB)"),
            &["device"],
        )?;
        let used_percent = GaugeVec::new(
            Opts::new("hdd_space_used_percent", "HDD space used in percent"),
            &["device"],
        )?;
        let avail_percent = GaugeVec::new(
            Opts::new("hdd_space_avail_percent", "HDD space available in percent"),
            &["device"],
        )?;

        let collection_duration_seconds = Gauge::new(
            "hdd_space_exporter_collection_duration_seconds",
            "Time spent running and parsing the last df report",
        )?;
        let collection_success = Gauge::new(
            "hdd_space_exporter_collection_success",
            "Whether the last collection was successful (1) or failed (0)",
        )?;
        let devices = Gauge::new(
            "hdd_space_exporter_devices",
            "Number of devices registered for reporting",
        )?;

        registry.register(Box::new(avail_gigabytes.clone()))?;
        registry.register(Box::new(used_gigabytes.clone()))?;
        registry.register(Box::new(used_percent.clone()))?;
        registry.register(Box::new(avail_percent.clone()))?;
        registry.register(Box::new(collection_duration_seconds.clone()))?;
        registry.register(Box::new(collection_success.clone()))?;
        registry.register(Box::new(devices.clone()))?;

        Ok(Self {
            avail_gigabytes,
            used_gigabytes,
            used_percent,
            avail_percent,
            collection_duration_seconds,
            collection_success,
            devices,
        })
    }

    fn gauge_for(&self, kind: ChartKind) -> &GaugeVec {
        match kind {
            ChartKind::HddAvail => &self.avail_gigabytes,
            ChartKind::HddUsed => &self.used_gigabytes,
            ChartKind::HddUsedPercentage => &self.used_percent,
            ChartKind::HddAvailPercentage => &self.avail_percent,
        }
    }

    /// Replaces all device gauges with the values of `sample`.
    ///
    /// Only `registered` devices are exported; a registered device missing
    /// from the sample gets no series. Returns the number of series set.
    pub fn set_sample<S: AsRef<str>>(&self, sample: &Sample, registered: &[S]) -> usize {
        let mut series = 0;
        for kind in ChartKind::ALL {
            let gauge = self.gauge_for(kind);
            gauge.reset();
            for device in registered {
                let device = device.as_ref();
                if let Some(value) = sample.get(&dimension_id(kind.id(), device)) {
                    gauge.with_label_values(&[device]).set(value as f64);
                    series += 1;
                }
            }
        }
        self.devices.set(registered.len() as f64);
        series
    }
}
