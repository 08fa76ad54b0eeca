//! Health statistics for the exporter.
//!
//! This module tracks collection performance and HTTP request counts for
//! the `/health` endpoint.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe window of recent HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only the last minute
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Duration::from_secs(60))
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            guard
                .iter()
                .filter(|t| t.elapsed() <= Duration::from_secs(60))
                .count() as u64
        } else {
            0
        }
    }
}

/// Collection and request statistics of the exporter.
pub struct HealthStats {
    pub collection_duration_seconds: Stat,
    pub matched_devices: Stat,
    pub collection_success_count: AtomicU64,
    pub collection_failure_count: AtomicU64,
    pub cache_hits: AtomicU64,
    pub metrics_endpoint_calls: AtomicU64,
    pub http_request_timestamps: RequestTimestamps,
    pub start_time: Instant,
    pub last_collection_time: StdRwLock<Option<DateTime<Local>>>,
    pub last_error: StdRwLock<Option<String>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            collection_duration_seconds: Stat::default(),
            matched_devices: Stat::default(),
            collection_success_count: AtomicU64::new(0),
            collection_failure_count: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            metrics_endpoint_calls: AtomicU64::new(0),
            http_request_timestamps: RequestTimestamps::default(),
            start_time: Instant::now(),
            last_collection_time: StdRwLock::new(None),
            last_error: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_collection_success(&self, duration_seconds: f64, devices: usize) {
        self.collection_duration_seconds.add_sample(duration_seconds);
        self.matched_devices.add_sample(devices as f64);
        self.collection_success_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_collection_time.write() {
            *guard = Some(Local::now());
        }
        if let Ok(mut guard) = self.last_error.write() {
            *guard = None;
        }
    }

    pub fn record_collection_failure(&self, duration_seconds: f64, error: &str) {
        self.collection_duration_seconds.add_sample(duration_seconds);
        self.collection_failure_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.write() {
            *guard = Some(error.to_string());
        }
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_collection_success_rate(&self) -> f64 {
        let success = self.collection_success_count.load(Ordering::Relaxed);
        let failure = self.collection_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_collection_time_str(&self) -> String {
        match self.last_collection_time.read() {
            Ok(guard) => guard
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            Err(_) => "N/A".to_string(),
        }
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, cd_count) =
            self.collection_duration_seconds.snapshot();
        let (md_cur, md_avg, md_max, md_min, _) = self.matched_devices.snapshot();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();
        writeln!(
            out,
            "{:left$} | {:>col$.2} | {:>col$.2} | {:>col$.2} | {:>col$.2}",
            "collection duration (ms)",
            cd_cur * 1000.0,
            cd_avg * 1000.0,
            cd_max * 1000.0,
            cd_min * 1000.0,
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:>col$.0} | {:>col$.1} | {:>col$.0} | {:>col$.0}",
            "matched devices",
            md_cur,
            md_avg,
            md_max,
            md_min,
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out).ok();

        writeln!(out, "{:left$} : {}", "collections", cd_count, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {:.1}%",
            "collection success rate",
            self.get_collection_success_rate(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "cache hits",
            self.cache_hits.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "/metrics calls",
            self.metrics_endpoint_calls.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "http requests (last min)",
            self.http_request_timestamps.count_last_minute(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "last collection",
            self.get_last_collection_time_str(),
            left = left_col
        )
        .ok();
        if let Ok(guard) = self.last_error.read() {
            if let Some(err) = guard.as_deref() {
                writeln!(out, "{:left$} : {}", "last error", err, left = left_col).ok();
            }
        }

        out
    }
}
