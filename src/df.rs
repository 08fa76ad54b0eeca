//! Parser for POSIX `df -P` reports.
//!
//! Expected input format:
//! ```text
//! Filesystem     1024-blocks    Used Available Capacity Mounted on
//! /dev/loop0        20971520 1970384  17085360      11% /
//! tmpfs              3822880       0   3822880       0% /dev
//! /dev/md3         976285620 1005888 975279732       1% /disk3
//! ```
//!
//! Sizes are 1024-byte blocks (kB). Rows that cannot be parsed are skipped
//! without raising an error.

use serde::Serialize;
use tracing::trace;

use crate::filter::DeviceFilter;

/// kB per reported GB.
pub const KB_PER_GB: u64 = 1_000_000;

/// Minimum number of fields in a usable row: device, total, used, available, capacity.
const MIN_FIELDS: usize = 5;

/// One filesystem row of a `df -P` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEntry {
    pub device: String,
    pub total_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
    /// Capacity column, always within 0..=100.
    pub capacity_percent: u8,
    /// Empty when the row has no mount column.
    pub mount_point: String,
}

impl MountEntry {
    pub fn used_gb(&self) -> u64 {
        self.used_kb / KB_PER_GB
    }

    pub fn avail_gb(&self) -> u64 {
        self.available_kb / KB_PER_GB
    }

    pub fn used_percent(&self) -> u8 {
        self.capacity_percent
    }

    pub fn avail_percent(&self) -> u8 {
        100 - self.capacity_percent
    }
}

/// Parses a single data row. Returns `None` for blank, short or malformed rows.
pub fn parse_line(line: &str) -> Option<MountEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return None;
    }

    let capacity_field = parts[4];
    let capacity_percent: u8 = capacity_field
        .strip_suffix('%')
        .unwrap_or(capacity_field)
        .parse()
        .ok()?;
    if capacity_percent > 100 {
        return None;
    }

    Some(MountEntry {
        device: parts[0].to_string(),
        total_kb: parts[1].parse().ok()?,
        used_kb: parts[2].parse().ok()?,
        available_kb: parts[3].parse().ok()?,
        capacity_percent,
        mount_point: parts[MIN_FIELDS..].join(" "),
    })
}

/// Parses a full report (header included) and keeps the rows whose device
/// matches `filter`, in report order.
pub fn parse_report<S: AsRef<str>>(lines: &[S], filter: &DeviceFilter) -> Vec<MountEntry> {
    let mut entries = Vec::new();

    // First line is the column header
    for line in lines.iter().skip(1) {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }

        let Some(entry) = parse_line(line) else {
            trace!("Skipping malformed df line: {:?}", line);
            continue;
        };

        if !filter.is_match(&entry.device) {
            trace!("Device {} does not match filter", entry.device);
            continue;
        }

        entries.push(entry);
    }

    entries
}
