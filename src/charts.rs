//! Chart and series definitions for disk space metrics.
//!
//! Four fixed charts are registered, each with one line per matched device.
//! Series ids have the form `<chart id>__<device>`, where the device loses
//! its leading `/` and every other `/` becomes `_`, e.g. `hdd_used__dev_md3`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::df::MountEntry;

/// Chart family shown by the host.
pub const CHART_FAMILY: &str = "diskspace";

/// Chart context shared by all disk space charts.
pub const CHART_CONTEXT: &str = "df";

/// The four disk space charts, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    HddAvail,
    HddUsed,
    HddUsedPercentage,
    HddAvailPercentage,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::HddAvail,
        ChartKind::HddUsed,
        ChartKind::HddUsedPercentage,
        ChartKind::HddAvailPercentage,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ChartKind::HddAvail => "hdd_avail",
            ChartKind::HddUsed => "hdd_used",
            ChartKind::HddUsedPercentage => "hdd_used_percentage",
            ChartKind::HddAvailPercentage => "hdd_avail_percentage",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::HddAvail => "HDD space available in GB",
            ChartKind::HddUsed => "HDD space used in GB",
            ChartKind::HddUsedPercentage => "HDD space used in percent",
            ChartKind::HddAvailPercentage => "HDD space available in percent",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ChartKind::HddAvail | ChartKind::HddUsed => "GB",
            ChartKind::HddUsedPercentage | ChartKind::HddAvailPercentage => "%",
        }
    }

    /// Value this chart reports for one mount entry.
    pub fn value(self, entry: &MountEntry) -> i64 {
        match self {
            ChartKind::HddAvail => entry.avail_gb() as i64,
            ChartKind::HddUsed => entry.used_gb() as i64,
            ChartKind::HddUsedPercentage => entry.used_percent() as i64,
            ChartKind::HddAvailPercentage => entry.avail_percent() as i64,
        }
    }
}

/// Builds the series id for a chart/device pair.
pub fn dimension_id(chart_id: &str, device: &str) -> String {
    let device = device.strip_prefix('/').unwrap_or(device);
    format!("{}__{}", chart_id, device.replace('/', "_"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartType::Line => write!(f, "line"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Absolute,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Absolute => write!(f, "absolute"),
        }
    }
}

/// One data line of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartLine {
    pub id: String,
    pub name: String,
    pub algorithm: Algorithm,
}

/// A registered chart with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDefinition {
    pub kind: ChartKind,
    pub id: String,
    pub title: String,
    pub unit: String,
    pub family: String,
    pub context: String,
    pub chart_type: ChartType,
    pub lines: Vec<ChartLine>,
}

impl ChartDefinition {
    pub fn new<S: AsRef<str>>(kind: ChartKind, devices: &[S]) -> Self {
        let lines = devices
            .iter()
            .map(|device| ChartLine {
                id: dimension_id(kind.id(), device.as_ref()),
                name: device.as_ref().to_string(),
                algorithm: Algorithm::Absolute,
            })
            .collect();

        Self {
            kind,
            id: kind.id().to_string(),
            title: kind.title().to_string(),
            unit: kind.unit().to_string(),
            family: CHART_FAMILY.to_string(),
            context: CHART_CONTEXT.to_string(),
            chart_type: ChartType::Line,
            lines,
        }
    }
}

/// Builds all four chart definitions for the given devices, in order.
pub fn build_definitions<S: AsRef<str>>(devices: &[S]) -> Vec<ChartDefinition> {
    ChartKind::ALL
        .iter()
        .map(|&kind| ChartDefinition::new(kind, devices))
        .collect()
}

/// Result of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// Matched devices in report order.
    pub drives: Vec<String>,
    /// Series id to value.
    pub values: BTreeMap<String, i64>,
}

impl Sample {
    pub fn from_entries(entries: &[MountEntry]) -> Self {
        let mut sample = Sample::default();
        for entry in entries {
            sample.drives.push(entry.device.clone());
            for kind in ChartKind::ALL {
                sample
                    .values
                    .insert(dimension_id(kind.id(), &entry.device), kind.value(entry));
            }
        }
        sample
    }

    pub fn get(&self, series_id: &str) -> Option<i64> {
        self.values.get(series_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::df::parse_line;

    #[test]
    fn test_dimension_id_replaces_slashes() {
        assert_eq!(dimension_id("hdd_used", "/dev/md3"), "hdd_used__dev_md3");
        assert_eq!(
            dimension_id("hdd_avail", "/dev/mapper/vg/root"),
            "hdd_avail__dev_mapper_vg_root"
        );
        assert_eq!(dimension_id("hdd_avail", "rootfs"), "hdd_avail__rootfs");
    }

    #[test]
    fn test_build_definitions_order_and_lines() {
        let defs = build_definitions(&["/dev/md3", "/dev/md4"]);
        let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "hdd_avail",
                "hdd_used",
                "hdd_used_percentage",
                "hdd_avail_percentage"
            ]
        );

        let used = &defs[1];
        assert_eq!(used.title, "HDD space used in GB");
        assert_eq!(used.unit, "GB");
        assert_eq!(used.family, "diskspace");
        assert_eq!(used.context, "df");
        assert_eq!(used.chart_type, ChartType::Line);
        assert_eq!(used.lines.len(), 2);
        assert_eq!(used.lines[0].id, "hdd_used__dev_md3");
        assert_eq!(used.lines[0].name, "/dev/md3");
        assert_eq!(used.lines[0].algorithm, Algorithm::Absolute);
        assert_eq!(defs[3].unit, "%");
    }

    #[test]
    fn test_build_definitions_without_devices() {
        let defs = build_definitions::<&str>(&[]);
        assert_eq!(defs.len(), 4);
        assert!(defs.iter().all(|d| d.lines.is_empty()));
    }

    #[test]
    fn test_sample_from_entries() {
        let entry = parse_line("/dev/md3 976285620 1005888 975279732 1% /disk3").unwrap();
        let sample = Sample::from_entries(&[entry]);

        assert_eq!(sample.drives, vec!["/dev/md3".to_string()]);
        assert_eq!(sample.values.len(), 4);
        assert_eq!(sample.get("hdd_used__dev_md3"), Some(1));
        assert_eq!(sample.get("hdd_avail__dev_md3"), Some(975));
        assert_eq!(sample.get("hdd_used_percentage__dev_md3"), Some(1));
        assert_eq!(sample.get("hdd_avail_percentage__dev_md3"), Some(99));
    }
}
