//! Disk space collection job.
//!
//! The host drives a job through `check()` once, then `get_data()` on every
//! update. Chart definitions are fixed by the first successful `check()`.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::charts::{build_definitions, ChartDefinition, Sample};
use crate::df::{parse_report, MountEntry};
use crate::error::{CollectError, ConfigError};
use crate::filter::{DeviceFilter, DEFAULT_HDD_REGEX};
use crate::source::{ReportSource, DEFAULT_COMMAND, DEFAULT_COMMAND_TIMEOUT};

/// Chart type prefix used when registering charts with the host.
pub const CHART_NAME: &str = "df";

pub const DEFAULT_UPDATE_EVERY: u64 = 60;
pub const DEFAULT_PRIORITY: u64 = 60000;
pub const DEFAULT_RETRIES: u32 = 60;

/// Settings for a single collection job.
///
/// `update_every`, `priority` and `retries` are not interpreted by the job
/// itself; they are handed to whatever schedules it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub hdd_regex: String,
    pub command: Vec<String>,
    pub command_timeout: Duration,
    pub input_file: Option<PathBuf>,
    pub update_every: u64,
    pub priority: u64,
    pub retries: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            hdd_regex: DEFAULT_HDD_REGEX.to_string(),
            command: DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            input_file: None,
            update_every: DEFAULT_UPDATE_EVERY,
            priority: DEFAULT_PRIORITY,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl JobConfig {
    /// Report source selected by this job: the input file if set, else the command.
    pub fn source(&self) -> Result<ReportSource, CollectError> {
        match &self.input_file {
            Some(path) => Ok(ReportSource::File(path.clone())),
            None => ReportSource::from_command(&self.command, self.command_timeout),
        }
    }
}

/// A disk space collection job.
#[derive(Debug)]
pub struct DfService {
    filter: DeviceFilter,
    source: ReportSource,
    definitions: Vec<ChartDefinition>,
}

impl DfService {
    pub fn new(job: &JobConfig) -> Result<Self, ConfigError> {
        let filter = DeviceFilter::new(&job.hdd_regex)?;
        let source = job
            .source()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::with_source(filter, source))
    }

    pub fn with_source(filter: DeviceFilter, source: ReportSource) -> Self {
        Self {
            filter,
            source,
            definitions: Vec::new(),
        }
    }

    pub fn filter(&self) -> &DeviceFilter {
        &self.filter
    }

    pub fn source(&self) -> &ReportSource {
        &self.source
    }

    /// Runs one collection and fixes the chart definitions from its devices.
    pub async fn check(&mut self) -> Result<&[ChartDefinition], CollectError> {
        let sample = self.get_data().await?;
        if sample.is_empty() {
            warn!(
                "No devices match hdd_regex '{}' - nothing will be reported",
                self.filter.as_str()
            );
        } else {
            info!(
                "Registering {} device(s): {}",
                sample.drives.len(),
                sample.drives.join(", ")
            );
        }

        self.definitions = build_definitions(&sample.drives);
        Ok(&self.definitions)
    }

    /// Chart definitions set by the last successful `check()`.
    pub fn definitions(&self) -> &[ChartDefinition] {
        &self.definitions
    }

    /// Chart ids in registration order.
    pub fn order(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.id.as_str()).collect()
    }

    /// Devices registered by `check()`, in order.
    pub fn registered_devices(&self) -> Vec<&str> {
        self.definitions
            .first()
            .map(|d| d.lines.iter().map(|l| l.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Reads and parses one report, returning the matched entries.
    pub async fn collect_entries(&self) -> Result<Vec<MountEntry>, CollectError> {
        let lines = self.source.read_lines().await?;
        let entries = parse_report(&lines, &self.filter);
        debug!(
            "Parsed {} matching entries from {} lines",
            entries.len(),
            lines.len()
        );
        Ok(entries)
    }

    /// Runs one collection pass.
    pub async fn get_data(&self) -> Result<Sample, CollectError> {
        let entries = self.collect_entries().await?;
        Ok(Sample::from_entries(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn report_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Filesystem 1024-blocks Used Available Capacity Mounted on").unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    fn job_for(file: &tempfile::NamedTempFile) -> JobConfig {
        JobConfig {
            input_file: Some(file.path().to_path_buf()),
            ..JobConfig::default()
        }
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let job = JobConfig {
            hdd_regex: "(".to_string(),
            ..JobConfig::default()
        };
        assert!(matches!(
            DfService::new(&job),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_empty_command_rejected() {
        let job = JobConfig {
            command: Vec::new(),
            ..JobConfig::default()
        };
        assert!(matches!(DfService::new(&job), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_check_registers_matched_devices() {
        let file = report_file(
            "/dev/md3 976285620 1005888 975279732 1% /disk3\n\
             tmpfs 3822880 0 3822880 0% /dev\n\
             /dev/md4 976285620 1005888 975279732 13% /disk4\n",
        );
        let mut service = DfService::new(&job_for(&file)).unwrap();
        assert!(service.definitions().is_empty());

        let defs = service.check().await.unwrap();
        assert_eq!(defs.len(), 4);
        assert_eq!(defs[0].lines.len(), 2);

        assert_eq!(
            service.order(),
            vec![
                "hdd_avail",
                "hdd_used",
                "hdd_used_percentage",
                "hdd_avail_percentage"
            ]
        );
        assert_eq!(service.registered_devices(), vec!["/dev/md3", "/dev/md4"]);
    }

    #[tokio::test]
    async fn test_check_without_matches_registers_empty_charts() {
        let file = report_file("tmpfs 3822880 0 3822880 0% /dev\n");
        let mut service = DfService::new(&job_for(&file)).unwrap();

        let defs = service.check().await.unwrap();
        assert!(defs.iter().all(|d| d.lines.is_empty()));
        assert!(service.registered_devices().is_empty());
    }

    #[tokio::test]
    async fn test_check_fails_when_source_fails() {
        let job = JobConfig {
            input_file: Some(PathBuf::from("/nonexistent/report")),
            ..JobConfig::default()
        };
        let mut service = DfService::new(&job).unwrap();
        assert!(service.check().await.is_err());
        assert!(service.definitions().is_empty());
    }

    #[tokio::test]
    async fn test_get_data_values() {
        let file = report_file("/dev/md3 976285620 1005888 975279732 1% /disk3\n");
        let service = DfService::new(&job_for(&file)).unwrap();

        let sample = service.get_data().await.unwrap();
        assert_eq!(sample.get("hdd_used__dev_md3"), Some(1));
        assert_eq!(sample.get("hdd_avail__dev_md3"), Some(975));
        assert_eq!(sample.get("hdd_used_percentage__dev_md3"), Some(1));
        assert_eq!(sample.get("hdd_avail_percentage__dev_md3"), Some(99));
    }
}
