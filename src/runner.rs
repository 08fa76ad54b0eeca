//! Plugin run loop.
//!
//! Registers the charts once, then reports one update per `update_every`
//! interval until shutdown or until `retries` consecutive updates fail.

use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::RunError;
use crate::protocol;
use crate::service::DfService;

/// Scheduling settings handed over by the host.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub update_every: Duration,
    pub priority: u64,
    pub retries: u32,
    /// Stop after the first update.
    pub once: bool,
}

/// Why the run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// `once` was set and one update was attempted.
    Finished,
    /// The shutdown future completed.
    Stopped,
    /// Too many consecutive updates failed; the plugin disabled itself.
    RetriesExhausted,
}

/// Counts consecutive failed updates.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    total: u32,
    left: u32,
}

impl RetryBudget {
    pub fn new(total: u32) -> Self {
        Self { total, left: total }
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn record_success(&mut self) {
        self.left = self.total;
    }

    /// Returns `true` once the budget is used up.
    pub fn record_failure(&mut self) -> bool {
        self.left = self.left.saturating_sub(1);
        self.left == 0
    }
}

/// Runs `check()`, announces the charts and loops over updates.
///
/// A failing `check()` writes `DISABLE` and returns the collection error.
pub async fn run_plugin<W, F>(
    service: &mut DfService,
    options: &RunOptions,
    out: &mut W,
    shutdown: F,
) -> Result<RunOutcome, RunError>
where
    W: Write,
    F: Future<Output = ()>,
{
    let update_every = options.update_every.as_secs().max(1);

    if let Err(e) = service.check().await {
        error!("Initial check failed for {}: {}", service.source().describe(), e);
        protocol::write_disable(out)?;
        return Err(RunError::Check(e));
    }

    protocol::write_definitions(out, service.definitions(), options.priority, update_every)?;
    info!(
        "Announced {} charts, updating every {}s",
        service.definitions().len(),
        update_every
    );

    let mut budget = RetryBudget::new(options.retries);
    let mut last_update: Option<Instant> = None;
    // `interval` panics on a zero period
    let period = options.update_every.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping updates");
                return Ok(RunOutcome::Stopped);
            }
            _ = interval.tick() => {}
        }

        let start = Instant::now();
        match service.get_data().await {
            Ok(sample) => {
                let since_last = last_update.map(|t| start.duration_since(t));
                let charts =
                    protocol::write_update(out, service.definitions(), &sample, since_last)?;
                last_update = Some(start);
                budget.record_success();
                debug!(
                    "Update wrote {} charts for {} devices in {:.2}ms",
                    charts,
                    sample.drives.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                let exhausted = budget.record_failure();
                warn!("Update failed ({} retries left): {}", budget.left(), e);
                if exhausted {
                    error!(
                        "Giving up after {} consecutive failed updates",
                        options.retries
                    );
                    protocol::write_disable(out)?;
                    return Ok(RunOutcome::RetriesExhausted);
                }
            }
        }

        if options.once {
            return Ok(RunOutcome::Finished);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DeviceFilter;
    use crate::service::JobConfig;
    use crate::source::ReportSource;
    use std::io::Write as _;
    use std::path::PathBuf;

    fn options(retries: u32, once: bool) -> RunOptions {
        RunOptions {
            update_every: Duration::from_millis(10),
            priority: 60000,
            retries,
            once,
        }
    }

    fn service_for(path: PathBuf) -> DfService {
        DfService::new(&JobConfig {
            input_file: Some(path),
            ..JobConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_retry_budget() {
        let mut budget = RetryBudget::new(3);
        assert!(!budget.record_failure());
        assert!(!budget.record_failure());
        budget.record_success();
        assert_eq!(budget.left(), 3);
        assert!(!budget.record_failure());
        assert!(!budget.record_failure());
        assert!(budget.record_failure());
        assert_eq!(budget.left(), 0);
    }

    #[tokio::test]
    async fn test_run_once_writes_definitions_then_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Filesystem 1024-blocks Used Available Capacity Mounted on").unwrap();
        writeln!(file, "/dev/md3 976285620 1005888 975279732 1% /disk3").unwrap();
        writeln!(file, "tmpfs 3822880 0 3822880 0% /dev").unwrap();

        let mut service = service_for(file.path().to_path_buf());
        let mut out = Vec::new();
        let outcome = run_plugin(
            &mut service,
            &options(5, true),
            &mut out,
            std::future::pending(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, RunOutcome::Finished);

        let out = String::from_utf8(out).unwrap();
        let first_chart = out.find("CHART df.hdd_avail ").unwrap();
        let first_begin = out.find("BEGIN df.hdd_avail").unwrap();
        assert!(first_chart < first_begin);
        assert!(out.contains("SET 'hdd_used__dev_md3' = 1\n"));
        assert!(out.contains("SET 'hdd_avail_percentage__dev_md3' = 99\n"));
        assert!(!out.contains("tmpfs"));
    }

    #[tokio::test]
    async fn test_failed_check_disables() {
        let mut service = service_for(PathBuf::from("/nonexistent/report"));
        let mut out = Vec::new();
        let result = run_plugin(
            &mut service,
            &options(5, true),
            &mut out,
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(RunError::Check(_))));
        assert_eq!(String::from_utf8(out).unwrap(), "DISABLE\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retries_exhausted_disables() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran-once");
        // Succeeds on the first run only
        let script = format!(
            "if [ -e '{0}' ]; then exit 1; fi; touch '{0}'; \
             echo header; echo '/dev/md0 100 50 50 50% /'",
            marker.display()
        );
        let source = ReportSource::from_command(
            &["sh".to_string(), "-c".to_string(), script],
            Duration::from_secs(5),
        )
        .unwrap();
        let mut service = DfService::with_source(DeviceFilter::default(), source);

        let mut out = Vec::new();
        let outcome = run_plugin(
            &mut service,
            &options(2, false),
            &mut out,
            std::future::pending(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, RunOutcome::RetriesExhausted);

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("DIMENSION 'hdd_used__dev_md0'"));
        assert!(!out.contains("BEGIN"));
        assert!(out.ends_with("DISABLE\n"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "header").unwrap();
        writeln!(file, "/dev/md0 100 50 50 50% /").unwrap();

        let mut service = service_for(file.path().to_path_buf());
        let mut out = Vec::new();
        let outcome = run_plugin(&mut service, &options(5, false), &mut out, async {})
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Stopped);
    }
}
