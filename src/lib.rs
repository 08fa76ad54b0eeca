//! HDD Space Exporter Library
//!
//! This library collects per-filesystem disk space from a POSIX `df -P`
//! report and turns it into chart definitions and integer series for a
//! monitoring host.
//!
//! # Features
//!
//! - **Report Parsing**: Whitespace-delimited `df -P` rows, malformed rows skipped
//! - **Device Filter**: Regular expression over device paths (default `md[0-9]+$`)
//! - **Fixed Charts**: Space used/available in GB and percent, one line per device
//! - **Host Protocol**: `CHART`/`DIMENSION` announcements and `BEGIN`/`SET`/`END` updates
//!
//! # Usage
//!
//! ```rust
//! use hdd_space_exporter::{parse_report, DeviceFilter, Sample};
//!
//! let report = [
//!     "Filesystem 1024-blocks Used Available Capacity Mounted on",
//!     "/dev/md3 976285620 1005888 975279732 1% /disk3",
//!     "tmpfs 3822880 0 3822880 0% /dev",
//! ];
//!
//! let entries = parse_report(&report, &DeviceFilter::default());
//! let sample = Sample::from_entries(&entries);
//!
//! assert_eq!(sample.drives, vec!["/dev/md3"]);
//! assert_eq!(sample.get("hdd_avail__dev_md3"), Some(975));
//! assert_eq!(sample.get("hdd_avail_percentage__dev_md3"), Some(99));
//! ```

pub mod charts;
pub mod df;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod runner;
pub mod service;
pub mod source;

// Re-export main types for convenience
pub use charts::{build_definitions, dimension_id, ChartDefinition, ChartKind, Sample};
pub use df::{parse_line, parse_report, MountEntry};
pub use error::{CollectError, ConfigError, RunError};
pub use filter::{DeviceFilter, DEFAULT_HDD_REGEX};
pub use runner::{run_plugin, RunOptions, RunOutcome};
pub use service::{DfService, JobConfig};
pub use source::ReportSource;
