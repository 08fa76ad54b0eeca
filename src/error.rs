//! Error types for the disk space collector.

use std::path::PathBuf;
use std::time::Duration;

/// Failure to obtain a disk usage report for one collection cycle.
///
/// Malformed report lines are not errors; they are skipped by the parser.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` did not finish within {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with {status}: {stderr}")]
    ExitStatus {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("failed to read report from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report is empty")]
    EmptyOutput,

    #[error("no report command configured")]
    NoCommand,
}

/// Invalid job configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid hdd_regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Failure of the plugin run loop.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("initial check failed: {0}")]
    Check(#[source] CollectError),

    #[error("failed to write to host: {0}")]
    Output(#[from] std::io::Error),
}
