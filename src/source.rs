//! Raw report sources.
//!
//! A report is normally the stdout of `df -P`; for debugging and tests it can
//! also be read from a file containing captured output.

use std::borrow::Cow;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::CollectError;

/// Default report command.
pub const DEFAULT_COMMAND: [&str; 2] = ["df", "-P"];

/// Default time a report command may run before it is killed.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Where report lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    /// Execute a program and capture its stdout.
    Command {
        program: String,
        args: Vec<String>,
        timeout: Duration,
    },
    /// Read previously captured output from a file.
    File(PathBuf),
}

impl Default for ReportSource {
    fn default() -> Self {
        Self::Command {
            program: DEFAULT_COMMAND[0].to_string(),
            args: DEFAULT_COMMAND[1..].iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl ReportSource {
    /// Builds a command source from an argv-style list.
    pub fn from_command(command: &[String], timeout: Duration) -> Result<Self, CollectError> {
        let (program, args) = command.split_first().ok_or(CollectError::NoCommand)?;
        Ok(Self::Command {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    /// Human-readable description used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Command { program, args, .. } => {
                let mut parts = vec![program.as_str()];
                parts.extend(args.iter().map(String::as_str));
                parts.join(" ")
            }
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Returns all report lines, header included.
    ///
    /// Lines are decoded one by one; invalid UTF-8 is replaced so that a
    /// single odd mount point does not cost the other rows.
    pub async fn read_lines(&self) -> Result<Vec<String>, CollectError> {
        let raw = match self {
            Self::Command {
                program,
                args,
                timeout,
            } => run_command(program, args, *timeout, &self.describe()).await?,
            Self::File(path) => tokio::fs::read(path)
                .await
                .map_err(|source| CollectError::Io {
                    path: path.clone(),
                    source,
                })?,
        };

        let lines = split_lines(&raw);
        if lines.is_empty() {
            return Err(CollectError::EmptyOutput);
        }

        debug!("Read {} report lines from {}", lines.len(), self.describe());
        Ok(lines)
    }
}

/// Splits raw report bytes into lines like `str::lines`, decoding each lossily.
fn split_lines(raw: &[u8]) -> Vec<String> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split(|&b| b == b'\n')
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            match String::from_utf8_lossy(line) {
                Cow::Borrowed(text) => text.to_string(),
                Cow::Owned(text) => {
                    trace!("Replaced invalid UTF-8 in report line: {:?}", text);
                    text
                }
            }
        })
        .collect()
}

async fn run_command(
    program: &str,
    args: &[String],
    timeout: Duration,
    display: &str,
) -> Result<Vec<u8>, CollectError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CollectError::Spawn {
            command: display.to_string(),
            source,
        })?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| CollectError::Timeout {
            command: display.to_string(),
            timeout,
        })?
        .map_err(|source| CollectError::Spawn {
            command: display.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CollectError::ExitStatus {
            command: display.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}
