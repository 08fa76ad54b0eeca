//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("hdd-space-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# HDD Space Exporter Configuration
# =================================
#
# Collection
# ----------
# hdd_regex: "md[0-9]+$"       # Devices to report (searched in the device path)
# command: ["df", "-P"]        # Report command, POSIX output format
# command_timeout: 10          # Seconds before the command is killed
# input_file: null             # Read a captured report instead of running command
#
# Scheduling
# ----------
# update_every: 60             # Seconds between updates
# priority: 60000              # Priority of the first chart, +1 per chart
# retries: 60                  # Consecutive failed updates before giving up
#
# Serve Mode
# ----------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# cache_ttl: null              # Reuse a collection for N seconds (null = update_every)
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
