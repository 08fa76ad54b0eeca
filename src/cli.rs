//! CLI arguments and subcommands for hdd-space-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a `log_level` value from a config file, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "hdd-space-exporter",
    about = "Disk space collector for RAID and other filtered filesystems",
    long_about = "Disk space collector for RAID and other filtered filesystems.\n\n\
                  Periodically runs `df -P`, keeps the filesystems whose device matches \
                  a regular expression and reports used/available space in GB and percent, \
                  either as a line-protocol plugin on stdout or as Prometheus metrics.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level [default: `log_level` from the config file, else info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Regular expression selecting reported devices
    #[arg(long)]
    pub hdd_regex: Option<String>,

    /// Seconds between updates
    #[arg(long)]
    pub update_every: Option<u64>,

    /// Base priority of the registered charts
    #[arg(long)]
    pub priority: Option<u64>,

    /// Consecutive failed updates tolerated before giving up
    #[arg(long)]
    pub retries: Option<u32>,

    /// Seconds the report command may run before it is killed
    #[arg(long)]
    pub command_timeout: Option<u64>,

    /// Read the df report from this file instead of running the command
    #[arg(short = 'i', long)]
    pub input_file: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run as a plugin, writing the line protocol to stdout (default)
    Run {
        /// Stop after the first update
        #[arg(long)]
        once: bool,
    },

    /// Serve Prometheus metrics over HTTP
    Serve {
        /// HTTP listen port
        #[arg(short = 'p', long)]
        port: Option<u16>,

        /// Bind to specific interface/IP
        #[arg(long)]
        bind: Option<IpAddr>,

        /// Reuse a collection for N seconds
        #[arg(long)]
        cache_ttl: Option<u64>,
    },

    /// Validate configuration and run one collection
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Test collection and print the collected values
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show every parsed entry, not only the sample
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
