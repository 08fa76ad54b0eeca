//! Configuration management for hdd-space-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, Commands, ConfigFormat, LogLevel};
use hdd_space_exporter::service::{DEFAULT_PRIORITY, DEFAULT_RETRIES, DEFAULT_UPDATE_EVERY};
use hdd_space_exporter::source::{DEFAULT_COMMAND, DEFAULT_COMMAND_TIMEOUT};
use hdd_space_exporter::{DeviceFilter, JobConfig, RunOptions, DEFAULT_HDD_REGEX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Job
    #[serde(alias = "hdd-regex")]
    pub hdd_regex: Option<String>,
    pub command: Option<Vec<String>>,
    /// Seconds before the report command is killed
    #[serde(alias = "command-timeout")]
    pub command_timeout: Option<u64>,
    /// Read the report from a file instead of running `command`
    #[serde(alias = "input-file")]
    pub input_file: Option<PathBuf>,

    // Scheduling, passed through to the run loop
    #[serde(alias = "update-every")]
    pub update_every: Option<u64>,
    pub priority: Option<u64>,
    pub retries: Option<u32>,

    // Serve mode
    pub port: Option<u16>,
    pub bind: Option<String>,
    #[serde(alias = "cache-ttl")]
    pub cache_ttl: Option<u64>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hdd_regex: Some(DEFAULT_HDD_REGEX.to_string()),
            command: Some(DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect()),
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT.as_secs()),
            input_file: None,
            update_every: Some(DEFAULT_UPDATE_EVERY),
            priority: Some(DEFAULT_PRIORITY),
            retries: Some(DEFAULT_RETRIES),
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            cache_ttl: None,
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    /// Job settings derived from this configuration.
    pub fn job(&self) -> JobConfig {
        let defaults = JobConfig::default();
        JobConfig {
            hdd_regex: self.hdd_regex.clone().unwrap_or(defaults.hdd_regex),
            command: self.command.clone().unwrap_or(defaults.command),
            command_timeout: self
                .command_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.command_timeout),
            input_file: self.input_file.clone(),
            update_every: self.update_every.unwrap_or(defaults.update_every),
            priority: self.priority.unwrap_or(defaults.priority),
            retries: self.retries.unwrap_or(defaults.retries),
        }
    }

    pub fn run_options(&self, once: bool) -> RunOptions {
        let job = self.job();
        RunOptions {
            update_every: Duration::from_secs(job.update_every),
            priority: job.priority,
            retries: job.retries,
            once,
        }
    }

    /// Log level from the merged configuration; unknown names fall back to info.
    pub fn effective_log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    }

    /// Seconds a collection is reused by `/metrics`; defaults to `update_every`.
    pub fn effective_cache_ttl(&self) -> u64 {
        self.cache_ttl
            .or(self.update_every)
            .unwrap_or(DEFAULT_UPDATE_EVERY)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let job = cfg.job();

    DeviceFilter::new(&job.hdd_regex)?;

    if job.update_every == 0 {
        return Err("update_every must be greater than 0".into());
    }

    if job.retries == 0 {
        return Err("retries must be greater than 0".into());
    }

    if job.command_timeout.is_zero() {
        return Err("command_timeout must be greater than 0".into());
    }

    match &job.input_file {
        Some(path) => {
            if !path.exists() {
                return Err(format!("input_file not found: {}", path.display()).into());
            }
        }
        None => {
            if job.command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err("command is empty and no input_file is set".into());
            }
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            return Err(format!("Invalid log_level '{}'", level).into());
        }
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(regex) = &args.hdd_regex {
        config.hdd_regex = Some(regex.clone());
    }
    if let Some(update_every) = args.update_every {
        config.update_every = Some(update_every);
    }
    if let Some(priority) = args.priority {
        config.priority = Some(priority);
    }
    if let Some(retries) = args.retries {
        config.retries = Some(retries);
    }
    if let Some(timeout) = args.command_timeout {
        config.command_timeout = Some(timeout);
    }
    if let Some(input_file) = &args.input_file {
        config.input_file = Some(input_file.clone());
    }

    // Serve mode options live on the subcommand
    if let Some(Commands::Serve {
        port,
        bind,
        cache_ttl,
    }) = &args.command
    {
        if let Some(port) = port {
            config.port = Some(*port);
        }
        if let Some(bind) = bind {
            config.bind = Some(bind.to_string());
        }
        if let Some(ttl) = cache_ttl {
            config.cache_ttl = Some(*ttl);
        }
    }

    Ok(config)
}

/// Config file that `load_config` reads: `path`, or the first default location that exists.
pub fn find_config_file(path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = path {
        return Some(PathBuf::from(p));
    }

    let defaults = [
        "/etc/hdd-space-exporter/config.yaml",
        "/etc/hdd-space-exporter/config.yml",
        "/etc/hdd-space-exporter/config.json",
        "./hdd-space-exporter.yaml",
        "./hdd-space-exporter.yml",
        "./hdd-space-exporter.json",
    ];
    defaults
        .iter()
        .find(|p| Path::new(p).exists())
        .map(PathBuf::from)
}

/// Loads configuration from `path`, or from the first default location that exists.
///
/// Keys missing from the file keep their default values.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = find_config_file(path) else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

    let file_config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)?,
    };
    debug!("Parsed configuration from: {}", path.display());

    Ok(merge_with_defaults(file_config))
}

fn merge_with_defaults(file: Config) -> Config {
    let d = Config::default();
    Config {
        hdd_regex: file.hdd_regex.or(d.hdd_regex),
        command: file.command.or(d.command),
        command_timeout: file.command_timeout.or(d.command_timeout),
        input_file: file.input_file.or(d.input_file),
        update_every: file.update_every.or(d.update_every),
        priority: file.priority.or(d.priority),
        retries: file.retries.or(d.retries),
        port: file.port.or(d.port),
        bind: file.bind.or(d.bind),
        cache_ttl: file.cache_ttl.or(d.cache_ttl),
        log_level: file.log_level.or(d.log_level),
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
