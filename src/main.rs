//! hdd-space-exporter
//!
//! Disk space collector with tracing logging.
//! This is the main entry point that runs the plugin loop or the HTTP server
//! and handles subcommands.

mod cache;
mod cli;
mod commands;
mod config;
mod handlers;
mod health_stats;
mod metrics;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use hdd_space_exporter::{run_plugin, DfService, RunOutcome};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use config::{
    find_config_file, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{config_handler, health_handler, metrics_handler, root_handler};
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; stdout carries the plugin protocol.
fn setup_logging(level: &LogLevel) {
    let log_level = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    debug!("Logging initialized with level: {:?}", level);
}

/// Helper function to validate the resolved configuration.
/// Exits the process with error code 1 if validation fails.
fn exit_if_invalid(config: &Config) {
    if let Err(e) = validate_effective_config(config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
}

/// Completes on SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Plugin mode: line protocol on stdout until shutdown or retries run out.
async fn run_plugin_mode(config: &Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = DfService::new(&config.job())?;
    let options = config.run_options(once);
    let mut out = std::io::stdout();

    info!(
        "Starting plugin: source '{}', filter '{}', update_every {}s, retries {}",
        service.source().describe(),
        service.filter().as_str(),
        options.update_every.as_secs(),
        options.retries
    );

    match run_plugin(&mut service, &options, &mut out, shutdown_signal()).await? {
        RunOutcome::RetriesExhausted => {
            error!("Plugin disabled after {} failed updates", options.retries);
            std::process::exit(1);
        }
        outcome => {
            info!("Plugin stopped: {:?}", outcome);
            Ok(())
        }
    }
}

/// Serve mode: Prometheus metrics over HTTP.
async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let mut service = DfService::new(&config.job())?;
    service.check().await.map_err(|e| {
        error!("Initial check failed: {}", e);
        e
    })?;
    let state = Arc::new(AppState::new(service, config)?);
    info!(
        "Exporting {} device(s), collection reused for {}s",
        state.devices.len(),
        state.cache_ttl.as_secs()
    );

    // Perform initial cache population
    state.refresh_if_stale().await;

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("hdd-space-exporter listening on http://{}:{}", bind_ip_str, port);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("hdd-space-exporter stopped gracefully");
    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The config file may set the log level, so resolve it first
    let resolved = resolve_config(&args);
    let log_level = match &resolved {
        Ok(config) => config.effective_log_level(),
        Err(_) => args.log_level.clone().unwrap_or(LogLevel::Info),
    };
    setup_logging(&log_level);

    if resolved.is_ok() && !args.no_config {
        if let Some(path) = find_config_file(args.config.as_deref()) {
            info!("Loaded configuration from: {}", path.display());
        }
    }

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolved?;

        if args.check_config {
            exit_if_invalid(&config);
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Config generation doesn't need a valid configuration
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = resolved?;
    exit_if_invalid(&config);

    match &args.command {
        None => run_plugin_mode(&config, false).await,
        Some(Commands::Run { once }) => run_plugin_mode(&config, *once).await,
        Some(Commands::Serve { .. }) => serve(config).await,
        Some(Commands::Check) => command_check(&config).await,
        Some(Commands::Test {
            iterations,
            verbose,
            format,
        }) => command_test(*iterations, *verbose, format.clone(), &config).await,
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
    }
}
