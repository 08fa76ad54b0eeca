//! Root endpoint handler.
//!
//! This module provides the `/` endpoint handler that lists the available
//! endpoints.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.health_stats.get_uptime_seconds();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    format!(
        "hdd-space-exporter {version}\n\
         Uptime: {hours}h {minutes}m {seconds}s\n\
         \n\
         /metrics  Prometheus metrics\n\
         /health   Collector health and statistics\n\
         /config   Effective configuration (YAML)\n"
    )
}
