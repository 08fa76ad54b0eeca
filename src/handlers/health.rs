//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! collector statistics and the state of the last collection.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");
    state.health_stats.record_http_request();

    let cache = state.cache.read().await;

    let status = if cache.update_success && cache.last_updated.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let message = if cache.last_updated.is_none() {
        "No collection yet"
    } else if cache.update_success {
        "OK"
    } else {
        "Last collection failed"
    };

    let uptime_hours = state.health_stats.get_uptime_seconds() as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let devices = if state.devices.is_empty() {
        "none".to_string()
    } else {
        state.devices.join(", ")
    };

    let last_collection = format!(
        "{} device(s) in {:.2}ms",
        cache.sample.drives.len(),
        cache.update_duration_seconds * 1000.0
    );

    let table = state.health_stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nUptime: {uptime_str}\nDevices: {devices}\nFilter: {}\nLast collection: {last_collection}\n\n{table}",
            state.service.filter().as_str()
        ),
    )
}
