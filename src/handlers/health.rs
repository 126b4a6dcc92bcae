use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::time::Instant;

use crate::config::StoreBackend;
use crate::AppState;

/// Liveness response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub store: &'static str,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// Basic liveness probe; does not touch the store
async fn liveness_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: get_uptime_secs(),
        store: match state.config.store_backend {
            StoreBackend::Memory => "memory",
            StoreBackend::Rest => "rest",
        },
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(liveness_check))
}
