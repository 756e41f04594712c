//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::stats::{self, StatsSnapshot};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::GridSnapshotPayload;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - "*" or multiple comma-separated origins
    let cors = if state.config.client_origin.trim() == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/grid", get(grid_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connected_users: usize,
    claimed_cells: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connected_users: state.registry.connected_count(),
        claimed_cells: state.grid.claimed_count(),
    })
}

// ============================================================================
// Pull endpoints (page load before the realtime channel exists)
// ============================================================================

async fn grid_handler(State(state): State<AppState>) -> Json<GridSnapshotPayload> {
    Json(GridSnapshotPayload::from_store(&state.grid))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(stats::compute_stats(&state.grid, &state.registry))
}
