//! Observability HTTP Routes
//!
//! Health check reporting store connectivity and dispatch counters.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state::AppState;
use crate::observability::MetricsSnapshot;
use crate::store::StoreName;

/// Connection state of one named store
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub name: String,
    pub configured: bool,
    pub connected: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub stores: Vec<StoreStatus>,
    pub dispatch: MetricsSnapshot,
}

/// Health check route at `/health`
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_handler))
}

/// Always 200; `status` is "degraded" until the primary store has connected
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let provider = state.coordinator.provider();
    let mut stores = Vec::new();
    for name in [StoreName::Cloud, StoreName::Offline] {
        stores.push(StoreStatus {
            name: name.to_string(),
            configured: provider.is_configured(name),
            connected: provider.is_connected(name).await,
        });
    }
    let status = if stores.first().map(|s| s.connected).unwrap_or(false) {
        "ok"
    } else {
        "degraded"
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        stores,
        dispatch: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
