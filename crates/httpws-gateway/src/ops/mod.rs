//! Operational HTTP endpoints.
//!
//! - `/ping`    : `pong`, also reachable through a tunnel
//! - `/healthz` : liveness
//! - `/tunnels` : ids of connected peers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app_state::AppState;

pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn list_tunnels(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state.channels().ids();
    Json(json!({ "count": ids.len(), "tunnels": ids }))
}
