//! Axum router wiring.
//!
//! `app_routes` is the application served both directly and through tunnels;
//! `build_router` adds the upgrade endpoint and the gateway-only routes.

use axum::{
    routing::{any, get},
    Router,
};

use crate::{app_state::AppState, forward, ops, transport};

pub fn app_routes() -> Router {
    Router::new()
        .route("/ping", get(ops::ping))
        .route("/healthz", get(ops::healthz))
}

pub fn build_router(state: AppState, app: Router) -> Router {
    let upgrade_path = state.cfg().gateway.path.clone();
    Router::new()
        .route(&upgrade_path, get(transport::ws::ws_upgrade))
        .route("/tunnels", get(ops::list_tunnels))
        .route("/tunnels/:id/*path", any(forward::forward))
        .with_state(state)
        .merge(app)
}
