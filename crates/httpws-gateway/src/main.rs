//! httpws gateway binary.
//!
//! - WebSocket endpoint (default `/websocket?id=...`)
//! - Requests from peers are served by the local application router
//! - `/tunnels/{id}/...` forwards HTTP to a connected peer
//!
//! Config path comes from `HTTPWS_CONFIG` (default `httpws.yaml`).

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use httpws_core::Result;
use httpws_gateway::{app_state::AppState, config, router, tunnel::RouterHandler};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, kind = e.kind().as_str(), "httpws-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let handler = RouterHandler::new(router::app_routes(), cfg.tunnel.max_body_bytes);
    let state = AppState::new(cfg, Arc::new(handler));
    let app = router::build_router(state.clone(), router::app_routes());

    tracing::info!(%listen, config = %path.display(), "httpws-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| httpws_core::TunnelError::Transport(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| httpws_core::TunnelError::Transport(format!("server: {e}")))?;

    tracing::info!("httpws-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!(tunnels = state.channels().len(), "signal received, closing tunnels");
    state.channels().close_all();
}
