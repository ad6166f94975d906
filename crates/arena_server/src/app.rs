//! HTTP surface and server startup.

use crate::config::ServerConfig;
use crate::gateway::{Gateway, GatewayHandle};
use crate::registry::SessionRegistry;
use crate::stats::{MemoryStats, StatsSnapshot};
use crate::ws::ws_handler;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use derive_getters::Getters;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Shared state handed to every handler.
#[derive(Debug, Clone, Getters)]
pub struct AppState {
    gateway: GatewayHandle,
    stats: Arc<MemoryStats>,
}

impl AppState {
    /// Bundles the gateway handle and the stats store.
    pub fn new(gateway: GatewayHandle, stats: Arc<MemoryStats>) -> Self {
        Self { gateway, stats }
    }
}

/// Builds the router: `/ws`, `/healthz`, `/api/stats`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(health))
        .route("/api/stats", get(stats))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state))]
async fn stats(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, (StatusCode, String)> {
    state.stats.snapshot().map(Json).map_err(|e| {
        warn!(error = %e, "Stats unavailable");
        (StatusCode::INTERNAL_SERVER_ERROR, e.message)
    })
}

/// Runs the server until Ctrl+C.
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let stats = Arc::new(MemoryStats::new());
    let registry = SessionRegistry::new(stats.clone());
    let (gateway, gateway_task) = Gateway::new(registry).spawn();

    let app = router(AppState::new(gateway, stats));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server ready at http://{}/ (WebSocket at /ws)", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Upgraded sockets may still hold handles, so the loop is stopped rather than drained.
    gateway_task.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
