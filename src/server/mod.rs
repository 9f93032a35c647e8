//! HTTP and WebSocket surface.
//!
//! One axum router serves the streaming endpoint and the two plain HTTP
//! endpoints. Everything a handler needs travels in [`AppState`], so the
//! whole surface can be stood up in tests against a mock engine.

pub mod http;
pub mod ws;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::engine::TranslatePool;
use crate::error::{LivesubError, Result};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: TranslatePool,
}

impl AppState {
    pub fn new(pool: TranslatePool) -> Self {
        Self { pool }
    }
}

/// Build the full application router.
///
/// CORS is wide open: the clients are browser extensions and local pages
/// with effectively random origins.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws/translate", get(ws::ws_handler))
        .route("/health", get(http::health))
        .route("/test-whisper", post(http::test_whisper))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and run the server until ctrl-c.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener =
        tokio::net::TcpListener::bind(bind)
            .await
            .map_err(|e| LivesubError::ServerBind {
                addr: bind.to_string(),
                message: e.to_string(),
            })?;
    let addr = listener.local_addr()?;

    info!(
        address = %addr,
        model = state.pool.model_name(),
        ready = state.pool.is_ready(),
        "listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => info!(error = %e, "failed to listen for shutdown signal"),
    }
}
