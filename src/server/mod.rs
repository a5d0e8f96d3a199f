//! HTTP boundary for the batch API
//!
//! Routes:
//! - `POST /api/v1/links` - scrape the addresses uploaded in `urlsFile`
//! - `GET /api/v1/links/{batch_id}` - fetch a stored batch
//! - `GET /health` - liveness probe

mod handlers;
mod response;

pub use response::{ApiError, BatchData, Envelope};

use crate::batch::BatchOrchestrator;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Name of the multipart field carrying the address list
pub const URLS_FIELD: &str = "urlsFile";

/// Builds the application router
pub fn router(orchestrator: Arc<BatchOrchestrator>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/links", post(handlers::create_batch))
        .route("/api/v1/links/{batch_id}", get(handlers::get_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serves `app` on `bind_address` until Ctrl-C
pub async fn serve(bind_address: &str, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
