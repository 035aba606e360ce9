//! HTTP job submission API
//!
//! | Route | Body | Result |
//! |-------|------|--------|
//! | `POST /scrape` | `{website_url, max_pages?}` | crawl, convert and upload a site |
//! | `POST /repo` | `{repo_url}` | upload a GitHub repository's files |
//! | `GET /health` | | `{status: "ok", bucket}` |
//! | `GET /` | | service description |
//!
//! Jobs run inside the request. Failed jobs answer `{error, stage}` with 400
//! for the validation stage and 500 for every other stage.

mod handlers;

pub use handlers::{ErrorResponse, JobResponse, RepoRequest, ScrapeRequest};

use crate::pipeline::Pipeline;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared state of every request
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,

    /// Cancelled on shutdown; each job receives a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Builds the router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/scrape", post(handlers::scrape))
        .route("/repo", post(handlers::repo))
        .with_state(state)
}

/// Serves the API on `0.0.0.0:<port>` until Ctrl-C
///
/// Shutdown cancels running crawls before the listener closes.
pub async fn serve(pipeline: Arc<Pipeline>, port: u16) -> std::io::Result<()> {
    let state = AppState::new(pipeline);
    let shutdown = state.shutdown.clone();
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health check: http://localhost:{}/health", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Shutting down, cancelling running jobs");
            shutdown.cancel();
        })
        .await
}
