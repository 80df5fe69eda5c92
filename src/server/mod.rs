//! # HTTP API for Fax Submission
//!
//! A thin JSON transport over [`FaxService`]. There is no HTML UI and no
//! authentication: the `user` field is trusted, so put the server behind a
//! reverse proxy that authenticates and sets it.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /api/health` | service liveness and title |
//! | `GET /api/status` | printer health check and paper level |
//! | `POST /api/send` | multipart fax submission |
//!
//! ## Usage
//!
//! ```bash
//! directslip --config directslip.json serve
//! curl -F user=alice -F message=Hello http://127.0.0.1:7860/api/send
//! ```

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::DirectslipError;
use crate::service::FaxService;

/// Largest accepted request body (images are uploaded encoded).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the API router around a running service.
pub fn router(service: FaxService) -> Router {
    let app_state = Arc::new(AppState::new(service));

    Router::new()
        .route("/api/health", get(handlers::status::health))
        .route("/api/status", get(handlers::status::status))
        .route(
            "/api/send",
            post(handlers::fax::send).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bind `listen_addr` and serve until the process is stopped.
pub async fn serve(service: FaxService, listen_addr: &str) -> Result<(), DirectslipError> {
    let title = service.title().to_string();
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| {
            DirectslipError::Transport(format!("Failed to bind to {}: {}", listen_addr, e))
        })?;

    info!(%title, %listen_addr, "DirectSlip HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| DirectslipError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
