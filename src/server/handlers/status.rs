//! Printer status and service health handlers.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use super::super::state::AppState;
use super::{ApiError, reject};

/// GET /api/status - health-check the printer and report its status.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let status = state.service.status().await.map_err(reject)?;

    Ok(Json(json!({
        "success": true,
        "status": status.to_string(),
        "ready": status.ready,
        "online": status.online,
        "paper": status.paper,
    })))
}

/// GET /api/health - liveness of the service itself (never touches the printer).
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "title": state.service.title(),
        "version": env!("CARGO_PKG_VERSION"),
        "boot_time": state.boot_time,
    }))
}
