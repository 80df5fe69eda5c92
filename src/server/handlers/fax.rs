//! Fax submission handler.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::job::ImageSource;
use crate::service::SubmitRequest;

use super::super::state::AppState;
use super::{ApiError, bad_request, reject};

/// POST /api/send - print a fax.
///
/// Multipart fields (all optional):
///
/// | Field | Content |
/// |-------|---------|
/// | `user` | sender name, must be a configured user |
/// | `message` | text |
/// | `image` | image file (PNG, JPEG, GIF, BMP, ...) |
/// | `scan` | `true`/`on`/`1` when the image is a scanned document |
pub async fn send(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut request = SubmitRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "user" => {
                let user = field.text().await.map_err(read_error)?;
                request.sender = Some(user.trim().to_string()).filter(|u| !u.is_empty());
            }
            "message" => {
                request.message = field.text().await.map_err(read_error)?;
            }
            "image" => {
                let bytes = field.bytes().await.map_err(read_error)?;
                // Browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    request.image = Some(ImageSource::Encoded(bytes.to_vec()));
                }
            }
            "scan" => {
                let value = field.text().await.map_err(read_error)?;
                request.scan = matches!(value.trim(), "true" | "on" | "1" | "scan");
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let receipt = state.service.submit(request).await.map_err(reject)?;

    Ok(Json(json!({
        "success": true,
        "message": "Fax Sent With success",
        "job_id": receipt.job_id,
        "sender": receipt.sender,
        "received_at": receipt.received_at,
    })))
}

fn read_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    bad_request(format!("Failed to read field: {}", e))
}
