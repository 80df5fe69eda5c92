//! HTTP handlers for the server.

pub mod fax;
pub mod status;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::error::SubmitError;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

/// Map a rejection to its HTTP status and a user-facing JSON body.
pub fn reject(err: SubmitError) -> ApiError {
    let status = match &err {
        SubmitError::ImageTooLarge { .. } | SubmitError::MessageTooLong { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        SubmitError::UnknownUser => StatusCode::FORBIDDEN,
        SubmitError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        SubmitError::PrinterNotReady(_) | SubmitError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        SubmitError::PrinterTransmit(_) | SubmitError::PrinterFault(_) => StatusCode::BAD_GATEWAY,
        SubmitError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::warn!(error = %err, source = ?std::error::Error::source(&err), "request failed");
    }

    (status, Json(json!({"success": false, "error": err.to_string()})))
}

/// A 400 for malformed requests that never reach the service.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message.into()})),
    )
}
