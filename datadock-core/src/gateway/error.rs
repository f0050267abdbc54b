//! HTTP rendering of orchestration errors.
//!
//! Every failure becomes `{"error_code": ..., "error_message": ...}` with a
//! status derived from the error kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::DatasetError;

impl DatasetError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DatasetError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            DatasetError::SchemaInferenceFailed { .. } => "SCHEMA_INFERENCE_FAILED",
            DatasetError::ListFailed { .. } => "LIST_FAILED",
            DatasetError::MalformedInput(_) => "MALFORMED_INPUT",
            DatasetError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Upstream statuses are reused when they are errors themselves.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DatasetError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            DatasetError::SchemaInferenceFailed { status }
            | DatasetError::ListFailed { status } => upstream_error_status(*status),
            DatasetError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            DatasetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn upstream_error_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if code.is_client_error() || code.is_server_error() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for DatasetError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error_code = self.error_code(), error = %self, "Request failed");
        }
        let body = json!({
            "error_code": self.error_code(),
            "error_message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
