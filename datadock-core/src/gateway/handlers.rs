//! Route handlers for the gateway.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use super::server::SharedState;
use crate::dataset::DatasetContext;
use crate::error::{DatasetError, ValidationError};
use crate::orchestrator::DatasetSummary;

/// Body of `POST /datasets/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDatasetBody {
    pub context: DatasetContext,
    /// An object, a JSON-encoded string, or absent.
    #[serde(default)]
    pub sample_event: Option<Value>,
}

/// Health check endpoint.
pub(super) async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
    }))
}

/// Responds with the creation service's own status.
pub(super) async fn create_dataset_handler(
    State(state): State<SharedState>,
    body: Result<Json<CreateDatasetBody>, JsonRejection>,
) -> Result<Response, DatasetError> {
    let Json(body) = body.map_err(|rejection| {
        DatasetError::MalformedInput(ValidationError::Body {
            message: rejection.body_text(),
        })
    })?;

    let outcome = state
        .creator
        .create_dataset(&body.context, body.sample_event.as_ref())
        .await?;
    Ok((relay_status(outcome.status), Json(outcome)).into_response())
}

/// Non-final (1xx) and unrepresentable upstream statuses become 502.
fn relay_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if !code.is_informational() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

pub(super) async fn list_datasets_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<DatasetSummary>>, DatasetError> {
    let summaries = state.enricher.list_datasets_with_metrics().await?;
    Ok(Json(summaries))
}
