//! reqwest-backed implementation of [`PlatformApi`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::metrics::{MetricQuery, MetricResponse};
use super::requests::{
    DatasetCreateEnvelope, DatasetListEnvelope, DatasetListResponse, HealthEnvelope,
    HealthResponse, ListedDataset, SchemaInferenceEnvelope,
};
use super::{PlatformApi, UpstreamResponse};
use crate::config::PlatformConfig;
use crate::error::PlatformError;

const SCHEMA_PATH: &str = "datasets/dataschema";
const CREATE_PATH: &str = "datasets/create";
const LIST_PATH: &str = "datasets/list";
const HEALTH_PATH: &str = "datasets/health";
const METRICS_PATH: &str = "data/metrics";

/// HTTP client for the data platform.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    client: Client,
    base_url: String,
    metrics_base_url: String,
}

impl HttpPlatformClient {
    /// Build a client whose every call is bounded by `request_timeout_secs`.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PlatformError::Unavailable {
                endpoint: config.base_url.clone(),
                message: format!("HTTP client error: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            metrics_base_url: config.metrics_base_url().trim_end_matches('/').to_string(),
        })
    }

    /// POST a JSON body and return the status with the raw response text.
    async fn post<B: Serialize + ?Sized>(
        &self,
        base: &str,
        path: &'static str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<(StatusCode, String), PlatformError> {
        let url = format!("{}/{}", base, path);
        debug!(url = %url, "Sending platform request");

        let response = self
            .client
            .post(&url)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(path, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| unavailable(path, e))?;
        debug!(url = %url, status = status.as_u16(), "Platform responded");
        Ok((status, text))
    }

    /// POST and decode a 200 response as `T`.
    async fn post_expect_ok<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        base: &str,
        path: &'static str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, PlatformError> {
        let (status, text) = self.post(base, path, query, body).await?;
        if status != StatusCode::OK {
            return Err(PlatformError::Rejected {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        serde_json::from_str(&text).map_err(|e| PlatformError::MalformedResponse {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

fn unavailable(path: &str, err: reqwest::Error) -> PlatformError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    PlatformError::Unavailable {
        endpoint: path.to_string(),
        message,
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn infer_schema(
        &self,
        request: &SchemaInferenceEnvelope,
    ) -> Result<Value, PlatformError> {
        self.post_expect_ok(&self.base_url, SCHEMA_PATH, &[], request)
            .await
    }

    async fn create_dataset(
        &self,
        request: &DatasetCreateEnvelope,
    ) -> Result<UpstreamResponse, PlatformError> {
        let (status, text) = self.post(&self.base_url, CREATE_PATH, &[], request).await?;
        // Passed through verbatim; a non-JSON body is kept as a string.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(UpstreamResponse {
            status: status.as_u16(),
            body,
        })
    }

    async fn list_datasets(
        &self,
        request: &DatasetListEnvelope,
    ) -> Result<Vec<ListedDataset>, PlatformError> {
        let response: DatasetListResponse = self
            .post_expect_ok(&self.base_url, LIST_PATH, &[], request)
            .await?;
        Ok(response.result.data)
    }

    async fn dataset_health(
        &self,
        request: &HealthEnvelope,
    ) -> Result<Option<String>, PlatformError> {
        let response: HealthResponse = self
            .post_expect_ok(&self.base_url, HEALTH_PATH, &[], request)
            .await?;
        Ok(response.result.status)
    }

    async fn query_metric(&self, query: &MetricQuery) -> Result<Option<f64>, PlatformError> {
        let response: MetricResponse = self
            .post_expect_ok(
                &self.metrics_base_url,
                METRICS_PATH,
                &[("id", query.id())],
                &query.payload(),
            )
            .await?;
        Ok(response.value())
    }
}
