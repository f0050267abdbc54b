//! # Data platform client
//!
//! The downstream service does the real work (schema inference, storage
//! provisioning, pipeline wiring, telemetry). This module describes its API
//! as typed requests and hides the transport behind [`PlatformApi`] so the
//! orchestrators can be driven by [`MockPlatformApi`] in tests.

pub mod http;
pub mod metrics;
pub mod mock;
pub mod requests;

pub use http::HttpPlatformClient;
pub use metrics::{MetricQuery, MetricResponse, TimeWindow, TimeWindows, WindowKind};
pub use mock::{MockFailure, MockPlatformApi};
pub use requests::{
    ApiEnvelope, DatasetCreateEnvelope, DatasetCreateRequest, DatasetListEnvelope,
    DatasetListRequest, HealthEnvelope, HealthRequest, ListedDataset, SchemaInferenceEnvelope,
    SchemaInferenceRequest, default_schema, extract_schema,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PlatformError;

/// Status and decoded body of a call whose result is passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

/// Calls against the downstream data platform.
///
/// Every method reports connection failures and timeouts as
/// [`PlatformError::Unavailable`]. Apart from `create_dataset`, a status
/// other than 200 is [`PlatformError::Rejected`].
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Infer a JSON schema from sample events; returns the raw response body.
    async fn infer_schema(&self, request: &SchemaInferenceEnvelope) -> Result<Value, PlatformError>;

    /// Create a dataset. The status is returned, never interpreted.
    async fn create_dataset(
        &self,
        request: &DatasetCreateEnvelope,
    ) -> Result<UpstreamResponse, PlatformError>;

    async fn list_datasets(
        &self,
        request: &DatasetListEnvelope,
    ) -> Result<Vec<ListedDataset>, PlatformError>;

    /// `result.status` of the health endpoint, `None` when absent.
    async fn dataset_health(&self, request: &HealthEnvelope)
    -> Result<Option<String>, PlatformError>;

    /// First sample value of a telemetry query, `None` when there is none.
    async fn query_metric(&self, query: &MetricQuery) -> Result<Option<f64>, PlatformError>;
}
