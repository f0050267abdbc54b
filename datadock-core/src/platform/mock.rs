//! A scripted in-memory [`PlatformApi`] for tests and local development.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::metrics::{MetricQuery, WindowKind};
use super::requests::{
    DatasetCreateEnvelope, DatasetListEnvelope, HealthEnvelope, ListedDataset,
    SchemaInferenceEnvelope,
};
use super::{PlatformApi, UpstreamResponse};
use crate::error::PlatformError;

/// A failure the mock reports instead of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Unavailable,
    Rejected(u16),
    Malformed,
}

impl MockFailure {
    fn into_error(self, endpoint: &str) -> PlatformError {
        let endpoint = endpoint.to_string();
        match self {
            MockFailure::Unavailable => PlatformError::Unavailable {
                endpoint,
                message: "connection refused".to_string(),
            },
            MockFailure::Rejected(status) => PlatformError::Rejected { endpoint, status },
            MockFailure::Malformed => PlatformError::MalformedResponse {
                endpoint,
                message: "unexpected body".to_string(),
            },
        }
    }
}

type Scripted<T> = Result<T, MockFailure>;
type MetricKey = (&'static str, String, Option<WindowKind>);

/// Mock platform with per-endpoint scripted outcomes.
///
/// Unscripted health and metric calls answer `Ok(None)`. Requests are
/// recorded so tests can inspect what would have been sent.
pub struct MockPlatformApi {
    schema: Scripted<Value>,
    create: Scripted<UpstreamResponse>,
    list: Scripted<Vec<ListedDataset>>,
    health: HashMap<String, Scripted<Option<String>>>,
    metrics: HashMap<MetricKey, Scripted<Option<f64>>>,
    latency: Option<Duration>,
    schema_requests: Mutex<Vec<SchemaInferenceEnvelope>>,
    create_requests: Mutex<Vec<DatasetCreateEnvelope>>,
    metric_queries: Mutex<Vec<MetricQuery>>,
    health_in_flight: AtomicUsize,
    health_peak: AtomicUsize,
}

impl Default for MockPlatformApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatformApi {
    pub fn new() -> Self {
        Self {
            schema: Ok(json!({ "result": { "schema": {} } })),
            create: Ok(UpstreamResponse {
                status: 200,
                body: json!({ "params": { "status": "SUCCESSFUL" } }),
            }),
            list: Ok(Vec::new()),
            health: HashMap::new(),
            metrics: HashMap::new(),
            latency: None,
            schema_requests: Mutex::new(Vec::new()),
            create_requests: Mutex::new(Vec::new()),
            metric_queries: Mutex::new(Vec::new()),
            health_in_flight: AtomicUsize::new(0),
            health_peak: AtomicUsize::new(0),
        }
    }

    pub fn with_schema_body(mut self, body: Value) -> Self {
        self.schema = Ok(body);
        self
    }

    pub fn with_schema_failure(mut self, failure: MockFailure) -> Self {
        self.schema = Err(failure);
        self
    }

    pub fn with_create_response(mut self, status: u16, body: Value) -> Self {
        self.create = Ok(UpstreamResponse { status, body });
        self
    }

    pub fn with_create_failure(mut self, failure: MockFailure) -> Self {
        self.create = Err(failure);
        self
    }

    /// List the given `(dataset_id, name)` pairs.
    pub fn with_datasets(mut self, datasets: &[(&str, &str)]) -> Self {
        self.list = Ok(datasets
            .iter()
            .map(|(id, name)| ListedDataset {
                dataset_id: Some(id.to_string()),
                name: Some(name.to_string()),
            })
            .collect());
        self
    }

    pub fn with_listed(mut self, datasets: Vec<ListedDataset>) -> Self {
        self.list = Ok(datasets);
        self
    }

    pub fn with_list_failure(mut self, failure: MockFailure) -> Self {
        self.list = Err(failure);
        self
    }

    pub fn with_health(mut self, dataset_id: &str, status: &str) -> Self {
        self.health
            .insert(dataset_id.to_string(), Ok(Some(status.to_string())));
        self
    }

    pub fn with_health_failure(mut self, dataset_id: &str, failure: MockFailure) -> Self {
        self.health.insert(dataset_id.to_string(), Err(failure));
        self
    }

    /// Script one metric. `window` is `None` for last-synced-time.
    pub fn with_metric(
        mut self,
        metric_id: &'static str,
        dataset_id: &str,
        window: Option<WindowKind>,
        value: f64,
    ) -> Self {
        self.metrics
            .insert((metric_id, dataset_id.to_string(), window), Ok(Some(value)));
        self
    }

    pub fn with_metric_failure(
        mut self,
        metric_id: &'static str,
        dataset_id: &str,
        window: Option<WindowKind>,
        failure: MockFailure,
    ) -> Self {
        self.metrics
            .insert((metric_id, dataset_id.to_string(), window), Err(failure));
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn schema_requests(&self) -> Vec<SchemaInferenceEnvelope> {
        self.schema_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn create_requests(&self) -> Vec<DatasetCreateEnvelope> {
        self.create_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn metric_queries(&self) -> Vec<MetricQuery> {
        self.metric_queries
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Most health calls observed in flight at once.
    pub fn peak_concurrent_health_calls(&self) -> usize {
        self.health_peak.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PlatformApi for MockPlatformApi {
    async fn infer_schema(
        &self,
        request: &SchemaInferenceEnvelope,
    ) -> Result<Value, PlatformError> {
        if let Ok(mut r) = self.schema_requests.lock() {
            r.push(request.clone());
        }
        self.delay().await;
        self.schema
            .clone()
            .map_err(|f| f.into_error("datasets/dataschema"))
    }

    async fn create_dataset(
        &self,
        request: &DatasetCreateEnvelope,
    ) -> Result<UpstreamResponse, PlatformError> {
        if let Ok(mut r) = self.create_requests.lock() {
            r.push(request.clone());
        }
        self.delay().await;
        self.create
            .clone()
            .map_err(|f| f.into_error("datasets/create"))
    }

    async fn list_datasets(
        &self,
        _request: &DatasetListEnvelope,
    ) -> Result<Vec<ListedDataset>, PlatformError> {
        self.delay().await;
        self.list.clone().map_err(|f| f.into_error("datasets/list"))
    }

    async fn dataset_health(
        &self,
        request: &HealthEnvelope,
    ) -> Result<Option<String>, PlatformError> {
        let now = self.health_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.health_peak.fetch_max(now, Ordering::SeqCst);
        self.delay().await;
        self.health_in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.health.get(&request.request.dataset_id) {
            Some(scripted) => scripted
                .clone()
                .map_err(|f| f.into_error("datasets/health")),
            None => Ok(None),
        }
    }

    async fn query_metric(&self, query: &MetricQuery) -> Result<Option<f64>, PlatformError> {
        if let Ok(mut r) = self.metric_queries.lock() {
            r.push(query.clone());
        }
        self.delay().await;

        let key = (query.id(), query.dataset_id().to_string(), query.window());
        match self.metrics.get(&key) {
            Some(scripted) => scripted.clone().map_err(|f| f.into_error("data/metrics")),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::requests::{DatasetListRequest, HealthRequest};

    #[tokio::test]
    async fn test_unscripted_health_is_none() {
        let mock = MockPlatformApi::new();
        let status = mock
            .dataset_health(&HealthRequest::envelope("orders"))
            .await
            .unwrap();
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn test_scripted_failures_map_to_errors() {
        let mock = MockPlatformApi::new().with_list_failure(MockFailure::Rejected(500));
        let err = mock
            .list_datasets(&DatasetListRequest::live())
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Rejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_with_datasets_lists_pairs() {
        let mock = MockPlatformApi::new().with_datasets(&[("a", "A"), ("b", "B")]);
        let listed = mock
            .list_datasets(&DatasetListRequest::live())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].dataset_id.as_deref(), Some("b"));
    }
}
