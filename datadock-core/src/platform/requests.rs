//! Typed request and response bodies for the data platform API.
//!
//! Each downstream endpoint gets its own record type so that field-name drift
//! shows up at compile time instead of as a silently ignored key.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::dataset::{ConnectorDescriptor, DatasetType, RuleMode, TransformationRule};

/// The `{id, ver, ts, params, request}` wrapper every platform call shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub id: String,
    pub ver: String,
    pub ts: String,
    pub params: EnvelopeParams,
    pub request: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub msgid: String,
}

impl<T> ApiEnvelope<T> {
    /// Wrap `request` with a fresh message id and the current timestamp.
    pub fn new(id: &str, ver: &str, request: T) -> Self {
        Self {
            id: id.to_string(),
            ver: ver.to_string(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            params: EnvelopeParams {
                msgid: Uuid::new_v4().to_string(),
            },
            request,
        }
    }
}

// --- schema inference ---

pub type SchemaInferenceEnvelope = ApiEnvelope<SchemaInferenceRequest>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInferenceRequest {
    /// Zero or one sample events.
    pub data: Vec<Map<String, Value>>,
    pub config: SchemaInferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInferenceConfig {
    pub dataset: String,
}

impl SchemaInferenceRequest {
    pub fn envelope(
        dataset: &str,
        sample_event: Option<Map<String, Value>>,
    ) -> SchemaInferenceEnvelope {
        ApiEnvelope::new(
            "api.datasets.dataschema",
            "1.0",
            SchemaInferenceRequest {
                data: sample_event.into_iter().collect(),
                config: SchemaInferenceConfig {
                    dataset: dataset.to_string(),
                },
            },
        )
    }
}

/// Pull a usable `result.schema` out of an inference response body.
///
/// Anything other than a non-empty JSON object counts as "no schema".
pub fn extract_schema(body: &Value) -> Option<Value> {
    match body.pointer("/result/schema") {
        Some(Value::Object(schema)) if !schema.is_empty() => Some(Value::Object(schema.clone())),
        _ => None,
    }
}

/// The permissive schema used when inference yields nothing.
pub fn default_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {},
        "additionalProperties": true
    })
}

// --- dataset creation ---

pub type DatasetCreateEnvelope = ApiEnvelope<DatasetCreateRequest>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCreateRequest {
    pub dataset_id: String,
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    pub name: String,
    pub validation_config: ValidationConfig,
    pub extraction_config: ExtractionConfig,
    pub dedup_config: DedupConfig,
    pub data_schema: Value,
    pub dataset_config: DatasetConfig,
    pub transformations_config: Vec<TransformationRule>,
    pub connectors_config: Vec<ConnectorDescriptor>,
}

impl DatasetCreateRequest {
    pub fn into_envelope(self) -> DatasetCreateEnvelope {
        ApiEnvelope::new("api.datasets.create", "1.0", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub validate: bool,
    pub mode: RuleMode,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate: true,
            mode: RuleMode::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub is_batch_event: bool,
    pub extraction_key: String,
    pub dedup_config: DedupConfig,
}

impl ExtractionConfig {
    /// Batch-event extraction over the fixed `events` key.
    pub fn batch(dedup_config: DedupConfig) -> Self {
        Self {
            is_batch_event: true,
            extraction_key: "events".to_string(),
            dedup_config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    pub drop_duplicates: bool,
    pub dedup_key: Option<String>,
}

impl DedupConfig {
    pub fn keyed(dedup_key: Option<String>) -> Self {
        Self {
            drop_duplicates: true,
            dedup_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub indexing_config: IndexingConfig,
    pub keys_config: KeysConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub olap_store_enabled: bool,
    pub lakehouse_enabled: bool,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeysConfig {
    pub timestamp_key: Option<String>,
}

// --- listing ---

pub type DatasetListEnvelope = ApiEnvelope<DatasetListRequest>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetListRequest {
    pub filters: ListFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilters {
    pub status: String,
}

impl DatasetListRequest {
    pub fn live() -> DatasetListEnvelope {
        ApiEnvelope::new(
            "api.datasets.list",
            "v2",
            DatasetListRequest {
                filters: ListFilters {
                    status: "Live".to_string(),
                },
            },
        )
    }
}

/// A dataset as returned by the listing endpoint. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListedDataset {
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetListResponse {
    #[serde(default)]
    pub result: DatasetListResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetListResult {
    #[serde(default)]
    pub data: Vec<ListedDataset>,
}

// --- health ---

pub type HealthEnvelope = ApiEnvelope<HealthRequest>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRequest {
    pub dataset_id: String,
    pub categories: Vec<String>,
}

impl HealthRequest {
    pub fn envelope(dataset_id: &str) -> HealthEnvelope {
        ApiEnvelope::new(
            "api.datasets.health",
            "v2",
            HealthRequest {
                dataset_id: dataset_id.to_string(),
                categories: vec!["infra".to_string(), "processing".to_string()],
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub result: HealthResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResult {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_envelope_with_sample() {
        let mut event = Map::new();
        event.insert("id".into(), json!("1"));
        let env = SchemaInferenceRequest::envelope("orders", Some(event));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["id"], "api.datasets.dataschema");
        assert_eq!(json["ver"], "1.0");
        assert_eq!(json["request"]["data"], json!([{ "id": "1" }]));
        assert_eq!(json["request"]["config"]["dataset"], "orders");
        assert!(Uuid::parse_str(json["params"]["msgid"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_schema_envelope_without_sample() {
        let env = SchemaInferenceRequest::envelope("orders", None);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["request"]["data"], json!([]));
    }

    #[test]
    fn test_extract_schema_present() {
        let body = json!({
            "result": { "schema": { "type": "object", "properties": { "a": {} } } }
        });
        assert_eq!(extract_schema(&body).unwrap()["type"], "object");
    }

    #[test]
    fn test_extract_schema_absent_or_empty() {
        assert!(extract_schema(&json!({})).is_none());
        assert!(extract_schema(&json!({ "result": {} })).is_none());
        assert!(extract_schema(&json!({ "result": { "schema": {} } })).is_none());
        assert!(extract_schema(&json!({ "result": { "schema": null } })).is_none());
        assert!(extract_schema(&json!({ "result": { "schema": "" } })).is_none());
    }

    #[test]
    fn test_default_schema_is_permissive() {
        let schema = default_schema();
        assert_eq!(schema["$schema"], "https://json-schema.org/draft/2020-12/schema");
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["additionalProperties"], true);
    }

    #[test]
    fn test_list_envelope_filters_live() {
        let json = serde_json::to_value(DatasetListRequest::live()).unwrap();
        assert_eq!(json["request"], json!({ "filters": { "status": "Live" } }));
    }

    #[test]
    fn test_list_response_ignores_unknown_keys() {
        let resp: DatasetListResponse = serde_json::from_value(json!({
            "result": { "data": [
                { "dataset_id": "orders", "name": "Orders", "status": "Live" },
                { "name": "no-id" }
            ] }
        }))
        .unwrap();
        assert_eq!(resp.result.data.len(), 2);
        assert_eq!(resp.result.data[0].dataset_id.as_deref(), Some("orders"));
        assert!(resp.result.data[1].dataset_id.is_none());
    }

    #[test]
    fn test_health_envelope_categories() {
        let json = serde_json::to_value(HealthRequest::envelope("orders")).unwrap();
        assert_eq!(json["id"], "api.datasets.health");
        assert_eq!(json["request"]["dataset_id"], "orders");
        assert_eq!(json["request"]["categories"], json!(["infra", "processing"]));
    }

    #[test]
    fn test_dedup_and_extraction_shape() {
        let extraction = ExtractionConfig::batch(DedupConfig::keyed(Some("id".into())));
        let json = serde_json::to_value(&extraction).unwrap();
        assert_eq!(
            json,
            json!({
                "is_batch_event": true,
                "extraction_key": "events",
                "dedup_config": { "drop_duplicates": true, "dedup_key": "id" }
            })
        );
    }
}
