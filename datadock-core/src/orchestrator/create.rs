//! Dataset creation: schema inference followed by the creation call.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dataset::{
    ConnectorSettings, DatasetContext, StorageOption, build_transformations,
    decode_sample_event, format_dataset_id, get_connector_config, validate_type,
};
use crate::error::{DatasetError, PlatformError, ValidationError};
use crate::platform::requests::{
    DatasetConfig, DatasetCreateRequest, DedupConfig, ExtractionConfig, IndexingConfig,
    KeysConfig, ValidationConfig,
};
use crate::platform::{PlatformApi, SchemaInferenceRequest, default_schema, extract_schema};

/// Raw bodies of both platform calls plus the creation call's status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOutcome {
    pub schema_response: Value,
    pub create_response: Value,
    /// Status of the creation call. Reported, not interpreted.
    #[serde(skip)]
    pub status: u16,
}

/// Provisions datasets on the platform.
#[derive(Clone)]
pub struct DatasetCreator {
    platform: Arc<dyn PlatformApi>,
    connectors: ConnectorSettings,
}

impl DatasetCreator {
    pub fn new(platform: Arc<dyn PlatformApi>, connectors: ConnectorSettings) -> Self {
        Self {
            platform,
            connectors,
        }
    }

    /// Infer a schema for the dataset, then ask the platform to create it.
    ///
    /// Input is validated before any call goes out. The creation service's
    /// own verdict is returned as-is in [`CreateOutcome`]; only transport
    /// failures and a rejected schema inference are errors.
    pub async fn create_dataset(
        &self,
        context: &DatasetContext,
        sample_event: Option<&Value>,
    ) -> Result<CreateOutcome, DatasetError> {
        context.validate()?;
        let sample_event = decode_sample_event(sample_event)?;
        // Builds everything except the schema so bad input fails fast.
        let draft = self.build_create_request(context, Value::Null)?;

        let schema_request = SchemaInferenceRequest::envelope(&context.dataset_name, sample_event);
        let schema_response = self
            .platform
            .infer_schema(&schema_request)
            .await
            .map_err(|err| match err {
                PlatformError::Rejected { status, .. } => {
                    DatasetError::SchemaInferenceFailed { status }
                }
                other => DatasetError::from_platform(other),
            })?;

        let data_schema = extract_schema(&schema_response).unwrap_or_else(|| {
            debug!(
                dataset = %context.dataset_name,
                "Schema inference returned no schema, using permissive default"
            );
            default_schema()
        });

        let request = DatasetCreateRequest {
            data_schema,
            ..draft
        }
        .into_envelope();

        let response = self
            .platform
            .create_dataset(&request)
            .await
            .map_err(|err| {
                warn!(
                    dataset = %context.dataset_name,
                    error = %err,
                    "Dataset creation call failed"
                );
                DatasetError::from_platform(err)
            })?;

        info!(
            dataset = %context.dataset_name,
            dataset_id = %request.request.dataset_id,
            status = response.status,
            "Dataset creation submitted"
        );

        Ok(CreateOutcome {
            schema_response,
            create_response: response.body,
            status: response.status,
        })
    }

    /// Assemble the creation request body for `context` around `data_schema`.
    pub fn build_create_request(
        &self,
        context: &DatasetContext,
        data_schema: Value,
    ) -> Result<DatasetCreateRequest, ValidationError> {
        let storage = StorageOption::parse(context.storage_option.as_deref())?;
        let transformations =
            build_transformations(&context.pii_fields, &context.transformation_fields)?;

        Ok(DatasetCreateRequest {
            dataset_id: format_dataset_id(&context.dataset_name),
            dataset_type: validate_type(&context.dataset_purpose),
            name: context.dataset_name.clone(),
            validation_config: ValidationConfig::default(),
            extraction_config: ExtractionConfig::batch(DedupConfig::keyed(
                context.dedup_key.clone(),
            )),
            dedup_config: DedupConfig::keyed(context.dedup_key.clone()),
            data_schema,
            dataset_config: DatasetConfig {
                indexing_config: IndexingConfig {
                    olap_store_enabled: storage.olap_store_enabled(),
                    lakehouse_enabled: storage.lakehouse_enabled(),
                    cache_enabled: false,
                },
                keys_config: KeysConfig {
                    timestamp_key: context.timestamp_key.clone(),
                },
            },
            transformations_config: transformations,
            connectors_config: get_connector_config(
                &context.data_location,
                &context.dataset_name,
                &self.connectors,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetType, FieldRule, FunctionType};
    use crate::platform::{MockFailure, MockPlatformApi};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn creator(mock: Arc<MockPlatformApi>) -> DatasetCreator {
        DatasetCreator::new(mock, ConnectorSettings::default())
    }

    fn full_context() -> DatasetContext {
        DatasetContext {
            dataset_name: "Test Dataset".into(),
            data_location: "kafka".into(),
            dataset_purpose: "Transaction".into(),
            dedup_key: Some("id".into()),
            timestamp_key: Some("timestamp".into()),
            storage_option: Some("druid".into()),
            pii_fields: vec![FieldRule::field("email")],
            transformation_fields: vec![FieldRule::field("status").with_expr("UPPER(status)")],
        }
    }

    #[tokio::test]
    async fn test_create_assembles_full_request() {
        let mock = Arc::new(MockPlatformApi::new().with_schema_body(json!({
            "result": {
                "schema": { "type": "object", "properties": { "id": { "type": "string" } } }
            }
        })));
        let outcome = creator(mock.clone())
            .create_dataset(&full_context(), Some(&json!({ "id": "123" })))
            .await
            .unwrap();
        assert_eq!(outcome.status, 200);

        let sent = mock.create_requests();
        assert_eq!(sent.len(), 1);
        let req = &sent[0].request;
        assert_eq!(sent[0].id, "api.datasets.create");
        assert_eq!(req.dataset_id, "test-dataset");
        assert_eq!(req.dataset_type, DatasetType::Transaction);
        assert_eq!(req.name, "Test Dataset");
        assert!(req.validation_config.validate);
        assert_eq!(req.extraction_config.extraction_key, "events");
        assert_eq!(req.extraction_config.dedup_config.dedup_key.as_deref(), Some("id"));
        assert_eq!(req.dedup_config, req.extraction_config.dedup_config);
        assert_eq!(req.data_schema["properties"]["id"]["type"], "string");
        assert!(req.dataset_config.indexing_config.olap_store_enabled);
        assert!(!req.dataset_config.indexing_config.lakehouse_enabled);
        assert!(!req.dataset_config.indexing_config.cache_enabled);
        assert_eq!(
            req.dataset_config.keys_config.timestamp_key.as_deref(),
            Some("timestamp")
        );
        assert_eq!(req.transformations_config.len(), 2);
        assert_eq!(
            req.transformations_config[0].transformation_function.kind,
            FunctionType::Mask
        );
        assert_eq!(req.connectors_config.len(), 1);
        assert_eq!(
            req.connectors_config[0].connector_config.topic,
            "test dataset-events"
        );
    }

    #[tokio::test]
    async fn test_schema_request_carries_sample_event() {
        let mock = Arc::new(MockPlatformApi::new());
        creator(mock.clone())
            .create_dataset(&full_context(), Some(&json!("{\"id\": \"1\"}")))
            .await
            .unwrap();

        let sent = mock.schema_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request.config.dataset, "Test Dataset");
        assert_eq!(sent[0].request.data.len(), 1);
        assert_eq!(sent[0].request.data[0]["id"], "1");
    }

    #[tokio::test]
    async fn test_no_sample_event_sends_empty_data() {
        let mock = Arc::new(MockPlatformApi::new());
        creator(mock.clone())
            .create_dataset(&DatasetContext::new("orders", "kafka"), None)
            .await
            .unwrap();
        assert!(mock.schema_requests()[0].request.data.is_empty());
    }

    #[tokio::test]
    async fn test_empty_schema_falls_back_to_default() {
        let mock = Arc::new(
            MockPlatformApi::new().with_schema_body(json!({ "result": { "schema": {} } })),
        );
        creator(mock.clone())
            .create_dataset(&full_context(), None)
            .await
            .unwrap();
        assert_eq!(mock.create_requests()[0].request.data_schema, default_schema());
    }

    #[tokio::test]
    async fn test_missing_result_falls_back_to_default() {
        let mock = Arc::new(MockPlatformApi::new().with_schema_body(json!({ "id": "x" })));
        let outcome = creator(mock.clone())
            .create_dataset(&full_context(), None)
            .await
            .unwrap();
        assert_eq!(mock.create_requests()[0].request.data_schema, default_schema());
        assert_eq!(outcome.schema_response, json!({ "id": "x" }));
    }

    #[tokio::test]
    async fn test_create_connection_failure_is_service_unavailable() {
        let mock = Arc::new(MockPlatformApi::new().with_create_failure(MockFailure::Unavailable));
        let err = creator(mock.clone())
            .create_dataset(&full_context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::ServiceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_schema_connection_failure_skips_create() {
        let mock = Arc::new(MockPlatformApi::new().with_schema_failure(MockFailure::Unavailable));
        let err = creator(mock.clone())
            .create_dataset(&full_context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::ServiceUnavailable { .. }));
        assert!(mock.create_requests().is_empty());
    }

    #[tokio::test]
    async fn test_schema_rejection_carries_status() {
        let mock = Arc::new(MockPlatformApi::new().with_schema_failure(MockFailure::Rejected(400)));
        let err = creator(mock.clone())
            .create_dataset(&full_context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::SchemaInferenceFailed { status: 400 }));
        assert!(mock.create_requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_business_failure_is_passed_through() {
        let body = json!({
            "params": { "status": "FAILED" },
            "error": { "code": "DATASET_EXISTS" }
        });
        let mock = Arc::new(MockPlatformApi::new().with_create_response(409, body.clone()));
        let outcome = creator(mock)
            .create_dataset(&full_context(), None)
            .await
            .unwrap();
        assert_eq!(outcome.status, 409);
        assert_eq!(outcome.create_response, body);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let mock = Arc::new(MockPlatformApi::new());
        let c = creator(mock.clone());

        let mut bad_storage = full_context();
        bad_storage.storage_option = Some("cassandra".into());
        let mut bad_rule = full_context();
        bad_rule.pii_fields.push(FieldRule::default());

        for ctx in [DatasetContext::new("", "kafka"), bad_storage, bad_rule] {
            let err = c.create_dataset(&ctx, None).await.unwrap_err();
            assert!(matches!(err, DatasetError::MalformedInput(_)), "{err:?}");
        }
        let err = c
            .create_dataset(&full_context(), Some(&json!("not json")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MalformedInput(ValidationError::SampleEventNotJson { .. })
        ));
        assert!(mock.schema_requests().is_empty());
        assert!(mock.create_requests().is_empty());
    }

    #[test]
    fn test_build_lakehouse_and_unknown_location() {
        let c = creator(Arc::new(MockPlatformApi::new()));
        let mut ctx = DatasetContext::new("Clicks", "http");
        ctx.storage_option = Some("Hudi".into());
        ctx.dataset_purpose = "bogus".into();

        let req = c.build_create_request(&ctx, default_schema()).unwrap();
        assert!(req.dataset_config.indexing_config.lakehouse_enabled);
        assert!(!req.dataset_config.indexing_config.olap_store_enabled);
        assert_eq!(req.dataset_type, DatasetType::Event);
        assert!(req.connectors_config.is_empty());
        assert!(req.dedup_config.dedup_key.is_none());
    }

    #[test]
    fn test_create_request_wire_shape() {
        let c = creator(Arc::new(MockPlatformApi::new()));
        let req = c.build_create_request(&full_context(), default_schema()).unwrap();
        let json = serde_json::to_value(req.into_envelope()).unwrap();
        let body = &json["request"];
        assert_eq!(body["type"], "transaction");
        assert_eq!(body["validation_config"], json!({ "validate": true, "mode": "Strict" }));
        assert_eq!(
            body["dataset_config"]["indexing_config"],
            json!({
                "olap_store_enabled": true,
                "lakehouse_enabled": false,
                "cache_enabled": false
            })
        );
        assert_eq!(body["connectors_config"][0]["id"], "kafka");
        assert_eq!(
            body["transformations_config"][1]["transformation_function"]["type"],
            "transform"
        );
    }
}
