//! Ingestion connector descriptors for new datasets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Connector wiring settings shared by every creation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Brokers written into every Kafka connector descriptor.
    pub kafka_brokers: Vec<String>,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            kafka_brokers: vec!["localhost:9092".to_string()],
        }
    }
}

/// A downstream ingestion binding sent with the creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDescriptor {
    pub id: String,
    pub connector_id: String,
    pub connector_config: KafkaConnectorConfig,
    pub operations_config: Map<String, Value>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaConnectorConfig {
    pub brokers: Vec<String>,
    pub topic: String,
}

/// Build the connector list for a data location.
///
/// Only `kafka` (case-insensitive) is wired; every other location yields an
/// empty list rather than an error.
pub fn get_connector_config(
    data_location: &str,
    dataset_name: &str,
    settings: &ConnectorSettings,
) -> Vec<ConnectorDescriptor> {
    let location = data_location.to_lowercase();
    if location != "kafka" {
        return Vec::new();
    }

    vec![ConnectorDescriptor {
        id: location,
        connector_id: connector_id(data_location),
        connector_config: KafkaConnectorConfig {
            brokers: settings.kafka_brokers.clone(),
            topic: format!("{}-events", dataset_name.to_lowercase()),
        },
        operations_config: Map::new(),
        version: "1.0".to_string(),
    }]
}

/// `{location}-connector-{8 hex chars}`, fresh on every call.
fn connector_id(data_location: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-connector-{}", data_location, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kafka_emits_one_descriptor() {
        let connectors =
            get_connector_config("kafka", "My Dataset", &ConnectorSettings::default());
        assert_eq!(connectors.len(), 1);
        let c = &connectors[0];
        assert_eq!(c.id, "kafka");
        assert_eq!(c.connector_config.topic, "my dataset-events");
        assert_eq!(c.connector_config.brokers, vec!["localhost:9092"]);
        assert!(c.operations_config.is_empty());
        assert_eq!(c.version, "1.0");
    }

    #[test]
    fn test_kafka_is_case_insensitive() {
        let connectors = get_connector_config("KaFkA", "x", &ConnectorSettings::default());
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].id, "kafka");
        assert!(connectors[0].connector_id.starts_with("KaFkA-connector-"));
    }

    #[test]
    fn test_unknown_location_yields_empty() {
        let settings = ConnectorSettings::default();
        assert!(get_connector_config("http", "x", &settings).is_empty());
        assert!(get_connector_config("s3", "x", &settings).is_empty());
        assert!(get_connector_config("", "x", &settings).is_empty());
    }

    #[test]
    fn test_connector_id_shape_and_freshness() {
        let settings = ConnectorSettings::default();
        let a = get_connector_config("kafka", "x", &settings).remove(0);
        let b = get_connector_config("kafka", "x", &settings).remove(0);

        let suffix = a.connector_id.strip_prefix("kafka-connector-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.connector_id, b.connector_id);
    }

    #[test]
    fn test_configured_brokers_are_used() {
        let settings = ConnectorSettings {
            kafka_brokers: vec!["kafka-0:9092".into(), "kafka-1:9092".into()],
        };
        let connectors = get_connector_config("kafka", "orders", &settings);
        assert_eq!(
            connectors[0].connector_config.brokers,
            vec!["kafka-0:9092", "kafka-1:9092"]
        );
    }

    #[test]
    fn test_descriptor_serializes_to_wire_shape() {
        let connectors = get_connector_config("kafka", "Orders", &ConnectorSettings::default());
        let json = serde_json::to_value(&connectors[0]).unwrap();
        assert_eq!(json["connector_config"]["topic"], "orders-events");
        assert_eq!(json["operations_config"], serde_json::json!({}));
    }
}
