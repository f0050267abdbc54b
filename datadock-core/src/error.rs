//! Error types for the datadock core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the downstream platform, caller input, dataset orchestration,
//! and configuration domains.

/// Top-level error type for the datadock core library.
#[derive(Debug, thiserror::Error)]
pub enum DatadockError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transport-level errors from calls to the downstream data platform.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The service could not be reached, or did not answer in time.
    #[error("{endpoint} unreachable: {message}")]
    Unavailable { endpoint: String, message: String },

    #[error("{endpoint} rejected the request with status {status}")]
    Rejected { endpoint: String, status: u16 },

    #[error("{endpoint} returned a malformed response: {message}")]
    MalformedResponse { endpoint: String, message: String },
}

impl PlatformError {
    pub fn endpoint(&self) -> &str {
        match self {
            PlatformError::Unavailable { endpoint, .. }
            | PlatformError::Rejected { endpoint, .. }
            | PlatformError::MalformedResponse { endpoint, .. } => endpoint,
        }
    }
}

/// Errors in caller-supplied input.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("dataset_name must not be empty")]
    EmptyDatasetName,

    #[error("{list}[{index}] is missing the required 'field' key")]
    MissingField { list: &'static str, index: usize },

    #[error("unsupported PII treatment '{value}' (expected 'mask' or 'encrypt')")]
    UnknownTreatment { value: String },

    #[error("unsupported storage option '{value}'")]
    UnknownStorageOption { value: String },

    #[error("sample_event is not valid JSON: {message}")]
    SampleEventNotJson { message: String },

    #[error("sample_event must be a JSON object")]
    SampleEventNotObject,

    #[error("invalid request body: {message}")]
    Body { message: String },
}

/// Outcome errors of the dataset orchestrators, as surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to connect to the data platform: {message}")]
    ServiceUnavailable { message: String },

    #[error("Schema inference failed with status {status}")]
    SchemaInferenceFailed { status: u16 },

    #[error("Failed to fetch datasets list (status {status})")]
    ListFailed { status: u16 },

    #[error("Malformed input: {0}")]
    MalformedInput(#[from] ValidationError),

    #[error("{0}")]
    Internal(String),
}

impl DatasetError {
    /// Fold a transport error into the caller-facing taxonomy.
    ///
    /// `Rejected` has no generic meaning; call sites that care about a
    /// rejection map it themselves before falling back here.
    pub fn from_platform(err: PlatformError) -> Self {
        match err {
            PlatformError::Unavailable { message, .. } => {
                DatasetError::ServiceUnavailable { message }
            }
            other => DatasetError::Internal(other.to_string()),
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Unknown timezone: {name}")]
    UnknownTimezone { name: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `DatadockError`.
pub type Result<T> = std::result::Result<T, DatadockError>;
