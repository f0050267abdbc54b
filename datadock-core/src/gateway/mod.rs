//! # HTTP Gateway
//!
//! Exposes the dataset orchestrators over HTTP: dataset creation, the
//! enriched listing, and a health probe. Errors are rendered as JSON bodies
//! with a stable `error_code`.

mod error;
mod handlers;
mod server;

pub use handlers::CreateDatasetBody;
pub use server::{GatewayState, SharedState, router as gateway_router, run as run_gateway};

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}
