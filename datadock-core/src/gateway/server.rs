//! HTTP gateway server built on axum.

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::GatewayConfig;
use super::handlers::{create_dataset_handler, health_handler, list_datasets_handler};
use crate::config::DatadockConfig;
use crate::error::ConfigError;
use crate::orchestrator::{DatasetCreator, MetricsEnricher};
use crate::platform::PlatformApi;

/// Everything a request handler needs.
pub struct GatewayState {
    pub creator: DatasetCreator,
    pub enricher: MetricsEnricher,
    started_at: Instant,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(creator: DatasetCreator, enricher: MetricsEnricher) -> Self {
        Self {
            creator,
            enricher,
            started_at: Instant::now(),
        }
    }

    /// Wire both orchestrators to one platform handle.
    pub fn from_config(
        platform: Arc<dyn PlatformApi>,
        config: &DatadockConfig,
    ) -> Result<Self, ConfigError> {
        let creator = DatasetCreator::new(platform.clone(), config.connectors.clone());
        let enricher = MetricsEnricher::new(
            platform,
            config.metrics.tz()?,
            config.metrics.max_concurrent_datasets,
        );
        Ok(Self::new(creator, enricher))
    }

    /// Uptime in seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Build the axum Router with the health and dataset routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/datasets/create", post(create_dataset_handler))
        .route("/datasets/list", get(list_datasets_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway on the configured address.
///
/// Runs until the listener fails or the process is stopped.
pub async fn run(state: SharedState, config: &GatewayConfig) -> Result<(), std::io::Error> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
