//! Configuration system for datadock.
//!
//! Uses `figment` for layered configuration: defaults -> config files ->
//! environment -> explicit overrides. Configuration is loaded from
//! `~/.config/datadock/config.toml` and/or `.datadock/config.toml` in the
//! working directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dataset::ConnectorSettings;
use crate::error::ConfigError;
use crate::gateway::GatewayConfig;

/// Top-level configuration for the datadock server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatadockConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub connectors: ConnectorSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Where the downstream data platform lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL for the dataset endpoints (`{base}/datasets/...`).
    pub base_url: String,
    /// Base URL for `data/metrics`; falls back to `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_base_url: Option<String>,
    /// Upper bound for every outbound call, connect through body.
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3005/v2".to_string(),
            metrics_base_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl PlatformConfig {
    pub fn metrics_base_url(&self) -> &str {
        self.metrics_base_url.as_deref().unwrap_or(&self.base_url)
    }
}

/// Settings for the metrics enrichment listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// IANA timezone the day windows are computed in.
    pub timezone: String,
    /// Datasets enriched at the same time.
    pub max_concurrent_datasets: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
            max_concurrent_datasets: 8,
        }
    }
}

impl MetricsConfig {
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::UnknownTimezone {
                name: self.timezone.clone(),
            })
    }
}

impl DatadockConfig {
    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.metrics.tz()?;
        if self.metrics.max_concurrent_datasets == 0 {
            return Err(ConfigError::Invalid {
                message: "metrics.max_concurrent_datasets must be at least 1".into(),
            });
        }
        if self.platform.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "platform.request_timeout_secs must be at least 1".into(),
            });
        }
        for (key, url) in [
            ("platform.base_url", self.platform.base_url.as_str()),
            ("platform.metrics_base_url", self.platform.metrics_base_url()),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    message: format!("{key} must be an http(s) URL, got '{url}'"),
                });
            }
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `DATADOCK_`)
/// 3. `BACKEND_URL`, mapped to `platform.base_url`
/// 4. An explicit config file
/// 5. Workspace-local config (`.datadock/config.toml`)
/// 6. User config (`~/.config/datadock/config.toml`)
/// 7. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&DatadockConfig>,
) -> Result<DatadockConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DatadockConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "datadock", "datadock") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".datadock").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::Invalid {
                message: format!("config file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(
        Env::raw()
            .only(&["BACKEND_URL"])
            .map(|_| "platform.base_url".into()),
    );

    // DATADOCK_PLATFORM__BASE_URL, DATADOCK_METRICS__TIMEZONE, etc.
    figment = figment.merge(Env::prefixed("DATADOCK_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: DatadockConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Render a configuration as TOML, for `datadock config show`.
pub fn to_toml(config: &DatadockConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
