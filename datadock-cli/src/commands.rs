//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use datadock_core::config::{load_config, to_toml};
use datadock_core::{DatadockConfig, GatewayState, HttpPlatformClient, run_gateway};
use tracing::info;

use crate::{Commands, ConfigAction};

pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => handle_serve(workspace, config_file, host, port).await,
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn resolve_config(
    workspace: &Path,
    config_file: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<DatadockConfig> {
    let mut config = load_config(Some(workspace), config_file, None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Apply CLI overrides
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }
    Ok(config)
}

async fn handle_serve(
    workspace: &Path,
    config_file: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let config = resolve_config(workspace, config_file, host, port)?;

    let client = HttpPlatformClient::new(&config.platform)
        .map_err(|e| anyhow::anyhow!("Failed to build platform client: {}", e))?;
    let state = GatewayState::from_config(Arc::new(client), &config)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    info!(
        platform = %config.platform.base_url,
        metrics = %config.platform.metrics_base_url(),
        timezone = %config.metrics.timezone,
        "Starting datadock gateway"
    );
    run_gateway(Arc::new(state), &config.gateway).await?;
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".datadock");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = to_toml(&DatadockConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(workspace), config_file, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            println!("{}", to_toml(&config)?);
            Ok(())
        }
    }
}
