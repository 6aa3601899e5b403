//! HTTP API server command — `campaign-forge serve`.

use anyhow::Result;

use campaign_forge::config::CampaignConfig;
use campaign_forge::server::{ServerConfig, start_server};

use super::build_orchestrator;

pub async fn cmd_serve(
    config: &CampaignConfig,
    port: Option<u16>,
    host: Option<String>,
    dev: bool,
    offline: bool,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, offline);
    let server = &config.toml.server;

    start_server(
        ServerConfig {
            host: host.unwrap_or_else(|| server.host.clone()),
            port: port.unwrap_or(server.port),
            dev_mode: dev,
        },
        orchestrator,
    )
    .await
}
