//! Configuration view and validation commands — `campaign-forge config`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use campaign_forge::config::{CONFIG_FILE_NAME, CampaignConfig, CampaignToml};

use super::super::ConfigCommands;

pub fn cmd_config(path: Option<&Path>, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Campaign Configuration");
            println!("======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                CampaignToml::load(&config_path)?
            } else {
                println!("No {} found at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Using default configuration.");
                CampaignToml::default()
            };
            println!();
            print_sections(&toml);

            println!("Effective values (with env overrides):");
            let config = CampaignConfig::from_toml(toml);
            let options = config.campaign_options();
            println!("  manual_review = {}", options.manual_review);
            println!("  require_final_signoff = {}", options.require_final_signoff);
            println!("  snapshot_dir = \"{}\"", config.snapshot_dir().display());
            println!("  agent_command = \"{}\"", config.agent_command());
            println!();

            if !config_path.exists() {
                println!("Run 'campaign-forge config init' to create a {} file.", CONFIG_FILE_NAME);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
                return Ok(());
            }

            let toml = CampaignToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }

            CampaignToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [campaign] manual_review, require_final_signoff, pacing_delay_ms");
            println!("  - [quality] confidence_threshold");
            println!("  - [storage] snapshot_dir");
            println!("  - [agent] command, timeout_secs");
            println!("  - [server] host, port");
            println!();
        }
    }

    Ok(())
}

fn print_sections(toml: &CampaignToml) {
    println!("[campaign]");
    println!("  manual_review = {}", toml.campaign.manual_review);
    println!("  require_final_signoff = {}", toml.campaign.require_final_signoff);
    println!("  pacing_delay_ms = {}", toml.campaign.pacing_delay_ms);
    println!();

    println!("[quality]");
    println!("  confidence_threshold = {}", toml.quality.confidence_threshold);
    println!();

    if let Some(dir) = &toml.storage.snapshot_dir {
        println!("[storage]");
        println!("  snapshot_dir = \"{}\"", dir.display());
        println!();
    }

    println!("[agent]");
    if let Some(command) = &toml.agent.command {
        println!("  command = \"{}\"", command);
    }
    println!("  timeout_secs = {}", toml.agent.timeout_secs);
    println!();

    println!("[server]");
    println!("  host = \"{}\"", toml.server.host);
    println!("  port = {}", toml.server.port);
    println!();
}
