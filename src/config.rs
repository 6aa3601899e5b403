//! Configuration for campaign-forge, read from `campaign.toml`.
//!
//! Settings are layered file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [campaign]
//! manual_review = false
//! require_final_signoff = true
//! pacing_delay_ms = 1500
//!
//! [quality]
//! confidence_threshold = 0.7
//!
//! [storage]
//! snapshot_dir = ".campaign-forge/campaigns"
//!
//! [agent]
//! command = "claude"
//! timeout_secs = 300
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3141
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agents::DEFAULT_AGENT_TIMEOUT_SECS;
use crate::campaign::CampaignOptions;
use crate::quality::DEFAULT_CONFIDENCE_THRESHOLD;

pub const CONFIG_FILE_NAME: &str = "campaign.toml";

/// Review and pacing defaults for new campaigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSection {
    /// Pause for review before every phase
    #[serde(default)]
    pub manual_review: bool,
    /// Pause before final sign-off even without manual review
    #[serde(default)]
    pub require_final_signoff: bool,
    /// Delay between auto-advanced phases, in milliseconds
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,
}

fn default_pacing_delay_ms() -> u64 {
    1500
}

impl Default for CampaignSection {
    fn default() -> Self {
        Self {
            manual_review: false,
            require_final_signoff: false,
            pacing_delay_ms: default_pacing_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySection {
    /// Minimum confidence for a deliverable to pass (0.0-1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory for campaign snapshots (default: platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Agent CLI command (default: "claude")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_AGENT_TIMEOUT_SECS
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// The complete campaign.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignToml {
    #[serde(default)]
    pub campaign: CampaignSection,
    #[serde(default)]
    pub quality: QualitySection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub server: ServerSection,
}

impl CampaignToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse campaign.toml")
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize campaign.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Manual review, with `CAMPAIGN_MANUAL_REVIEW` overriding the file.
    pub fn manual_review(&self) -> bool {
        env_flag("CAMPAIGN_MANUAL_REVIEW").unwrap_or(self.campaign.manual_review)
    }

    /// Final sign-off, with `CAMPAIGN_REQUIRE_SIGNOFF` overriding the file.
    pub fn require_final_signoff(&self) -> bool {
        env_flag("CAMPAIGN_REQUIRE_SIGNOFF").unwrap_or(self.campaign.require_final_signoff)
    }

    /// Snapshot directory (env → file → platform data dir).
    pub fn snapshot_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("CAMPAIGN_SNAPSHOT_DIR")
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }
        self.storage.snapshot_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("campaign-forge").join("campaigns"))
                .unwrap_or_else(|| PathBuf::from(".campaign-forge").join("campaigns"))
        })
    }

    /// Agent command, with fallback to `CLAUDE_CMD`.
    pub fn agent_command(&self) -> String {
        self.agent
            .command
            .clone()
            .or_else(|| std::env::var("CLAUDE_CMD").ok())
            .unwrap_or_else(|| "claude".to_string())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let threshold = self.quality.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            warnings.push(format!(
                "Invalid confidence_threshold {}: must be between 0.0 and 1.0",
                threshold
            ));
        }
        if self.agent.timeout_secs == 0 {
            warnings.push("agent.timeout_secs is 0: every agent call would time out".to_string());
        }
        if self.campaign.pacing_delay_ms > 60_000 {
            warnings.push(format!(
                "pacing_delay_ms {} is over a minute between phases",
                self.campaign.pacing_delay_ms
            ));
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0: an ephemeral port will be chosen".to_string());
        }
        if let Some(command) = &self.agent.command
            && command.trim().is_empty()
        {
            warnings.push("agent.command is empty".to_string());
        }

        warnings
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolved configuration: campaign.toml plus CLI overrides.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// File the settings were read from, if it existed
    pub path: Option<PathBuf>,
    pub toml: CampaignToml,
    /// CLI override: force manual review on
    pub cli_manual_review: bool,
    /// CLI override: force final sign-off on
    pub cli_require_signoff: bool,
    /// CLI override for the snapshot directory
    pub cli_snapshot_dir: Option<PathBuf>,
}

impl CampaignConfig {
    /// Read `path`, or `./campaign.toml` when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let toml = CampaignToml::load_or_default(&path)?;
        Ok(Self {
            path: path.exists().then_some(path),
            toml,
            cli_manual_review: false,
            cli_require_signoff: false,
            cli_snapshot_dir: None,
        })
    }

    pub fn from_toml(toml: CampaignToml) -> Self {
        Self {
            path: None,
            toml,
            cli_manual_review: false,
            cli_require_signoff: false,
            cli_snapshot_dir: None,
        }
    }

    pub fn campaign_options(&self) -> CampaignOptions {
        CampaignOptions {
            manual_review: self.cli_manual_review || self.toml.manual_review(),
            require_final_signoff: self.cli_require_signoff || self.toml.require_final_signoff(),
        }
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.cli_snapshot_dir
            .clone()
            .unwrap_or_else(|| self.toml.snapshot_dir())
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.toml.campaign.pacing_delay_ms)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.agent.timeout_secs)
    }

    pub fn agent_command(&self) -> String {
        self.toml.agent_command()
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.toml.quality.confidence_threshold
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
