//! CLI command implementations.
//!
//! | Module      | Commands handled                          |
//! |-------------|-------------------------------------------|
//! | `run`       | `Run`, `Resume`, `Refine`                 |
//! | `campaigns` | `List`, `Show`, `Cancel`                  |
//! | `serve`     | `Serve`                                   |
//! | `config`    | `Config`                                  |

pub mod campaigns;
pub mod config;
pub mod run;
pub mod serve;

use std::sync::Arc;

use campaign_forge::agents::{AgentInvoker, CannedInvoker, ClaudeInvoker};
use campaign_forge::config::CampaignConfig;
use campaign_forge::orchestrator::{CampaignOrchestrator, FileSnapshotStore};
use campaign_forge::quality::ConfidenceQualityGate;

pub use campaigns::{cmd_cancel, cmd_list, cmd_show};
pub use config::cmd_config;
pub use run::{cmd_refine, cmd_resume, cmd_run};
pub use serve::cmd_serve;

/// Build an orchestrator wired to the configured store, gate and agent.
pub fn build_orchestrator(config: &CampaignConfig, offline: bool) -> CampaignOrchestrator {
    let invoker: Arc<dyn AgentInvoker> = if offline {
        Arc::new(CannedInvoker::new())
    } else {
        Arc::new(ClaudeInvoker::new(config.agent_command(), config.agent_timeout()))
    };
    CampaignOrchestrator::builder(invoker)
        .store(Arc::new(FileSnapshotStore::new(config.snapshot_dir())))
        .quality_gate(Arc::new(ConfidenceQualityGate::new(
            config.confidence_threshold(),
        )))
        .pacing_delay(config.pacing_delay())
        .default_options(config.campaign_options())
        .build()
}
