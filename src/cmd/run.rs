//! Terminal campaign runs: `campaign-forge run`, `resume` and `refine`.

use anyhow::{Context, Result, bail};
use std::time::Duration;

use campaign_forge::campaign::{Campaign, CampaignStatus};
use campaign_forge::config::CampaignConfig;
use campaign_forge::orchestrator::CampaignOrchestrator;
use campaign_forge::ui::{CampaignUI, ReviewDecision, prompt_review};

use super::build_orchestrator;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub async fn cmd_run(
    config: &CampaignConfig,
    brief: &str,
    offline: bool,
    yes: bool,
    verbose: bool,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, offline);
    let summary = orchestrator
        .start_campaign(brief)
        .await
        .context("Failed to start campaign")?;

    println!(
        "Started {} campaign {}",
        summary.campaign_type, summary.id
    );
    let ui = CampaignUI::new(verbose);
    let campaign = drive(&orchestrator, &summary.id, yes, &ui).await?;
    orchestrator.flush_snapshots().await;
    conclude(&ui, &campaign)
}

pub async fn cmd_resume(
    config: &CampaignConfig,
    id: &str,
    offline: bool,
    yes: bool,
    verbose: bool,
) -> Result<()> {
    let orchestrator = restored(config, offline)?;
    if !orchestrator.resume_campaign(id).await? {
        bail!("Campaign {} is not awaiting review", id);
    }
    let ui = CampaignUI::new(verbose);
    let campaign = drive(&orchestrator, id, yes, &ui).await?;
    orchestrator.flush_snapshots().await;
    conclude(&ui, &campaign)
}

pub async fn cmd_refine(
    config: &CampaignConfig,
    id: &str,
    instructions: &str,
    offline: bool,
    yes: bool,
    verbose: bool,
) -> Result<()> {
    if instructions.trim().is_empty() {
        bail!("Refinement instructions must not be empty");
    }
    let orchestrator = restored(config, offline)?;
    if !orchestrator.refine_campaign(id, instructions).await? {
        bail!("Campaign {} is not awaiting review", id);
    }
    let ui = CampaignUI::new(verbose);
    let campaign = drive(&orchestrator, id, yes, &ui).await?;
    orchestrator.flush_snapshots().await;
    conclude(&ui, &campaign)
}

fn restored(config: &CampaignConfig, offline: bool) -> Result<CampaignOrchestrator> {
    let orchestrator = build_orchestrator(config, offline);
    let report = orchestrator
        .restore()
        .context("Failed to restore campaign snapshots")?;
    tracing::debug!(restored = report.restored, "Loaded snapshots");
    Ok(orchestrator)
}

/// Follow a campaign until it reaches a terminal status, prompting at each
/// review checkpoint.
///
/// Ctrl+C stops following and cancels pending continuations; the snapshot is
/// left for a later `resume`, or marked failed on the next restore if a phase
/// was mid-flight.
async fn drive(
    orchestrator: &CampaignOrchestrator,
    id: &str,
    auto_approve: bool,
    ui: &CampaignUI,
) -> Result<Campaign> {
    loop {
        let campaign = orchestrator.get_campaign(id)?;
        ui.update(&campaign);

        if campaign.status.is_terminal() {
            return Ok(campaign);
        }

        if campaign.is_paused() {
            let decision = ui.suspend(|| prompt_review(&campaign, auto_approve))?;
            match decision {
                ReviewDecision::Approve => {
                    orchestrator.resume_campaign(id).await?;
                }
                ReviewDecision::Refine(instructions) => {
                    if !orchestrator.refine_campaign(id, &instructions).await? {
                        ui.suspend(|| eprintln!("Blank instructions ignored."));
                    }
                }
                ReviewDecision::Cancel => {
                    orchestrator.cancel_campaign(id)?;
                    // Cancelled campaigns leave the registry, so report from the last view.
                    let mut cancelled = campaign;
                    cancelled.set_status(CampaignStatus::Cancelled);
                    return Ok(cancelled);
                }
            }
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = tokio::signal::ctrl_c() => {
                orchestrator.shutdown();
                orchestrator.flush_snapshots().await;
                let campaign = orchestrator.get_campaign(id)?;
                ui.finish(&campaign);
                bail!("Interrupted; campaign {} left {}", id, campaign.status);
            }
        }
    }
}

fn conclude(ui: &CampaignUI, campaign: &Campaign) -> Result<()> {
    ui.finish(campaign);
    if campaign.status == CampaignStatus::Failed {
        bail!(
            "Campaign {} failed: {}",
            campaign.id,
            campaign.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
