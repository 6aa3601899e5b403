//! Stored campaign commands — `campaign-forge list`, `show` and `cancel`.

use anyhow::{Context, Result};
use console::style;

use campaign_forge::campaign::{Campaign, CampaignStatus, Urgency};
use campaign_forge::config::CampaignConfig;
use campaign_forge::orchestrator::{FileSnapshotStore, SnapshotStore};

use super::build_orchestrator;

pub fn cmd_list(config: &CampaignConfig) -> Result<()> {
    let store = FileSnapshotStore::new(config.snapshot_dir());
    let campaigns = store
        .load_all()
        .context("Failed to read campaign snapshots")?;

    if campaigns.is_empty() {
        println!("No campaigns in {}", store.dir().display());
        return Ok(());
    }

    println!();
    for campaign in &campaigns {
        println!(
            "{}  {:<12} {:<18} {}",
            style(&campaign.id).dim(),
            status_label(campaign),
            campaign.context.campaign_type,
            truncate(&campaign.brief, 48)
        );
    }
    println!();
    println!("{} campaign(s)", campaigns.len());
    Ok(())
}

pub fn cmd_show(config: &CampaignConfig, id: &str, json: bool) -> Result<()> {
    let store = FileSnapshotStore::new(config.snapshot_dir());
    let campaign = store
        .load(id)
        .context("Failed to read campaign snapshot")?
        .with_context(|| format!("Campaign not found: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&campaign)?);
        return Ok(());
    }

    println!();
    println!("Campaign {}", style(&campaign.id).bold());
    println!("  status:  {}", status_label(&campaign));
    println!("  type:    {}", campaign.context.campaign_type);
    println!("  market:  {}", campaign.context.target_market);
    println!("  urgency: {}", urgency_label(campaign.context.urgency));
    println!("  brief:   {}", campaign.brief);
    if let Some(error) = &campaign.error {
        println!("  error:   {}", style(error).red());
    }
    if let (Some(pending), Some(review)) = (campaign.pending_phase, campaign.awaiting_review) {
        println!(
            "  review:  {} is waiting; {} is next",
            review.title(),
            pending.title()
        );
    }

    println!();
    println!("Phases:");
    if campaign.phases.is_empty() {
        println!("  (none yet)");
    }
    for (phase, result) in &campaign.phases {
        let confidence = campaign
            .quality_metrics
            .get(phase)
            .map(|m| format!("{:.0}%", m.confidence * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} attempt {}  confidence {}{}",
            phase.title(),
            result.attempt,
            confidence,
            if result.degraded { "  (degraded)" } else { "" }
        );
    }
    println!();
    Ok(())
}

pub async fn cmd_cancel(config: &CampaignConfig, id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, true);
    orchestrator
        .restore()
        .context("Failed to restore campaign snapshots")?;

    if orchestrator.cancel_campaign(id)? {
        println!("Cancelled campaign {}", id);
    } else {
        println!("Campaign {} was not found or has already finished", id);
    }
    // Restore may also have re-saved reconciled snapshots.
    orchestrator.flush_snapshots().await;
    Ok(())
}

fn status_label(campaign: &Campaign) -> String {
    let label = campaign.status.to_string();
    match campaign.status {
        CampaignStatus::Completed => style(label).green().to_string(),
        CampaignStatus::Failed => style(label).red().to_string(),
        CampaignStatus::Paused => style(label).yellow().to_string(),
        CampaignStatus::Cancelled => style(label).dim().to_string(),
        _ => style(label).cyan().to_string(),
    }
}

fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::High => "high",
        Urgency::Medium => "medium",
        Urgency::Normal => "normal",
    }
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
