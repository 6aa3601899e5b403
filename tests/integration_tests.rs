//! Integration tests for campaign-forge
//!
//! These tests drive the CLI binary and the orchestrator end to end.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a campaign-forge Command with review env overrides cleared
fn campaign_forge() -> Command {
    let mut cmd = cargo_bin_cmd!("campaign-forge");
    cmd.env_remove("CAMPAIGN_MANUAL_REVIEW")
        .env_remove("CAMPAIGN_REQUIRE_SIGNOFF")
        .env_remove("CAMPAIGN_SNAPSHOT_DIR");
    cmd
}

/// Helper to create a temporary working directory
fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a campaign.toml with no pacing delay and a local snapshot dir
fn write_fast_config(dir: &Path) {
    let content = format!(
        r#"
[campaign]
pacing_delay_ms = 0

[storage]
snapshot_dir = "{}"
"#,
        dir.join("snapshots").display()
    );
    fs::write(dir.join("campaign.toml"), content).unwrap();
}

/// Extract the campaign id from `run` output
fn started_id(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find_map(|line| {
            line.strip_prefix("Started ")
                .and_then(|rest| rest.split_whitespace().last())
        })
        .expect("run prints the started campaign id")
        .to_string()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        campaign_forge()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("serve"));
    }

    #[test]
    fn test_version() {
        campaign_forge().arg("--version").assert().success();
    }

    #[test]
    fn test_list_empty_snapshot_dir() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        campaign_forge()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No campaigns"));
    }

    #[test]
    fn test_show_unknown_campaign_fails() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        campaign_forge()
            .current_dir(dir.path())
            .args(["show", "does-not-exist"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Campaign not found"));
    }

    #[test]
    fn test_run_rejects_empty_brief() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        campaign_forge()
            .current_dir(dir.path())
            .args(["run", "   ", "--offline", "--yes"])
            .assert()
            .failure();
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_dir();

        campaign_forge()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using default configuration"))
            .stdout(predicate::str::contains("confidence_threshold = 0.7"));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let dir = create_temp_dir();

        campaign_forge()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created campaign.toml"));

        assert!(dir.path().join("campaign.toml").exists());

        campaign_forge()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_no_config() {
        let dir = create_temp_dir();

        campaign_forge()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using defaults (valid)"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_dir();
        fs::write(
            dir.path().join("campaign.toml"),
            "[quality]\nconfidence_threshold = 1.5\n",
        )
        .unwrap();

        campaign_forge()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("confidence_threshold"));
    }

    #[test]
    fn test_config_path_flag() {
        let dir = create_temp_dir();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[server]\nport = 4000\n").unwrap();

        campaign_forge()
            .args(["--config", path.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 4000"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("campaign.toml"), "[campaign\nbroken").unwrap();

        campaign_forge()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("campaign.toml"));
    }
}

// =============================================================================
// Offline Campaign Runs
// =============================================================================

mod offline_runs {
    use super::*;

    #[test]
    fn test_run_offline_completes_and_is_listed() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        let output = campaign_forge()
            .current_dir(dir.path())
            .args(["run", "Launch eco-resort in Q3", "--offline", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Started product_launch campaign"))
            .stdout(predicate::str::contains("Campaign complete"))
            .get_output()
            .stdout
            .clone();
        let id = started_id(&output);

        campaign_forge()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains(id.as_str()))
            .stdout(predicate::str::contains("completed"));

        campaign_forge()
            .current_dir(dir.path())
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Collaborative Plan"))
            .stdout(predicate::str::contains("attempt 1"));
    }

    #[test]
    fn test_run_with_manual_review_auto_approved() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        let output = campaign_forge()
            .current_dir(dir.path())
            .args([
                "run",
                "Launch eco-resort in Q3",
                "--manual-review",
                "--offline",
                "--yes",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("ready for review"))
            .get_output()
            .stdout
            .clone();
        let id = started_id(&output);

        let json = campaign_forge()
            .current_dir(dir.path())
            .args(["show", &id, "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let campaign: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(campaign["status"], "completed");
        assert_eq!(campaign["phases"].as_object().unwrap().len(), 5);
        assert_eq!(campaign["manual_review"], true);
    }

    #[test]
    fn test_snapshot_dir_flag_overrides_config() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());
        let other = dir.path().join("elsewhere");

        campaign_forge()
            .current_dir(dir.path())
            .args(["--snapshot-dir", other.to_str().unwrap()])
            .args(["run", "Holiday sale for pet owners", "--offline", "--yes"])
            .assert()
            .success();

        assert_eq!(fs::read_dir(&other).unwrap().count(), 1);
        assert!(!dir.path().join("snapshots").exists());
    }

    #[test]
    fn test_cancel_finished_campaign_is_a_no_op() {
        let dir = create_temp_dir();
        write_fast_config(dir.path());

        let output = campaign_forge()
            .current_dir(dir.path())
            .args(["run", "Launch eco-resort in Q3", "--offline", "--yes"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let id = started_id(&output);

        campaign_forge()
            .current_dir(dir.path())
            .args(["cancel", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("already finished"));

        campaign_forge()
            .current_dir(dir.path())
            .args(["resume", &id, "--offline", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not awaiting review"));
    }
}

// =============================================================================
// Orchestrator Scenarios
// =============================================================================

mod orchestrator {
    use campaign_forge::agents::{ALTERNATIVE_STRATEGY_DIRECTIVE, AgentInvoker, CannedInvoker};
    use campaign_forge::campaign::{
        Campaign, CampaignContext, CampaignOptions, CampaignStatus, MessageKind,
    };
    use campaign_forge::errors::OrchestratorError;
    use campaign_forge::orchestrator::{
        CampaignOrchestrator, FileSnapshotStore, InMemorySnapshotStore, SnapshotStore,
    };
    use campaign_forge::phase::Phase;
    use campaign_forge::quality::FlowDecision;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const BRIEF: &str = "Launch eco-resort in Q3";

    fn build(invoker: Arc<CannedInvoker>, store: Arc<dyn SnapshotStore>) -> CampaignOrchestrator {
        let invoker: Arc<dyn AgentInvoker> = invoker;
        CampaignOrchestrator::builder(invoker)
            .store(store)
            .pacing_delay(Duration::from_millis(1))
            .build()
    }

    fn in_memory(invoker: Arc<CannedInvoker>) -> CampaignOrchestrator {
        build(invoker, Arc::new(InMemorySnapshotStore::new()))
    }

    fn options(manual_review: bool, require_final_signoff: bool) -> CampaignOptions {
        CampaignOptions {
            manual_review,
            require_final_signoff,
        }
    }

    async fn wait_until(
        orchestrator: &CampaignOrchestrator,
        id: &str,
        done: impl Fn(&Campaign) -> bool,
    ) -> Campaign {
        for _ in 0..500 {
            let campaign = orchestrator.get_campaign(id).unwrap();
            if done(&campaign) {
                return campaign;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("campaign {} did not reach the expected state", id);
    }

    fn assert_ordering(campaign: &Campaign) {
        for phase in campaign.phases.keys() {
            for prerequisite in phase.prerequisites() {
                assert!(
                    campaign.phases.contains_key(prerequisite),
                    "{} stored without {}",
                    phase,
                    prerequisite
                );
            }
        }
    }

    fn assert_pause_consistency(campaign: &Campaign) {
        let markers = campaign.pending_phase.is_some() && campaign.awaiting_review.is_some();
        assert_eq!(campaign.status == CampaignStatus::Paused, markers);
    }

    #[tokio::test]
    async fn test_auto_mode_runs_every_phase_to_completion() {
        let invoker = Arc::new(CannedInvoker::new());
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();

        let campaign = wait_until(&orchestrator, &summary.id, |c| c.status.is_terminal()).await;
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(
            campaign.phases.keys().copied().collect::<Vec<_>>(),
            Phase::WORK.to_vec()
        );
        assert!(!campaign.phases.contains_key(&Phase::FinalSignoff));
        assert!(campaign.completed_at.is_some());
        assert!(campaign.conversation.len() >= Phase::WORK.len() + 1);
        assert_eq!(campaign.conversation[0].kind, MessageKind::Brief);
        assert!(
            campaign
                .conversation
                .iter()
                .all(|m| m.kind != MessageKind::Processing)
        );
        assert_eq!(invoker.phases_invoked(), Phase::WORK.to_vec());
        assert_eq!(orchestrator.pending_continuations(&summary.id), 0);
    }

    #[tokio::test]
    async fn test_refine_reruns_reviewed_phase_and_returns_to_same_checkpoint() {
        let invoker = Arc::new(CannedInvoker::new());
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(true, false))
            .await
            .unwrap();

        let paused = wait_until(&orchestrator, &summary.id, |c| c.is_paused()).await;
        assert_eq!(paused.pending_phase, Some(Phase::StrategicInsight));
        assert_eq!(paused.awaiting_review, Some(Phase::Research));

        assert!(
            orchestrator
                .refine_campaign(&summary.id, "focus on Gen Z")
                .await
                .unwrap()
        );
        let refined = wait_until(&orchestrator, &summary.id, |c| {
            c.is_paused() && c.phases.get(&Phase::Research).is_some_and(|r| r.attempt == 2)
        })
        .await;
        assert_eq!(refined.pending_phase, Some(Phase::StrategicInsight));
        assert_eq!(refined.awaiting_review, Some(Phase::Research));
        assert_eq!(refined.phases.len(), 1);
        assert!(refined.context.working_brief.contains("focus on Gen Z"));

        let calls = invoker.calls();
        assert_eq!(invoker.phases_invoked(), vec![Phase::Research, Phase::Research]);
        assert!(
            calls[1]
                .directives
                .iter()
                .any(|d| d.contains("focus on Gen Z"))
        );
    }

    #[tokio::test]
    async fn test_resume_runs_pending_phase_with_refined_input() {
        let invoker = Arc::new(CannedInvoker::new());
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(true, false))
            .await
            .unwrap();
        let id = summary.id.as_str();

        wait_until(&orchestrator, id, |c| c.is_paused()).await;
        assert!(orchestrator.resume_campaign(id).await.unwrap());
        let paused = wait_until(&orchestrator, id, |c| {
            c.is_paused() && c.awaiting_review == Some(Phase::StrategicInsight)
        })
        .await;
        assert_eq!(paused.pending_phase, Some(Phase::Trending));

        assert!(orchestrator.refine_campaign(id, "sharper angle").await.unwrap());
        let refined = wait_until(&orchestrator, id, |c| {
            c.is_paused()
                && c.phases
                    .get(&Phase::StrategicInsight)
                    .is_some_and(|r| r.attempt == 2)
        })
        .await;
        let refined_insight = refined.phases[&Phase::StrategicInsight].deliverable.clone();

        assert!(orchestrator.resume_campaign(id).await.unwrap());
        wait_until(&orchestrator, id, |c| c.phases.contains_key(&Phase::Trending)).await;

        let trending_call = invoker
            .calls()
            .into_iter()
            .find(|r| r.phase == Phase::Trending)
            .unwrap();
        assert_eq!(trending_call.handoff, Some(refined_insight));
        assert_eq!(
            invoker.phases_invoked(),
            vec![
                Phase::Research,
                Phase::StrategicInsight,
                Phase::StrategicInsight,
                Phase::Trending
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_mid_phase_discards_scheduled_work() {
        let invoker = Arc::new(CannedInvoker::new().with_latency(Duration::from_millis(100)));
        let store = Arc::new(InMemorySnapshotStore::new());
        let orchestrator = build(invoker.clone(), store.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();

        wait_until(&orchestrator, &summary.id, |c| {
            c.status == CampaignStatus::Running(Phase::Trending)
        })
        .await;
        assert!(orchestrator.cancel_campaign(&summary.id).unwrap());

        tokio::time::sleep(Duration::from_millis(300)).await;
        orchestrator.flush_snapshots().await;
        assert!(matches!(
            orchestrator.get_campaign(&summary.id),
            Err(OrchestratorError::CampaignNotFound { .. })
        ));
        assert!(orchestrator.list_campaigns().unwrap().is_empty());
        assert!(store.load(&summary.id).unwrap().is_none());
        assert!(!invoker.phases_invoked().contains(&Phase::Story));
        assert_eq!(orchestrator.pending_continuations(&summary.id), 0);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_a_no_op() {
        let orchestrator = in_memory(Arc::new(CannedInvoker::new()));
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(true, false))
            .await
            .unwrap();
        wait_until(&orchestrator, &summary.id, |c| c.is_paused()).await;

        assert!(orchestrator.cancel_campaign(&summary.id).unwrap());
        assert!(!orchestrator.cancel_campaign(&summary.id).unwrap());
        assert!(matches!(
            orchestrator.resume_campaign(&summary.id).await,
            Err(OrchestratorError::CampaignNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_before_first_phase_fires() {
        let invoker = Arc::new(CannedInvoker::new());
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();
        // Cancelled before the spawned continuation gets a chance to run.
        assert!(orchestrator.cancel_campaign(&summary.id).unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(invoker.phases_invoked().is_empty());
        assert!(orchestrator.get_campaign(&summary.id).is_err());
    }

    #[tokio::test]
    async fn test_invocation_failure_fails_campaign_and_freezes_it() {
        let invoker = Arc::new(CannedInvoker::new().failing_on(Phase::Story));
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();

        let failed = wait_until(&orchestrator, &summary.id, |c| c.status.is_terminal()).await;
        assert_eq!(failed.status, CampaignStatus::Failed);
        assert!(failed.error.as_deref().unwrap().contains("unavailable"));
        assert_eq!(failed.phases.len(), 3);
        assert!(!failed.phases.contains_key(&Phase::Story));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let later = orchestrator.get_campaign(&summary.id).unwrap();
        assert_eq!(later.conversation.len(), failed.conversation.len());
        assert_eq!(later.phases.len(), failed.phases.len());
        assert!(!orchestrator.resume_campaign(&summary.id).await.unwrap());
        assert!(!orchestrator.refine_campaign(&summary.id, "retry").await.unwrap());
        assert!(!orchestrator.cancel_campaign(&summary.id).unwrap());
        assert_eq!(
            orchestrator.get_campaign(&summary.id).unwrap().status,
            CampaignStatus::Failed
        );
        assert_eq!(
            invoker.phases_invoked(),
            vec![
                Phase::Research,
                Phase::StrategicInsight,
                Phase::Trending,
                Phase::Story
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_output_degrades_instead_of_failing() {
        let invoker = Arc::new(CannedInvoker::new().malformed_on(Phase::Story));
        let orchestrator = in_memory(invoker);
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();

        let campaign = wait_until(&orchestrator, &summary.id, |c| c.status.is_terminal()).await;
        assert_eq!(campaign.status, CampaignStatus::Completed);
        let story = &campaign.phases[&Phase::Story];
        assert!(story.degraded);
        assert!(story.deliverable.is_degraded());
        assert!(!campaign.quality_metrics[&Phase::Story].passed);
        assert!(campaign.flow_decisions.iter().any(|d| {
            d.phase == Phase::Story && matches!(d.decision, FlowDecision::Retry { .. })
        }));
        assert!(!campaign.phases[&Phase::Research].degraded);
    }

    #[tokio::test]
    async fn test_weak_trends_switch_strategy_for_later_phases() {
        let invoker = Arc::new(
            CannedInvoker::new().with_payload(Phase::Trending, json!({"trends": []})),
        );
        let orchestrator = in_memory(invoker.clone());
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, false))
            .await
            .unwrap();

        let campaign = wait_until(&orchestrator, &summary.id, |c| c.status.is_terminal()).await;
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert!(campaign.context.alternative_strategy);
        assert!(campaign.flow_decisions.iter().any(|d| {
            d.phase == Phase::Trending && d.decision.requests_alternative_strategy()
        }));

        let story_call = invoker
            .calls()
            .into_iter()
            .find(|r| r.phase == Phase::Story)
            .unwrap();
        assert!(
            story_call
                .directives
                .iter()
                .any(|d| d == ALTERNATIVE_STRATEGY_DIRECTIVE)
        );
    }

    #[tokio::test]
    async fn test_final_signoff_pause_and_resume_completes() {
        let invoker = Arc::new(CannedInvoker::new());
        let orchestrator = in_memory(invoker);
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(false, true))
            .await
            .unwrap();

        let paused = wait_until(&orchestrator, &summary.id, |c| c.is_paused()).await;
        assert_eq!(paused.pending_phase, Some(Phase::FinalSignoff));
        assert_eq!(paused.awaiting_review, Some(Phase::Collaborative));
        assert_eq!(paused.phases.len(), 5);

        assert!(orchestrator.resume_campaign(&summary.id).await.unwrap());
        let campaign = orchestrator.get_campaign(&summary.id).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert!(campaign.pending_phase.is_none());
        assert!(campaign.awaiting_review.is_none());
    }

    #[tokio::test]
    async fn test_ordering_and_pause_consistency_hold_throughout() {
        let invoker = Arc::new(CannedInvoker::new().with_latency(Duration::from_millis(15)));
        let orchestrator = in_memory(invoker);
        let summary = orchestrator
            .start_campaign_with(BRIEF, options(true, true))
            .await
            .unwrap();

        for _ in 0..1000 {
            let campaign = orchestrator.get_campaign(&summary.id).unwrap();
            assert_ordering(&campaign);
            assert_pause_consistency(&campaign);
            if campaign.status.is_terminal() {
                assert_eq!(campaign.status, CampaignStatus::Completed);
                return;
            }
            if campaign.is_paused() {
                orchestrator.resume_campaign(&summary.id).await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("campaign never completed");
    }

    #[tokio::test]
    async fn test_snapshots_survive_restart_and_paused_campaign_resumes() {
        let dir = TempDir::new().unwrap();
        let invoker = Arc::new(CannedInvoker::new());
        let first = build(
            invoker.clone(),
            Arc::new(FileSnapshotStore::new(dir.path())),
        );
        let summary = first
            .start_campaign_with(BRIEF, options(true, false))
            .await
            .unwrap();
        wait_until(&first, &summary.id, |c| c.is_paused()).await;
        first.shutdown();
        first.flush_snapshots().await;

        let second = build(
            Arc::new(CannedInvoker::new()),
            Arc::new(FileSnapshotStore::new(dir.path())),
        );
        let report = second.restore().unwrap();
        assert_eq!(report.restored, 1);
        assert!(report.reconciled.is_empty());
        assert_eq!(second.pending_continuations(&summary.id), 0);

        let restored = second.get_campaign(&summary.id).unwrap();
        assert_eq!(restored.pending_phase, Some(Phase::StrategicInsight));
        assert_eq!(restored.phases.len(), 1);

        assert!(second.resume_campaign(&summary.id).await.unwrap());
        let campaign = wait_until(&second, &summary.id, |c| {
            c.is_paused() && c.awaiting_review == Some(Phase::StrategicInsight)
        })
        .await;
        assert_eq!(campaign.phases.len(), 2);
    }

    #[tokio::test]
    async fn test_restore_fails_campaigns_interrupted_mid_phase() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        let mut running = Campaign::new(BRIEF, CampaignContext::default(), options(false, false));
        running.set_status(CampaignStatus::Running(Phase::Trending));
        store.save(&running).unwrap();

        let mut paused = Campaign::new(BRIEF, CampaignContext::default(), options(true, false));
        paused.pause(Phase::StrategicInsight, Phase::Research);
        store.save(&paused).unwrap();

        let mut completed = Campaign::new(BRIEF, CampaignContext::default(), options(false, false));
        completed.complete();
        store.save(&completed).unwrap();

        let orchestrator = build(
            Arc::new(CannedInvoker::new()),
            Arc::new(FileSnapshotStore::new(dir.path())),
        );
        let report = orchestrator.restore().unwrap();
        assert_eq!(report.restored, 3);
        assert_eq!(report.reconciled, vec![running.id.clone()]);
        orchestrator.flush_snapshots().await;

        let failed = orchestrator.get_campaign(&running.id).unwrap();
        assert_eq!(failed.status, CampaignStatus::Failed);
        assert!(
            failed
                .error
                .as_deref()
                .unwrap()
                .contains("interrupted by restart")
        );
        assert_eq!(
            store.load(&running.id).unwrap().unwrap().status,
            CampaignStatus::Failed
        );

        assert!(orchestrator.get_campaign(&paused.id).unwrap().is_paused());
        assert_eq!(
            orchestrator.get_campaign(&completed.id).unwrap().status,
            CampaignStatus::Completed
        );

        // A second restore does not duplicate anything.
        let again = orchestrator.restore().unwrap();
        assert_eq!(again.restored, 0);
        assert_eq!(orchestrator.list_campaigns().unwrap().len(), 3);
    }
}
