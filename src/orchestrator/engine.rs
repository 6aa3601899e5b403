//! The campaign orchestrator: registry, public operations and crash recovery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{info, warn};

use super::runner::RunMode;
use super::store::{InMemorySnapshotStore, SnapshotStore};
use super::timers::TimerRegistry;
use super::writer::SnapshotWriter;
use crate::agents::AgentInvoker;
use crate::brief::{BriefAnalyzer, KeywordBriefAnalyzer};
use crate::campaign::{
    Campaign, CampaignOptions, CampaignStatus, CampaignSummary, ConversationMessage, MessageKind,
    ORCHESTRATOR_SPEAKER, USER_SPEAKER,
};
use crate::errors::OrchestratorError;
use crate::phase::Phase;
use crate::quality::{ConfidenceQualityGate, QualityGate};

/// Default cosmetic delay between auto-advanced phases.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(1500);

/// One campaign plus the marker of the phase runner that currently owns it.
pub(crate) struct Slot {
    pub(crate) campaign: Campaign,
    pub(crate) running: Option<Phase>,
}

pub(crate) type CampaignCell = Mutex<Slot>;

pub(crate) fn lock_slot(cell: &CampaignCell) -> Result<MutexGuard<'_, Slot>, OrchestratorError> {
    cell.lock().map_err(|_| OrchestratorError::LockPoisoned)
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub pacing_delay: Duration,
    /// Review flags used by `start_campaign`.
    pub default_options: CampaignOptions,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            pacing_delay: DEFAULT_PACING_DELAY,
            default_options: CampaignOptions::default(),
        }
    }
}

pub(crate) struct EngineInner {
    registry: Mutex<HashMap<String, Arc<CampaignCell>>>,
    pub(crate) timers: TimerRegistry,
    pub(crate) store: Arc<dyn SnapshotStore>,
    writer: SnapshotWriter,
    pub(crate) invoker: Arc<dyn AgentInvoker>,
    pub(crate) quality: Arc<dyn QualityGate>,
    pub(crate) analyzer: Arc<dyn BriefAnalyzer>,
    pub(crate) settings: OrchestratorSettings,
}

impl EngineInner {
    pub(crate) fn cell(&self, id: &str) -> Result<Option<Arc<CampaignCell>>, OrchestratorError> {
        Ok(self
            .registry
            .lock()
            .map_err(|_| OrchestratorError::LockPoisoned)?
            .get(id)
            .cloned())
    }

    fn insert(&self, campaign: Campaign) -> Result<(), OrchestratorError> {
        let id = campaign.id.clone();
        let cell = Arc::new(Mutex::new(Slot {
            campaign,
            running: None,
        }));
        self.registry
            .lock()
            .map_err(|_| OrchestratorError::LockPoisoned)?
            .insert(id, cell);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), OrchestratorError> {
        self.registry
            .lock()
            .map_err(|_| OrchestratorError::LockPoisoned)?
            .remove(id);
        Ok(())
    }

    /// Queue a snapshot of `campaign`. Failures are logged by the writer,
    /// never fatal to the campaign.
    pub(crate) fn persist(&self, campaign: &Campaign) {
        self.writer.save(campaign);
    }
}

/// Outcome of [`CampaignOrchestrator::restore`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Campaigns interrupted mid-phase and marked failed.
    pub reconciled: Vec<String>,
}

/// Builder for [`CampaignOrchestrator`].
pub struct OrchestratorBuilder {
    invoker: Arc<dyn AgentInvoker>,
    store: Arc<dyn SnapshotStore>,
    quality: Arc<dyn QualityGate>,
    analyzer: Arc<dyn BriefAnalyzer>,
    settings: OrchestratorSettings,
}

impl OrchestratorBuilder {
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    pub fn quality_gate(mut self, quality: Arc<dyn QualityGate>) -> Self {
        self.quality = quality;
        self
    }

    pub fn brief_analyzer(mut self, analyzer: Arc<dyn BriefAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn pacing_delay(mut self, delay: Duration) -> Self {
        self.settings.pacing_delay = delay;
        self
    }

    pub fn default_options(mut self, options: CampaignOptions) -> Self {
        self.settings.default_options = options;
        self
    }

    /// Must be called inside a tokio runtime; it starts the snapshot writer.
    pub fn build(self) -> CampaignOrchestrator {
        CampaignOrchestrator {
            inner: Arc::new(EngineInner {
                registry: Mutex::new(HashMap::new()),
                timers: TimerRegistry::new(),
                writer: SnapshotWriter::spawn(Arc::clone(&self.store)),
                store: self.store,
                invoker: self.invoker,
                quality: self.quality,
                analyzer: self.analyzer,
                settings: self.settings,
            }),
        }
    }
}

/// Runs campaigns through the phase pipeline.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct CampaignOrchestrator {
    inner: Arc<EngineInner>,
}

impl CampaignOrchestrator {
    /// Start a builder with an in-memory store and the default collaborators.
    pub fn builder(invoker: Arc<dyn AgentInvoker>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            invoker,
            store: Arc::new(InMemorySnapshotStore::new()),
            quality: Arc::new(ConfidenceQualityGate::default()),
            analyzer: Arc::new(KeywordBriefAnalyzer::new()),
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn settings(&self) -> OrchestratorSettings {
        self.inner.settings
    }

    /// Create a campaign with the default review flags and begin its first phase.
    pub async fn start_campaign(&self, brief: &str) -> Result<CampaignSummary, OrchestratorError> {
        self.start_campaign_with(brief, self.inner.settings.default_options)
            .await
    }

    /// Create a campaign with explicit review flags and begin its first phase.
    ///
    /// Returns as soon as the first phase is scheduled.
    pub async fn start_campaign_with(
        &self,
        brief: &str,
        options: CampaignOptions,
    ) -> Result<CampaignSummary, OrchestratorError> {
        if brief.trim().is_empty() {
            return Err(OrchestratorError::EmptyBrief);
        }

        let context = self.inner.analyzer.analyze(brief.trim());
        let mut campaign = Campaign::new(brief, context, options);
        campaign.push_message(ConversationMessage::new(
            ORCHESTRATOR_SPEAKER,
            MessageKind::System,
            format!(
                "Treating this as a {} campaign for the {} market. {} is starting research.",
                campaign.context.campaign_type,
                campaign.context.target_market,
                Phase::first().agent_name()
            ),
        ));
        let summary = campaign.summary();
        self.inner.persist(&campaign);
        self.inner.insert(campaign)?;

        info!(
            campaign_id = %summary.id,
            campaign_type = %summary.campaign_type,
            manual_review = options.manual_review,
            require_final_signoff = options.require_final_signoff,
            "Campaign started"
        );
        self.inner
            .schedule(&summary.id, Phase::first(), RunMode::Advance, Duration::ZERO);
        Ok(summary)
    }

    pub fn get_campaign(&self, id: &str) -> Result<Campaign, OrchestratorError> {
        let cell = self
            .inner
            .cell(id)?
            .ok_or_else(|| OrchestratorError::not_found(id))?;
        let slot = lock_slot(&cell)?;
        Ok(slot.campaign.clone())
    }

    /// All live campaigns, oldest first.
    pub fn list_campaigns(&self) -> Result<Vec<Campaign>, OrchestratorError> {
        let cells: Vec<Arc<CampaignCell>> = self
            .inner
            .registry
            .lock()
            .map_err(|_| OrchestratorError::LockPoisoned)?
            .values()
            .cloned()
            .collect();
        let mut campaigns = cells
            .iter()
            .map(|cell| lock_slot(cell).map(|slot| slot.campaign.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        campaigns.sort_by_key(|c| c.created_at);
        Ok(campaigns)
    }

    /// Continue a paused campaign with its pending phase.
    ///
    /// `Ok(false)` when the campaign is not paused. Resuming before
    /// `FinalSignoff` completes the campaign immediately.
    pub async fn resume_campaign(&self, id: &str) -> Result<bool, OrchestratorError> {
        let cell = self
            .inner
            .cell(id)?
            .ok_or_else(|| OrchestratorError::not_found(id))?;

        let pending = {
            let mut slot = lock_slot(&cell)?;
            if !slot.campaign.is_paused() || slot.running.is_some() {
                return Ok(false);
            }
            let (pending, _) = slot.campaign.clear_review();
            let Some(pending) = pending else {
                return Ok(false);
            };

            if pending == Phase::FinalSignoff {
                slot.campaign.set_status(CampaignStatus::Active);
                self.inner.complete_locked(&mut slot);
            } else {
                let campaign = &mut slot.campaign;
                campaign.set_status(CampaignStatus::Active);
                campaign.push_message(
                    ConversationMessage::new(
                        ORCHESTRATOR_SPEAKER,
                        MessageKind::System,
                        format!("Approved. Moving on to {}.", pending.title()),
                    )
                    .for_phase(pending),
                );
                self.inner.persist(campaign);
            }
            pending
        };

        info!(campaign_id = %id, phase = %pending, "Campaign resumed");
        if pending == Phase::FinalSignoff {
            self.inner.timers.cancel_all(id);
        } else {
            self.inner
                .schedule(id, pending, RunMode::Advance, Duration::ZERO);
        }
        Ok(true)
    }

    /// Rerun the reviewed phase of a paused campaign with extra instructions.
    ///
    /// `Ok(false)` when the campaign is not paused or the instructions are blank.
    pub async fn refine_campaign(&self, id: &str, instructions: &str) -> Result<bool, OrchestratorError> {
        let cell = self
            .inner
            .cell(id)?
            .ok_or_else(|| OrchestratorError::not_found(id))?;
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Ok(false);
        }

        let review = {
            let mut slot = lock_slot(&cell)?;
            if !slot.campaign.is_paused() || slot.running.is_some() {
                return Ok(false);
            }
            let campaign = &mut slot.campaign;
            let (_, review) = campaign.clear_review();
            let Some(review) = review else {
                return Ok(false);
            };

            campaign.push_message(
                ConversationMessage::new(USER_SPEAKER, MessageKind::Refinement, instructions)
                    .for_phase(review),
            );
            campaign.context.apply_refinement(review, instructions);
            campaign.set_status(CampaignStatus::Active);
            self.inner.persist(campaign);
            review
        };

        info!(campaign_id = %id, phase = %review, "Campaign refined, rerunning reviewed phase");
        self.inner
            .schedule(id, review, RunMode::Refine, Duration::ZERO);
        Ok(true)
    }

    /// Cancel a campaign from any non-terminal status, dropping it from the
    /// registry and deleting its snapshot.
    ///
    /// `Ok(false)` for unknown or already-terminal campaigns, so repeated
    /// cancels are harmless.
    pub fn cancel_campaign(&self, id: &str) -> Result<bool, OrchestratorError> {
        let Some(cell) = self.inner.cell(id)? else {
            return Ok(false);
        };
        {
            let mut slot = lock_slot(&cell)?;
            if slot.campaign.status.is_terminal() {
                return Ok(false);
            }
            let campaign = &mut slot.campaign;
            campaign.pending_phase = None;
            campaign.awaiting_review = None;
            campaign.set_status(CampaignStatus::Cancelled);
            campaign.push_message(ConversationMessage::new(
                ORCHESTRATOR_SPEAKER,
                MessageKind::System,
                "Campaign cancelled.",
            ));
            // Queued while the slot is locked so no later save for this campaign can follow it.
            self.inner.remove(id)?;
            self.inner.writer.delete(id);
        }
        let cancelled = self.inner.timers.cancel_all(id);
        info!(campaign_id = %id, cancelled_continuations = cancelled, "Campaign cancelled");
        Ok(true)
    }

    /// Number of scheduled continuations not yet fired for `id`.
    pub fn pending_continuations(&self, id: &str) -> usize {
        self.inner.timers.pending(id)
    }

    /// Reload snapshots into the registry.
    ///
    /// Paused and terminal campaigns come back unchanged. Campaigns caught
    /// mid-phase cannot be resumed safely; they are marked failed. No phase is
    /// rescheduled.
    pub fn restore(&self) -> Result<RestoreReport, OrchestratorError> {
        let mut report = RestoreReport::default();
        for mut campaign in self.inner.store.load_all()? {
            if self.inner.cell(&campaign.id)?.is_some() {
                continue;
            }
            let interrupted = matches!(
                campaign.status,
                CampaignStatus::Initializing | CampaignStatus::Active | CampaignStatus::Running(_)
            );
            if interrupted {
                let reason = format!("interrupted by restart during {}", campaign.status);
                warn!(campaign_id = %campaign.id, status = %campaign.status, "Marking interrupted campaign failed");
                campaign.clear_processing();
                campaign.push_message(ConversationMessage::new(
                    ORCHESTRATOR_SPEAKER,
                    MessageKind::System,
                    reason.clone(),
                ));
                campaign.fail(reason);
                self.inner.persist(&campaign);
                report.reconciled.push(campaign.id.clone());
            }
            self.inner.insert(campaign)?;
            report.restored += 1;
        }
        info!(restored = report.restored, reconciled = report.reconciled.len(), "Restored campaign snapshots");
        Ok(report)
    }

    /// Wait for every snapshot write queued so far to reach the store.
    pub async fn flush_snapshots(&self) {
        self.inner.writer.flush().await;
    }

    /// Cancel every pending continuation. Campaign state is left as is.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inner.timers.cancel_everything();
        info!(cancelled, "Orchestrator shut down");
        cancelled
    }
}
