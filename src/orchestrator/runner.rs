//! The phase runner: the single handoff-and-run path every phase goes through.
//!
//! A run is split into three steps so no lock is held while an agent or the
//! quality gate is working:
//!
//! 1. `begin` (locked): liveness, prerequisite and exclusivity checks, then
//!    mark the campaign as running the phase and build the agent request
//! 2. invoke and validate (unlocked)
//! 3. `record` (locked): re-check liveness, store the result, apply the flow
//!    decision and decide the transition
//!
//! A continuation that fires after its campaign was cancelled, failed or
//! removed is skipped in step 1 or 3.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::engine::{EngineInner, Slot, lock_slot};
use super::machine::{Transition, plan_transition, review_prompt};
use crate::agents::AgentRequest;
use crate::campaign::{
    CampaignStatus, ConversationMessage, FlowDecisionRecord, MessageKind, ORCHESTRATOR_SPEAKER,
    PhaseResult,
};
use crate::deliverable::Deliverable;
use crate::errors::PhaseError;
use crate::gates::ApprovalGate;
use crate::phase::Phase;
use crate::quality::{FlowDecision, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// First run of the phase. Refuses if a result already exists.
    Advance,
    /// Rerun of a reviewed phase, overwriting its stored result.
    Refine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Paused { pending: Phase, review: Phase },
    Scheduled(Phase),
    Completed,
    Failed(String),
    /// Nothing was done: stale continuation, missing prerequisite, or another
    /// runner already owns the campaign.
    Skipped(String),
}

struct PhaseOutput {
    deliverable: Deliverable,
    narration: String,
    degraded: bool,
    validation: ValidationResult,
    decision: FlowDecision,
}

impl EngineInner {
    /// Run `phase` for campaign `id` to completion.
    pub(super) async fn run_phase(self: &Arc<Self>, id: &str, phase: Phase, mode: RunMode) -> PhaseOutcome {
        if phase == Phase::FinalSignoff {
            return self.finalize(id);
        }

        let request = match self.begin(id, phase, mode) {
            Ok(request) => request,
            Err(outcome) => return outcome,
        };
        info!(campaign_id = %id, phase = %phase, ?mode, "Running phase");

        let response = match self.invoker.invoke(&request).await {
            Ok(response) => response,
            Err(e) => {
                let err = PhaseError::InvocationFailed {
                    phase,
                    message: format!("{:#}", e),
                };
                return self.fail_phase(id, phase, err);
            }
        };

        let (deliverable, degraded) = match Deliverable::parse(phase, &response.payload) {
            Ok(deliverable) => (deliverable, false),
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(campaign_id = %id, phase = %phase, error = %reason, "Malformed agent output, storing degraded deliverable");
                (Deliverable::fallback(phase, &reason), true)
            }
        };

        let validation = match self.quality.validate(phase, &deliverable).await {
            Ok(validation) => validation,
            Err(e) => {
                let err = PhaseError::QualityGateFailed {
                    phase,
                    message: format!("{:#}", e),
                };
                return self.fail_phase(id, phase, err);
            }
        };
        let decision = self.quality.decide_flow(phase, &validation);
        debug!(campaign_id = %id, phase = %phase, confidence = validation.confidence, decision = decision.as_str(), "Phase validated");

        let output = PhaseOutput {
            deliverable,
            narration: response.narration,
            degraded,
            validation,
            decision,
        };
        match self.record(id, phase, mode, output) {
            Ok(Some(Transition::Advance(next))) => {
                self.schedule(id, next, RunMode::Advance, self.settings.pacing_delay);
                PhaseOutcome::Scheduled(next)
            }
            Ok(Some(Transition::Pause { pending, review })) => PhaseOutcome::Paused { pending, review },
            Ok(None) => PhaseOutcome::Completed,
            Err(outcome) => outcome,
        }
    }

    /// Register a deferred continuation that runs `phase` after `delay`
    /// unless the campaign's timers are cancelled first.
    pub(super) fn schedule(self: &Arc<Self>, id: &str, phase: Phase, mode: RunMode, delay: Duration) {
        let (handle, token) = self.timers.add(id);
        let inner = Arc::clone(self);
        let id = id.to_string();
        debug!(campaign_id = %id, phase = %phase, delay_ms = delay.as_millis() as u64, "Scheduled phase");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(campaign_id = %id, phase = %phase, "Scheduled phase cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            inner.timers.complete(&id, handle);
            let outcome = inner.run_phase(&id, phase, mode).await;
            debug!(campaign_id = %id, phase = %phase, ?outcome, "Continuation finished");
        });
    }

    fn begin(&self, id: &str, phase: Phase, mode: RunMode) -> Result<AgentRequest, PhaseOutcome> {
        let skipped = |reason: String| {
            debug!(campaign_id = %id, phase = %phase, %reason, "Skipping phase");
            PhaseOutcome::Skipped(reason)
        };

        let cell = match self.cell(id) {
            Ok(Some(cell)) => cell,
            Ok(None) => return Err(skipped("campaign no longer exists".into())),
            Err(e) => return Err(skipped(e.to_string())),
        };
        let mut slot = lock_slot(&cell).map_err(|e| skipped(e.to_string()))?;
        let campaign = &mut slot.campaign;

        if !matches!(campaign.status, CampaignStatus::Active | CampaignStatus::Initializing) {
            return Err(skipped(format!("campaign is {}", campaign.status)));
        }
        if let Some(running) = slot.running {
            return Err(skipped(format!("{} is already running", running)));
        }
        let campaign = &mut slot.campaign;
        if let Some(missing) = campaign.missing_prerequisite(phase) {
            return Err(skipped(format!("prerequisite {} has no result", missing)));
        }
        if mode == RunMode::Advance && campaign.phases.contains_key(&phase) {
            return Err(skipped(format!("{} already has a result", phase)));
        }

        campaign.set_status(CampaignStatus::Running(phase));
        campaign.push_message(
            ConversationMessage::new(
                phase.agent_name(),
                MessageKind::Processing,
                format!("{} is working on {}...", phase.agent_name(), phase.title()),
            )
            .for_phase(phase),
        );
        let request = AgentRequest::for_phase(campaign, phase);
        slot.running = Some(phase);
        Ok(request)
    }

    fn record(
        &self,
        id: &str,
        phase: Phase,
        mode: RunMode,
        output: PhaseOutput,
    ) -> Result<Option<Transition>, PhaseOutcome> {
        let cell = match self.cell(id) {
            Ok(Some(cell)) => cell,
            _ => {
                debug!(campaign_id = %id, phase = %phase, "Campaign removed while phase was running");
                return Err(PhaseOutcome::Skipped("campaign no longer exists".into()));
            }
        };
        let mut slot = lock_slot(&cell).map_err(|e| PhaseOutcome::Skipped(e.to_string()))?;
        if !owns_run(&slot, phase) {
            release(&mut slot, phase);
            return Err(PhaseOutcome::Skipped(format!(
                "campaign became {} while {} was running",
                slot.campaign.status, phase
            )));
        }
        slot.running = None;

        let campaign = &mut slot.campaign;
        let attempt = match mode {
            RunMode::Advance => 1,
            RunMode::Refine => campaign.phases.get(&phase).map_or(1, |r| r.attempt + 1),
        };
        let PhaseOutput {
            deliverable,
            narration,
            degraded,
            validation,
            decision,
        } = output;

        campaign.phases.insert(
            phase,
            PhaseResult {
                deliverable: deliverable.clone(),
                narration: narration.clone(),
                degraded,
                attempt,
                completed_at: Utc::now(),
            },
        );
        let confidence = validation.confidence;
        campaign.quality_metrics.insert(phase, validation);
        if decision.requests_alternative_strategy() && !campaign.context.alternative_strategy {
            campaign.context.alternative_strategy = true;
            campaign.push_message(
                ConversationMessage::new(
                    ORCHESTRATOR_SPEAKER,
                    MessageKind::System,
                    "Trend signals were weak. Later phases will lean on research and insight instead of trends.",
                )
                .for_phase(phase),
            );
        }
        campaign.flow_decisions.push(FlowDecisionRecord {
            phase,
            decision,
            timestamp: Utc::now(),
        });

        campaign.clear_processing();
        let message = format!("{}\n{}", narration.trim(), deliverable.summary());
        campaign.push_message(
            ConversationMessage::new(phase.agent_name(), MessageKind::Deliverable, message)
                .for_phase(phase)
                .with_deliverable(deliverable, confidence),
        );

        let gate = ApprovalGate::from(campaign.options());
        let transition = plan_transition(phase, &gate);
        match transition {
            Some(Transition::Pause { pending, review }) => {
                campaign.pause(pending, review);
                campaign.push_message(
                    ConversationMessage::new(
                        ORCHESTRATOR_SPEAKER,
                        MessageKind::Review,
                        review_prompt(pending, review),
                    )
                    .for_phase(review),
                );
                info!(campaign_id = %id, pending = %pending, review = %review, "Campaign paused for review");
            }
            Some(Transition::Advance(_)) => campaign.set_status(CampaignStatus::Active),
            None => campaign.complete(),
        }
        info!(campaign_id = %id, phase = %phase, attempt, degraded, "Phase complete");
        self.persist(campaign);
        Ok(transition)
    }

    fn fail_phase(&self, id: &str, phase: Phase, err: PhaseError) -> PhaseOutcome {
        let message = err.to_string();
        let cell = match self.cell(id) {
            Ok(Some(cell)) => cell,
            _ => return PhaseOutcome::Skipped("campaign no longer exists".into()),
        };
        {
            let mut slot = match lock_slot(&cell) {
                Ok(slot) => slot,
                Err(e) => return PhaseOutcome::Skipped(e.to_string()),
            };
            if !owns_run(&slot, phase) {
                release(&mut slot, phase);
                return PhaseOutcome::Skipped(format!("campaign became {}", slot.campaign.status));
            }
            slot.running = None;
            let campaign = &mut slot.campaign;
            campaign.clear_processing();
            campaign.push_message(
                ConversationMessage::new(ORCHESTRATOR_SPEAKER, MessageKind::System, message.clone())
                    .for_phase(err.phase()),
            );
            campaign.fail(message.clone());
            self.persist(campaign);
        }
        warn!(campaign_id = %id, phase = %phase, error = %message, "Phase failed");
        self.timers.cancel_all(id);
        PhaseOutcome::Failed(message)
    }

    /// Run the final sign-off pseudo-phase.
    fn finalize(&self, id: &str) -> PhaseOutcome {
        let cell = match self.cell(id) {
            Ok(Some(cell)) => cell,
            _ => return PhaseOutcome::Skipped("campaign no longer exists".into()),
        };
        {
            let mut slot = match lock_slot(&cell) {
                Ok(slot) => slot,
                Err(e) => return PhaseOutcome::Skipped(e.to_string()),
            };
            if slot.campaign.status != CampaignStatus::Active || slot.running.is_some() {
                return PhaseOutcome::Skipped(format!("campaign is {}", slot.campaign.status));
            }
            if let Some(missing) = slot.campaign.missing_prerequisite(Phase::FinalSignoff) {
                return PhaseOutcome::Skipped(format!("prerequisite {} has no result", missing));
            }
            self.complete_locked(&mut slot);
        }
        self.timers.cancel_all(id);
        PhaseOutcome::Completed
    }

    /// Mark the campaign completed and persist. Caller holds the slot lock.
    pub(super) fn complete_locked(&self, slot: &mut Slot) {
        let campaign = &mut slot.campaign;
        campaign.complete();
        campaign.push_message(
            ConversationMessage::new(
                ORCHESTRATOR_SPEAKER,
                MessageKind::System,
                format!(
                    "Campaign complete. {} phases delivered.",
                    campaign.phases.len()
                ),
            )
            .for_phase(Phase::FinalSignoff),
        );
        self.persist(campaign);
        info!(campaign_id = %campaign.id, "Campaign completed");
    }
}

/// Whether the runner for `phase` still owns the campaign.
fn owns_run(slot: &Slot, phase: Phase) -> bool {
    slot.running == Some(phase) && slot.campaign.status == CampaignStatus::Running(phase)
}

fn release(slot: &mut Slot, phase: Phase) {
    if slot.running == Some(phase) {
        slot.running = None;
    }
}
