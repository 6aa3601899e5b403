//! Campaign data model: the aggregate owned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::deliverable::Deliverable;
use crate::phase::Phase;
use crate::quality::{FlowDecision, ValidationResult};

/// Speaker used for the brief and for refinement instructions.
pub const USER_SPEAKER: &str = "You";
/// Speaker used for pause, resume and completion narration.
pub const ORCHESTRATOR_SPEAKER: &str = "Orchestrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStatus {
    Initializing,
    Active,
    /// A phase runner is executing this phase.
    Running(Phase),
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Running(phase) => phase.as_str(),
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initializing" => Ok(Self::Initializing),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => other
                .parse::<Phase>()
                .map(Self::Running)
                .map_err(|_| format!("Invalid campaign status: {}", s)),
        }
    }
}

impl Serialize for CampaignStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CampaignStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Brief,
    /// Transient "agent is working" indicator, removed once the phase output lands.
    Processing,
    Deliverable,
    Review,
    Refinement,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub speaker: String,
    pub message: String,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<Deliverable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl ConversationMessage {
    pub fn new(speaker: &str, kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            speaker: speaker.to_string(),
            message: message.into(),
            kind,
            phase: None,
            timestamp: Utc::now(),
            deliverable: None,
            quality_score: None,
        }
    }

    pub fn for_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_deliverable(mut self, deliverable: Deliverable, quality_score: f64) -> Self {
        self.deliverable = Some(deliverable);
        self.quality_score = Some(quality_score);
        self
    }
}

/// Stored result of one completed phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub deliverable: Deliverable,
    pub narration: String,
    /// True when the agent output was malformed and a fallback was stored.
    #[serde(default)]
    pub degraded: bool,
    /// 1 for the first run, incremented by every refinement re-run.
    pub attempt: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    #[default]
    Normal,
}

/// Human instructions applied to a reviewed phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refinement {
    pub phase: Phase,
    pub instructions: String,
    pub at: DateTime<Utc>,
}

/// Metadata derived from the brief. Mutated only by refinement and by
/// quality-gated flow decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignContext {
    pub campaign_type: String,
    pub urgency: Urgency,
    pub target_market: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Copy of the brief that accumulates refinement instructions.
    pub working_brief: String,
    #[serde(default)]
    pub refinements: Vec<Refinement>,
    /// Set when trend results were weak; later phases de-emphasize trends.
    #[serde(default)]
    pub alternative_strategy: bool,
}

impl CampaignContext {
    /// Append refinement instructions for `phase` to the working brief.
    pub fn apply_refinement(&mut self, phase: Phase, instructions: &str) {
        self.working_brief.push_str(&format!(
            "\n\n[Refinement for {}]: {}",
            phase, instructions
        ));
        self.refinements.push(Refinement {
            phase,
            instructions: instructions.to_string(),
            at: Utc::now(),
        });
    }

    /// Refinement instructions recorded against `phase`, oldest first.
    pub fn refinements_for(&self, phase: Phase) -> Vec<&str> {
        self.refinements
            .iter()
            .filter(|r| r.phase == phase)
            .map(|r| r.instructions.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDecisionRecord {
    pub phase: Phase,
    pub decision: FlowDecision,
    pub timestamp: DateTime<Utc>,
}

/// Review behaviour fixed at campaign creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOptions {
    #[serde(default)]
    pub manual_review: bool,
    #[serde(default)]
    pub require_final_signoff: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub brief: String,
    pub context: CampaignContext,
    pub status: CampaignStatus,
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
    #[serde(default)]
    pub phases: BTreeMap<Phase, PhaseResult>,
    #[serde(default)]
    pub quality_metrics: BTreeMap<Phase, ValidationResult>,
    #[serde(default)]
    pub flow_decisions: Vec<FlowDecisionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_review: Option<Phase>,
    pub manual_review: bool,
    pub require_final_signoff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(brief: &str, context: CampaignContext, options: CampaignOptions) -> Self {
        let now = Utc::now();
        let mut campaign = Self {
            id: uuid::Uuid::new_v4().to_string(),
            brief: brief.to_string(),
            context,
            status: CampaignStatus::Initializing,
            conversation: Vec::new(),
            phases: BTreeMap::new(),
            quality_metrics: BTreeMap::new(),
            flow_decisions: Vec::new(),
            pending_phase: None,
            awaiting_review: None,
            manual_review: options.manual_review,
            require_final_signoff: options.require_final_signoff,
            error: None,
            created_at: now,
            last_updated: now,
            completed_at: None,
        };
        campaign.push_message(ConversationMessage::new(
            USER_SPEAKER,
            MessageKind::Brief,
            brief,
        ));
        campaign
    }

    pub fn options(&self) -> CampaignOptions {
        CampaignOptions {
            manual_review: self.manual_review,
            require_final_signoff: self.require_final_signoff,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn set_status(&mut self, status: CampaignStatus) {
        self.status = status;
        self.touch();
    }

    pub fn push_message(&mut self, message: ConversationMessage) {
        self.conversation.push(message);
        self.touch();
    }

    /// Drop transient processing indicators.
    pub fn clear_processing(&mut self) {
        self.conversation.retain(|m| m.kind != MessageKind::Processing);
        self.touch();
    }

    /// Pause before `pending` with `review` under human review.
    pub fn pause(&mut self, pending: Phase, review: Phase) {
        self.pending_phase = Some(pending);
        self.awaiting_review = Some(review);
        self.set_status(CampaignStatus::Paused);
    }

    /// Clear both review markers. Callers set the next status themselves.
    pub fn clear_review(&mut self) -> (Option<Phase>, Option<Phase>) {
        let taken = (self.pending_phase.take(), self.awaiting_review.take());
        self.touch();
        taken
    }

    pub fn is_paused(&self) -> bool {
        self.status == CampaignStatus::Paused
            && self.pending_phase.is_some()
            && self.awaiting_review.is_some()
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.pending_phase = None;
        self.awaiting_review = None;
        self.error = Some(error.into());
        self.set_status(CampaignStatus::Failed);
    }

    pub fn complete(&mut self) {
        self.pending_phase = None;
        self.awaiting_review = None;
        self.completed_at = Some(Utc::now());
        self.set_status(CampaignStatus::Completed);
    }

    /// The first prerequisite of `phase` without a stored result, if any.
    pub fn missing_prerequisite(&self, phase: Phase) -> Option<Phase> {
        phase
            .prerequisites()
            .iter()
            .copied()
            .find(|p| !p.is_pseudo() && !self.phases.contains_key(p))
    }

    /// The most recently completed work phase.
    pub fn last_completed_phase(&self) -> Option<Phase> {
        self.phases.keys().next_back().copied()
    }

    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            id: self.id.clone(),
            status: self.status,
            brief: self.brief.clone(),
            campaign_type: self.context.campaign_type.clone(),
            pending_phase: self.pending_phase,
            awaiting_review: self.awaiting_review,
            created_at: self.created_at,
        }
    }
}

/// Lightweight view returned when a campaign is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: String,
    pub status: CampaignStatus,
    pub brief: String,
    pub campaign_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_review: Option<Phase>,
    pub created_at: DateTime<Utc>,
}
