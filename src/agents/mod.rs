//! Agent invocation: the content-generation collaborator behind each phase.
//!
//! The orchestrator hands an [`AgentRequest`] to an [`AgentInvoker`] and
//! receives an [`AgentResponse`]. Real implementation: [`ClaudeInvoker`].
//! Deterministic double: [`CannedInvoker`].

mod canned;
mod claude;

pub use canned::CannedInvoker;
pub use claude::{ClaudeInvoker, DEFAULT_AGENT_TIMEOUT_SECS};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::campaign::{Campaign, CampaignContext};
use crate::deliverable::Deliverable;
use crate::phase::Phase;

/// Directive added to every request once trend results have been judged weak.
pub const ALTERNATIVE_STRATEGY_DIRECTIVE: &str =
    "Trend signals were weak: de-emphasize trend-based messaging and lean on research and strategic insight.";

/// Everything an agent needs to produce one phase's deliverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub campaign_id: String,
    pub phase: Phase,
    pub agent: String,
    pub brief: String,
    /// The brief with refinement instructions appended.
    pub working_brief: String,
    pub context: CampaignContext,
    /// Result of the immediately preceding phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<Deliverable>,
    /// Every stored result, in canonical order.
    #[serde(default)]
    pub prior: Vec<Deliverable>,
    #[serde(default)]
    pub directives: Vec<String>,
}

impl AgentRequest {
    /// Assemble the request for `phase` from the campaign's current state.
    pub fn for_phase(campaign: &Campaign, phase: Phase) -> Self {
        let handoff = phase
            .previous()
            .and_then(|p| campaign.phases.get(&p))
            .map(|r| r.deliverable.clone());
        let prior = campaign
            .phases
            .iter()
            .filter(|(p, _)| **p < phase)
            .map(|(_, r)| r.deliverable.clone())
            .collect();

        let mut directives = Vec::new();
        if campaign.context.alternative_strategy {
            directives.push(ALTERNATIVE_STRATEGY_DIRECTIVE.to_string());
        }
        for instructions in campaign.context.refinements_for(phase) {
            directives.push(format!("Refinement: {}", instructions));
        }

        Self {
            campaign_id: campaign.id.clone(),
            phase,
            agent: phase.agent_name().to_string(),
            brief: campaign.brief.clone(),
            working_brief: campaign.context.working_brief.clone(),
            context: campaign.context.clone(),
            handoff,
            prior,
            directives,
        }
    }

    /// Render the request as a prompt for a text-in/text-out agent.
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!(
            "You are the {} for a marketing campaign.\n\nPhase: {}\n\nBrief:\n{}\n\n\
             Campaign type: {}\nTarget market: {}\nUrgency: {:?}\nKeywords: {}\n",
            self.agent,
            self.phase.title(),
            self.working_brief,
            self.context.campaign_type,
            self.context.target_market,
            self.context.urgency,
            self.context.keywords.join(", "),
        );
        if let Some(handoff) = &self.handoff {
            prompt.push_str(&format!(
                "\nHandoff from {}:\n{}\n",
                handoff.phase().title(),
                serde_json::to_string_pretty(handoff).unwrap_or_default()
            ));
        }
        if self.prior.len() > 1 {
            prompt.push_str("\nEarlier results:\n");
            for deliverable in &self.prior {
                prompt.push_str(&format!("- {}: {}\n", deliverable.phase().title(), deliverable.summary()));
            }
        }
        if !self.directives.is_empty() {
            prompt.push_str("\nDirectives:\n");
            for directive in &self.directives {
                prompt.push_str(&format!("- {}\n", directive));
            }
        }
        prompt.push_str(&format!("\nRespond with a single JSON object with fields: {}.\n", output_fields(self.phase)));
        prompt
    }
}

fn output_fields(phase: Phase) -> &'static str {
    match phase {
        Phase::Research => "market_overview, audience_insights, competitors, opportunities",
        Phase::StrategicInsight => "core_insight, positioning, strategic_pillars, risks",
        Phase::Trending => "trends (name, relevance 0-1, description), hashtags, timing_notes",
        Phase::Story => "headline, narrative, key_messages, call_to_action",
        Phase::Collaborative | Phase::FinalSignoff => {
            "executive_summary, channel_plan (channel, tactics), timeline, success_metrics"
        }
    }
}

/// Agent output: a structured payload plus human-readable narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Either a JSON object or a string that should contain one.
    pub payload: serde_json::Value,
    pub narration: String,
}

/// Produces a phase deliverable. Timeouts are the implementation's concern;
/// any `Err` is treated as a failed phase.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{CampaignOptions, PhaseResult};
    use chrono::Utc;

    fn campaign_with(phases: &[Phase]) -> Campaign {
        let context = CampaignContext {
            working_brief: "Launch eco-resort in Q3".into(),
            ..Default::default()
        };
        let mut campaign = Campaign::new("Launch eco-resort in Q3", context, CampaignOptions::default());
        for phase in phases {
            campaign.phases.insert(
                *phase,
                PhaseResult {
                    deliverable: Deliverable::fallback(*phase, "stub"),
                    narration: String::new(),
                    degraded: true,
                    attempt: 1,
                    completed_at: Utc::now(),
                },
            );
        }
        campaign
    }

    #[test]
    fn test_first_phase_has_no_handoff() {
        let request = AgentRequest::for_phase(&campaign_with(&[]), Phase::Research);
        assert!(request.handoff.is_none());
        assert!(request.prior.is_empty());
        assert!(request.directives.is_empty());
        assert_eq!(request.agent, "Research Analyst");
    }

    #[test]
    fn test_handoff_is_previous_phase() {
        let campaign = campaign_with(&[Phase::Research, Phase::StrategicInsight]);
        let request = AgentRequest::for_phase(&campaign, Phase::Trending);
        assert_eq!(request.handoff.map(|d| d.phase()), Some(Phase::StrategicInsight));
        assert_eq!(request.prior.len(), 2);
        assert_eq!(request.prior[0].phase(), Phase::Research);
    }

    #[test]
    fn test_refinement_rerun_excludes_own_result_from_prior() {
        let campaign = campaign_with(&[Phase::Research]);
        let request = AgentRequest::for_phase(&campaign, Phase::Research);
        assert!(request.prior.is_empty());
    }

    #[test]
    fn test_directives_carry_strategy_and_refinements() {
        let mut campaign = campaign_with(&[Phase::Research]);
        campaign.context.alternative_strategy = true;
        campaign.context.apply_refinement(Phase::Research, "focus on Gen Z");
        let request = AgentRequest::for_phase(&campaign, Phase::Research);
        assert_eq!(request.directives.len(), 2);
        assert_eq!(request.directives[0], ALTERNATIVE_STRATEGY_DIRECTIVE);
        assert_eq!(request.directives[1], "Refinement: focus on Gen Z");
        assert!(request.working_brief.contains("[Refinement for research]"));

        let prompt = request.to_prompt();
        assert!(prompt.contains("Research Analyst"));
        assert!(prompt.contains("focus on Gen Z"));
        assert!(prompt.contains("market_overview"));
    }
}
