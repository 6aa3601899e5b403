use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::{AgentInvoker, AgentRequest, AgentResponse};
use crate::phase::Phase;

/// Deterministic offline invoker.
///
/// Produces well-formed deliverables built from the request context. Tests
/// script failures, malformed output, payload overrides and latency.
#[derive(Default)]
pub struct CannedInvoker {
    latency: Duration,
    failures: HashSet<Phase>,
    malformed: HashSet<Phase>,
    overrides: HashMap<Phase, Value>,
    calls: Mutex<Vec<AgentRequest>>,
}

impl CannedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Return an error whenever `phase` is invoked.
    pub fn failing_on(mut self, phase: Phase) -> Self {
        self.failures.insert(phase);
        self
    }

    /// Return prose instead of a JSON object for `phase`.
    pub fn malformed_on(mut self, phase: Phase) -> Self {
        self.malformed.insert(phase);
        self
    }

    pub fn with_payload(mut self, phase: Phase, payload: Value) -> Self {
        self.overrides.insert(phase, payload);
        self
    }

    /// Requests received so far, in invocation order.
    pub fn calls(&self) -> Vec<AgentRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn phases_invoked(&self) -> Vec<Phase> {
        self.calls().iter().map(|r| r.phase).collect()
    }

    fn payload(request: &AgentRequest) -> Value {
        let subject = request
            .context
            .keywords
            .first()
            .cloned()
            .unwrap_or_else(|| "the brand".to_string());
        let market = &request.context.target_market;
        match request.phase {
            Phase::Research => json!({
                "market_overview": format!("Demand around {} is growing steadily. Competition is fragmented.", subject),
                "audience_insights": [
                    format!("The {} audience researches online before committing", market),
                    "Social proof drives conversion"
                ],
                "competitors": ["Established incumbents", "Direct-to-consumer challengers"],
                "opportunities": [format!("Own the conversation around {}", subject)]
            }),
            Phase::StrategicInsight => json!({
                "core_insight": format!("People want {} without compromise. Nobody promises that today.", subject),
                "positioning": format!("The no-compromise choice for {}", market),
                "strategic_pillars": ["Proof over promises", "Community first"],
                "risks": ["Claims must be substantiated"]
            }),
            Phase::Trending => json!({
                "trends": [
                    {"name": "Creator-led reviews", "relevance": 0.8, "description": "Short video reviews shape shortlists"},
                    {"name": "Values-based buying", "relevance": 0.7, "description": "Purchases signal identity"}
                ],
                "hashtags": [format!("#{}", subject.replace(['-', ' '], ""))],
                "timing_notes": "Lead with teasers two weeks before launch"
            }),
            Phase::Story => json!({
                "headline": format!("{}, without compromise", capitalize(&subject)),
                "narrative": "A story told through the people who already made the switch.",
                "key_messages": ["It works", "It is worth it", "You are not alone"],
                "call_to_action": "Join the waitlist"
            }),
            Phase::Collaborative | Phase::FinalSignoff => json!({
                "executive_summary": format!("An integrated campaign for {} built on proof and community.", subject),
                "channel_plan": [
                    {"channel": "Social", "tactics": ["Creator partnerships", "Teaser countdown"]},
                    {"channel": "Email", "tactics": ["Waitlist nurture"]}
                ],
                "timeline": ["Week 1: teasers", "Week 3: launch", "Week 6: retrospective"],
                "success_metrics": ["Waitlist signups", "Share of voice"]
            }),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl AgentInvoker for CannedInvoker {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failures.contains(&request.phase) {
            anyhow::bail!("{} agent is unavailable", request.agent);
        }
        if self.malformed.contains(&request.phase) {
            return Ok(AgentResponse {
                payload: Value::String("Sorry, I could not put this into the requested format.".into()),
                narration: format!("{} had trouble formatting the results.", request.agent),
            });
        }

        let payload = self
            .overrides
            .get(&request.phase)
            .cloned()
            .unwrap_or_else(|| Self::payload(request));
        let mut narration = format!("{} completed the {} work.", request.agent, request.phase.title());
        if !request.directives.is_empty() {
            narration.push_str(&format!(" Applied {} directive(s).", request.directives.len()));
        }
        Ok(AgentResponse { payload, narration })
    }
}
