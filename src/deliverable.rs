//! Typed per-phase deliverables.
//!
//! Each work phase produces its own shape. Agent output is parsed into the
//! matching variant; malformed output becomes an explicitly labeled degraded
//! value via [`Deliverable::fallback`] instead of failing the campaign.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// Prefix written into the primary text field of a degraded deliverable.
pub const DEGRADED_LABEL: &str = "[degraded output]";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchDeliverable {
    pub market_overview: String,
    pub audience_insights: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategicInsightDeliverable {
    pub core_insight: String,
    pub positioning: String,
    #[serde(default)]
    pub strategic_pillars: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    /// 0.0–1.0 relevance to the campaign.
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendingDeliverable {
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub timing_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryDeliverable {
    pub headline: String,
    pub narrative: String,
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub call_to_action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPlan {
    pub channel: String,
    #[serde(default)]
    pub tactics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeDeliverable {
    pub executive_summary: String,
    pub channel_plan: Vec<ChannelPlan>,
    #[serde(default)]
    pub timeline: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

/// Stand-in stored when an agent's output could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedDeliverable {
    pub phase: Phase,
    pub reason: String,
}

/// The structured output of one work phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deliverable {
    Research(ResearchDeliverable),
    StrategicInsight(StrategicInsightDeliverable),
    Trending(TrendingDeliverable),
    Story(StoryDeliverable),
    Collaborative(CollaborativeDeliverable),
    Degraded(DegradedDeliverable),
}

impl Deliverable {
    /// The phase this deliverable belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Research(_) => Phase::Research,
            Self::StrategicInsight(_) => Phase::StrategicInsight,
            Self::Trending(_) => Phase::Trending,
            Self::Story(_) => Phase::Story,
            Self::Collaborative(_) => Phase::Collaborative,
            Self::Degraded(d) => d.phase,
        }
    }

    /// Parse an agent payload into the variant for `phase`.
    ///
    /// Accepts a JSON object directly, or a JSON string holding an object
    /// possibly surrounded by prose or markdown fences.
    pub fn parse(phase: Phase, payload: &serde_json::Value) -> Result<Self> {
        let value = match payload {
            serde_json::Value::String(text) => {
                let cleaned = extract_json_object(text)
                    .with_context(|| format!("No JSON object in {} output", phase))?;
                serde_json::from_str(cleaned)
                    .with_context(|| format!("Failed to parse {} output as JSON", phase))?
            }
            other => other.clone(),
        };

        match phase {
            Phase::Research => from_value(phase, value).map(Self::Research),
            Phase::StrategicInsight => from_value(phase, value).map(Self::StrategicInsight),
            Phase::Trending => from_value(phase, value).map(Self::Trending),
            Phase::Story => from_value(phase, value).map(Self::Story),
            Phase::Collaborative => from_value(phase, value).map(Self::Collaborative),
            Phase::FinalSignoff => bail!("final_signoff does not produce a deliverable"),
        }
    }

    /// Degraded stand-in for `phase`, labeled so the degradation is visible.
    ///
    /// `FinalSignoff` has no deliverable of its own; it is recorded against
    /// `Collaborative`.
    pub fn fallback(phase: Phase, reason: &str) -> Self {
        let phase = match phase {
            Phase::FinalSignoff => Phase::Collaborative,
            other => other,
        };
        Self::Degraded(DegradedDeliverable {
            phase,
            reason: reason.to_string(),
        })
    }

    /// Whether this deliverable was produced by [`Deliverable::fallback`].
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Count of populated fields against total fields, for quality scoring.
    pub fn completeness(&self) -> (usize, usize) {
        let fields: Vec<bool> = match self {
            Self::Research(d) => vec![
                filled(&d.market_overview),
                !d.audience_insights.is_empty(),
                !d.competitors.is_empty(),
                !d.opportunities.is_empty(),
            ],
            Self::StrategicInsight(d) => vec![
                filled(&d.core_insight),
                filled(&d.positioning),
                !d.strategic_pillars.is_empty(),
                !d.risks.is_empty(),
            ],
            Self::Trending(d) => vec![
                !d.trends.is_empty(),
                d.trends.iter().any(|t| t.relevance >= 0.5),
                !d.hashtags.is_empty(),
                filled(&d.timing_notes),
            ],
            Self::Story(d) => vec![
                filled(&d.headline),
                filled(&d.narrative),
                !d.key_messages.is_empty(),
                filled(&d.call_to_action),
            ],
            Self::Collaborative(d) => vec![
                filled(&d.executive_summary),
                !d.channel_plan.is_empty(),
                !d.timeline.is_empty(),
                !d.success_metrics.is_empty(),
            ],
            Self::Degraded(d) => return (0, field_names(d.phase).len()),
        };
        let total = fields.len();
        let populated = fields.into_iter().filter(|f| *f).count();
        (populated, total)
    }

    /// Names of the empty fields, reported as validation issues.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks: Vec<(&'static str, bool)> = match self {
            Self::Research(d) => vec![
                ("market_overview", filled(&d.market_overview)),
                ("audience_insights", !d.audience_insights.is_empty()),
                ("competitors", !d.competitors.is_empty()),
                ("opportunities", !d.opportunities.is_empty()),
            ],
            Self::StrategicInsight(d) => vec![
                ("core_insight", filled(&d.core_insight)),
                ("positioning", filled(&d.positioning)),
                ("strategic_pillars", !d.strategic_pillars.is_empty()),
                ("risks", !d.risks.is_empty()),
            ],
            Self::Trending(d) => vec![
                ("trends", !d.trends.is_empty()),
                ("relevant_trend", d.trends.iter().any(|t| t.relevance >= 0.5)),
                ("hashtags", !d.hashtags.is_empty()),
                ("timing_notes", filled(&d.timing_notes)),
            ],
            Self::Story(d) => vec![
                ("headline", filled(&d.headline)),
                ("narrative", filled(&d.narrative)),
                ("key_messages", !d.key_messages.is_empty()),
                ("call_to_action", filled(&d.call_to_action)),
            ],
            Self::Collaborative(d) => vec![
                ("executive_summary", filled(&d.executive_summary)),
                ("channel_plan", !d.channel_plan.is_empty()),
                ("timeline", !d.timeline.is_empty()),
                ("success_metrics", !d.success_metrics.is_empty()),
            ],
            Self::Degraded(d) => return field_names(d.phase).to_vec(),
        };
        checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    /// One-line description used in narration.
    pub fn summary(&self) -> String {
        match self {
            Self::Research(d) => format!(
                "{} ({} audience insights, {} opportunities)",
                first_sentence(&d.market_overview),
                d.audience_insights.len(),
                d.opportunities.len()
            ),
            Self::StrategicInsight(d) => format!("Core insight: {}", first_sentence(&d.core_insight)),
            Self::Trending(d) => {
                let names: Vec<&str> = d.trends.iter().take(3).map(|t| t.name.as_str()).collect();
                format!("{} trends identified: {}", d.trends.len(), names.join(", "))
            }
            Self::Story(d) => format!("\"{}\"", d.headline),
            Self::Collaborative(d) => format!(
                "{} ({} channels)",
                first_sentence(&d.executive_summary),
                d.channel_plan.len()
            ),
            Self::Degraded(d) => format!("{} {}", DEGRADED_LABEL, d.reason),
        }
    }
}

fn field_names(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Research => &["market_overview", "audience_insights", "competitors", "opportunities"],
        Phase::StrategicInsight => &["core_insight", "positioning", "strategic_pillars", "risks"],
        Phase::Trending => &["trends", "relevant_trend", "hashtags", "timing_notes"],
        Phase::Story => &["headline", "narrative", "key_messages", "call_to_action"],
        Phase::Collaborative | Phase::FinalSignoff => {
            &["executive_summary", "channel_plan", "timeline", "success_metrics"]
        }
    }
}

fn from_value<T: DeserializeOwned>(phase: Phase, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .with_context(|| format!("{} output does not match the expected shape", phase))
}

fn filled(text: &str) -> bool {
    !text.trim().is_empty()
}

fn first_sentence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.find(". ") {
        Some(idx) => &trimmed[..=idx],
        None => trimmed,
    }
}

/// Slice out the outermost `{ ... }` of `text`, tolerating leading prose and code fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
