//! Canonical phase graph for campaign orchestration.
//!
//! This module provides:
//! - `Phase` enum naming every stage of the pipeline, in canonical order
//! - Ordering helpers (`next`, `previous`, `prerequisites`)
//! - The review checkpoint mapping used when a campaign pauses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static CANONICAL_ORDER: [Phase; 6] = Phase::ALL;

/// One stage of the campaign pipeline.
///
/// `FinalSignoff` is a pseudo-phase: running it finalizes the campaign
/// instead of invoking an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Research,
    StrategicInsight,
    Trending,
    Story,
    Collaborative,
    FinalSignoff,
}

impl Phase {
    /// Every phase in canonical order.
    pub const ALL: [Phase; 6] = [
        Phase::Research,
        Phase::StrategicInsight,
        Phase::Trending,
        Phase::Story,
        Phase::Collaborative,
        Phase::FinalSignoff,
    ];

    /// The phases that produce a deliverable.
    pub const WORK: [Phase; 5] = [
        Phase::Research,
        Phase::StrategicInsight,
        Phase::Trending,
        Phase::Story,
        Phase::Collaborative,
    ];

    pub fn first() -> Phase {
        Phase::Research
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::StrategicInsight => "strategic_insight",
            Self::Trending => "trending",
            Self::Story => "story",
            Self::Collaborative => "collaborative",
            Self::FinalSignoff => "final_signoff",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|p| p == self)
            .unwrap_or(Self::ALL.len())
    }

    /// The phase that runs after this one, `None` after `FinalSignoff`.
    pub fn next(&self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The phase that runs before this one, `None` for `Research`.
    pub fn previous(&self) -> Option<Phase> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Every phase whose result must exist before this one may run.
    pub fn prerequisites(&self) -> &'static [Phase] {
        &CANONICAL_ORDER[..self.index()]
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, Self::FinalSignoff)
    }

    /// Speaker label used when the phase's agent narrates in the conversation.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::Research => "Research Analyst",
            Self::StrategicInsight => "Strategy Lead",
            Self::Trending => "Trend Scout",
            Self::Story => "Storyteller",
            Self::Collaborative => "Creative Director",
            Self::FinalSignoff => "Orchestrator",
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Research => "Research",
            Self::StrategicInsight => "Strategic Insight",
            Self::Trending => "Trending",
            Self::Story => "Story",
            Self::Collaborative => "Collaborative Plan",
            Self::FinalSignoff => "Final Sign-off",
        }
    }
}

/// The phase whose output is under review when pausing before `next`.
///
/// Pausing before `FinalSignoff` always reviews `Collaborative`, the last
/// phase that produced a deliverable.
pub fn review_checkpoint(completed: Phase, next: Phase) -> Phase {
    if next == Phase::FinalSignoff {
        Phase::Collaborative
    } else {
        completed
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(Self::Research),
            "strategic_insight" => Ok(Self::StrategicInsight),
            "trending" => Ok(Self::Trending),
            "story" => Ok(Self::Story),
            "collaborative" => Ok(Self::Collaborative),
            "final_signoff" => Ok(Self::FinalSignoff),
            _ => anyhow::bail!(
                "Invalid phase '{}'. Valid values: research, strategic_insight, trending, story, collaborative, final_signoff",
                s
            ),
        }
    }
}
