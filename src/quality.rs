//! Quality gate and flow decisions for completed phases.
//!
//! After each phase the gate scores the deliverable and recommends a flow:
//!
//! - **Proceed**: results are strong enough
//! - **Retry**: results are weak; recorded for audit only, no retry loop runs
//! - **SwitchStrategy**: trend results are weak; later phases are told to
//!   de-emphasize trend-based messaging
//!
//! Flow decisions never change the canonical phase order.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deliverable::Deliverable;
use crate::phase::Phase;

/// Default minimum confidence for a deliverable to pass.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// 0.0–1.0
    pub confidence: f64,
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl ValidationResult {
    pub fn new(confidence: f64, threshold: f64, issues: Vec<String>) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            confidence,
            passed: confidence >= threshold,
            issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum FlowDecision {
    Proceed,
    Retry { reason: String },
    SwitchStrategy { reason: String },
}

impl FlowDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Retry { .. } => "retry",
            Self::SwitchStrategy { .. } => "switch_strategy",
        }
    }

    pub fn requests_alternative_strategy(&self) -> bool {
        matches!(self, Self::SwitchStrategy { .. })
    }
}

/// Map a validation onto a flow decision.
pub fn decide_flow(phase: Phase, validation: &ValidationResult) -> FlowDecision {
    if validation.passed {
        return FlowDecision::Proceed;
    }
    let reason = format!(
        "confidence {:.2} below threshold{}",
        validation.confidence,
        if validation.issues.is_empty() {
            String::new()
        } else {
            format!(" ({})", validation.issues.join("; "))
        }
    );
    match phase {
        Phase::Trending => FlowDecision::SwitchStrategy { reason },
        _ => FlowDecision::Retry { reason },
    }
}

/// Scores deliverables and recommends a flow after each phase.
#[async_trait]
pub trait QualityGate: Send + Sync {
    async fn validate(&self, phase: Phase, deliverable: &Deliverable) -> Result<ValidationResult>;

    fn decide_flow(&self, phase: Phase, validation: &ValidationResult) -> FlowDecision {
        decide_flow(phase, validation)
    }
}

/// Scores a deliverable by how many of its fields are populated.
pub struct ConfidenceQualityGate {
    threshold: f64,
}

impl ConfidenceQualityGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ConfidenceQualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[async_trait]
impl QualityGate for ConfidenceQualityGate {
    async fn validate(&self, phase: Phase, deliverable: &Deliverable) -> Result<ValidationResult> {
        if deliverable.phase() != phase {
            anyhow::bail!(
                "deliverable for {} submitted to the {} gate",
                deliverable.phase(),
                phase
            );
        }
        let (filled, total) = deliverable.completeness();
        let confidence = if total == 0 {
            0.0
        } else {
            filled as f64 / total as f64
        };
        let mut issues: Vec<String> = deliverable
            .missing_fields()
            .into_iter()
            .map(|field| format!("missing {}", field))
            .collect();
        if deliverable.is_degraded() {
            issues.insert(0, "agent output was malformed; fallback stored".to_string());
        }
        Ok(ValidationResult::new(confidence, self.threshold, issues))
    }
}
