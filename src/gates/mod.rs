//! Human-in-the-loop approval gate.
//!
//! Decides, before each upcoming phase, whether the campaign pauses for a
//! human decision or advances automatically.

use crate::campaign::CampaignOptions;
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Advance without waiting.
    Proceed,
    /// Stop and wait for resume or refine.
    Pause,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalGate {
    pub manual_review: bool,
    pub require_final_signoff: bool,
}

impl ApprovalGate {
    pub fn new(manual_review: bool, require_final_signoff: bool) -> Self {
        Self {
            manual_review,
            require_final_signoff,
        }
    }

    /// Pause before every phase under manual review, and before
    /// `FinalSignoff` whenever sign-off is required.
    pub fn check_phase(&self, upcoming: Phase) -> GateDecision {
        if self.manual_review
            || (upcoming == Phase::FinalSignoff && self.require_final_signoff)
        {
            GateDecision::Pause
        } else {
            GateDecision::Proceed
        }
    }

    pub fn should_pause(&self, upcoming: Phase) -> bool {
        self.check_phase(upcoming) == GateDecision::Pause
    }
}

impl From<CampaignOptions> for ApprovalGate {
    fn from(options: CampaignOptions) -> Self {
        Self::new(options.manual_review, options.require_final_signoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_never_pauses() {
        let gate = ApprovalGate::new(false, false);
        assert!(Phase::ALL.iter().all(|p| !gate.should_pause(*p)));
    }

    #[test]
    fn test_manual_review_pauses_everywhere() {
        let gate = ApprovalGate::new(true, false);
        assert!(Phase::ALL.iter().all(|p| gate.should_pause(*p)));
    }

    #[test]
    fn test_final_signoff_only_pauses_before_completion() {
        let gate = ApprovalGate::new(false, true);
        assert_eq!(gate.check_phase(Phase::Story), GateDecision::Proceed);
        assert_eq!(gate.check_phase(Phase::FinalSignoff), GateDecision::Pause);
    }

    #[test]
    fn test_from_campaign_options() {
        let gate: ApprovalGate = CampaignOptions {
            manual_review: true,
            require_final_signoff: false,
        }
        .into();
        assert!(gate.manual_review);
        assert!(!gate.require_final_signoff);
    }
}
