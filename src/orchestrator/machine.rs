//! Phase transition rules.

use crate::gates::ApprovalGate;
use crate::phase::{Phase, review_checkpoint};

/// What happens after a phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Wait for a human before `pending`, with `review` under review.
    Pause { pending: Phase, review: Phase },
    /// Schedule `next` without waiting.
    Advance(Phase),
}

impl Transition {
    pub fn next_phase(&self) -> Phase {
        match self {
            Self::Pause { pending, .. } => *pending,
            Self::Advance(next) => *next,
        }
    }
}

/// Decide the transition after `completed`. `None` once the final phase has run.
pub fn plan_transition(completed: Phase, gate: &ApprovalGate) -> Option<Transition> {
    let next = completed.next()?;
    if gate.should_pause(next) {
        Some(Transition::Pause {
            pending: next,
            review: review_checkpoint(completed, next),
        })
    } else {
        Some(Transition::Advance(next))
    }
}

/// Narration shown when pausing.
pub fn review_prompt(pending: Phase, review: Phase) -> String {
    if pending == Phase::FinalSignoff {
        format!(
            "The {} is ready for sign-off. Resume to finalize the campaign, or refine to rework the {}.",
            review.title(),
            review.title()
        )
    } else {
        format!(
            "{} results are ready for review. Resume to continue with {}, or refine to rerun {} with new instructions.",
            review.title(),
            pending.title(),
            review.title()
        )
    }
}
