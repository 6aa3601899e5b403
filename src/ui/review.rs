use anyhow::Result;
use dialoguer::{Input, Select, theme::ColorfulTheme};

use crate::campaign::Campaign;

/// What the human decided at a review checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Refine(String),
    Cancel,
}

/// Ask the human what to do with a paused campaign.
///
/// With `auto_approve` every checkpoint is approved without prompting.
pub fn prompt_review(campaign: &Campaign, auto_approve: bool) -> Result<ReviewDecision> {
    if auto_approve {
        return Ok(ReviewDecision::Approve);
    }
    let (Some(pending), Some(review)) = (campaign.pending_phase, campaign.awaiting_review) else {
        anyhow::bail!("Campaign {} is not awaiting review", campaign.id);
    };

    let options = &[
        format!("Approve and continue with {}", pending.title()),
        format!("Refine {} with new instructions", review.title()),
        "Cancel campaign".to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{} is ready. What next?", review.title()))
        .items(options)
        .default(0)
        .interact()?;

    match selection {
        0 => Ok(ReviewDecision::Approve),
        1 => {
            let instructions: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Instructions")
                .interact_text()?;
            Ok(ReviewDecision::Refine(instructions))
        }
        _ => Ok(ReviewDecision::Cancel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::{CampaignContext, CampaignOptions};

    #[test]
    fn test_auto_approve_skips_prompt() {
        let campaign = Campaign::new("brief", CampaignContext::default(), CampaignOptions::default());
        assert_eq!(prompt_review(&campaign, true).unwrap(), ReviewDecision::Approve);
    }

    #[test]
    fn test_not_paused_is_an_error() {
        let campaign = Campaign::new("brief", CampaignContext::default(), CampaignOptions::default());
        assert!(prompt_review(&campaign, false).is_err());
    }
}
