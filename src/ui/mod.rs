pub mod icons;
pub mod progress;
pub mod review;

pub use progress::CampaignUI;
pub use review::{ReviewDecision, prompt_review};
