pub mod engine;
pub mod machine;
pub mod runner;
pub mod store;
pub mod timers;
mod writer;

pub use engine::{
    CampaignOrchestrator, DEFAULT_PACING_DELAY, OrchestratorBuilder, OrchestratorSettings,
    RestoreReport,
};
pub use machine::{Transition, plan_transition};
pub use runner::{PhaseOutcome, RunMode};
pub use store::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore};
pub use timers::TimerRegistry;
