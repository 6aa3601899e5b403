pub mod agents;
pub mod api;
pub mod brief;
pub mod campaign;
pub mod config;
pub mod deliverable;
pub mod errors;
pub mod gates;
pub mod logging;
pub mod orchestrator;
pub mod phase;
pub mod quality;
pub mod server;
pub mod ui;
