//! Stack orchestrator: ordered startup and shutdown of tagged instances.
//!
//! Every run goes through the same phases:
//! - **Validating**: list instances, build the tier plan, check the gates
//! - **Executing**: tiers `1..=max` one at a time, regions in parallel
//! - **Reporting**: per-tier and stack-level notifications, a [`RunReport`]
//!
//! Startup and shutdown differ only in the order tag, the state-change call
//! and the state waited for; see [`LifecycleAction`].

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::StackOrchestrator;
pub use types::{
    Convergence, LifecycleAction, OrchestratorError, RegionOutcome, RunReport, TierReport,
};
