//! Tiered execution and convergence polling.
//!
//! - [`TieredExecutor`] walks a [`TierPlan`](crate::tier::TierPlan) tier by
//!   tier, fanning each tier out into one task per region.
//! - [`ConvergencePoller`] waits for a batch of instances to reach a target
//!   state within a bounded number of status queries.

mod poller;
mod tiered;
mod types;

pub use poller::ConvergencePoller;
pub use tiered::{partition_by_region, TierAction, TieredExecutor};
pub use types::{ConvergenceError, RegionBatch, TierResult};
