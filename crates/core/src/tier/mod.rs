//! Tier planning.
//!
//! A [`TierPlan`] buckets the instances of one stack by their start or stop
//! order tag. Tiers are executed as `1..=max_tier`; see [`TierPlan::unvisited`]
//! for instances that are matched but never reached.

mod grouper;
mod types;

pub use grouper::build_tier_plan;
pub use types::{OrderSelector, PlanError, StackTarget, TierPlan};
