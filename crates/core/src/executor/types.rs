//! Types for tiered execution.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::instance::InstanceState;

/// Errors from waiting on instance convergence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvergenceError {
    /// The poll budget ran out before every instance reached the target.
    #[error("wait timeout exceeded after {attempts} attempts waiting for {target}")]
    Timeout {
        attempts: u32,
        target: InstanceState,
        /// Instances not in the target state at the last successful query.
        pending: Vec<String>,
    },
}

/// Instances of one tier that share a region endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionBatch {
    /// Tier index this batch belongs to.
    pub tier: u64,
    /// First region seen for this endpoint.
    pub region: String,
    /// Resolved endpoint.
    pub endpoint: String,
    pub instance_ids: Vec<String>,
}

/// Results collected for one tier.
#[derive(Debug, Clone)]
pub struct TierResult<O> {
    pub index: u64,
    /// Instances in the tier.
    pub instance_count: usize,
    /// Region tasks launched for the tier.
    pub region_count: usize,
    /// One entry per region task that reported back, in completion order.
    pub results: Vec<O>,
    /// Wall time from launch to join.
    pub elapsed: Duration,
}

impl<O> TierResult<O> {
    /// Region tasks that ended without reporting (panicked).
    pub fn missing(&self) -> usize {
        self.region_count.saturating_sub(self.results.len())
    }
}
