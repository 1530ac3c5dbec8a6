//! Types for the stack orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::instance::InstanceState;
use crate::provider::{InstanceStateChange, ProviderError};
use crate::tier::{OrderSelector, PlanError, StackTarget};

/// Errors that abort an orchestration before any state change is issued.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Instances could not be listed.
    #[error("instance listing failed: {0}")]
    Listing(#[from] ProviderError),

    /// The tier plan failed pre-flight validation.
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Direction of an orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Startup,
    Shutdown,
}

impl LifecycleAction {
    /// Order tag that drives tiering.
    pub fn selector(&self) -> OrderSelector {
        match self {
            LifecycleAction::Startup => OrderSelector::StartOrder,
            LifecycleAction::Shutdown => OrderSelector::StopOrder,
        }
    }

    /// State every instance must reach.
    pub fn target_state(&self) -> InstanceState {
        match self {
            LifecycleAction::Startup => InstanceState::Running,
            LifecycleAction::Shutdown => InstanceState::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Startup => "startup",
            LifecycleAction::Shutdown => "shutdown",
        }
    }
}

/// How waiting for a region's instances ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Convergence {
    Converged { attempts: u32 },
    TimedOut { attempts: u32, pending: Vec<String> },
}

/// Result of one region task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionOutcome {
    pub region: String,
    pub endpoint: String,
    pub instance_ids: Vec<String>,
    /// Transitions reported by the start/stop call.
    pub state_changes: Vec<InstanceStateChange>,
    /// Set when the start/stop call itself failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_error: Option<String>,
    pub convergence: Convergence,
}

impl RegionOutcome {
    pub fn converged(&self) -> bool {
        matches!(self.convergence, Convergence::Converged { .. })
    }
}

/// Result of one tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierReport {
    pub index: u64,
    pub instance_count: usize,
    pub regions: Vec<RegionOutcome>,
    /// Region tasks that ended without reporting.
    pub missing_results: usize,
    pub elapsed_ms: u64,
}

impl TierReport {
    pub fn converged(&self) -> bool {
        self.missing_results == 0 && self.regions.iter().all(RegionOutcome::converged)
    }
}

/// Summary of a completed orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub action: LifecycleAction,
    pub target: StackTarget,
    pub max_tier: u64,
    pub tiers: Vec<TierReport>,
    /// Matched instances that no tier reached (non-canonical order tags).
    pub unvisited: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Whether every tier converged.
    pub fn converged(&self) -> bool {
        self.tiers.iter().all(TierReport::converged)
    }

    /// Ids of instances a start/stop was issued for, in tier order.
    pub fn acted_on(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .flat_map(|t| t.regions.iter())
            .flat_map(|r| r.instance_ids.iter().map(String::as_str))
            .collect()
    }

    /// Region tasks that timed out.
    pub fn timed_out_regions(&self) -> usize {
        self.tiers
            .iter()
            .flat_map(|t| t.regions.iter())
            .filter(|r| !r.converged())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(convergence: Convergence) -> RegionOutcome {
        RegionOutcome {
            region: "r1".to_string(),
            endpoint: "endpoint-r1".to_string(),
            instance_ids: vec!["i-1".to_string()],
            state_changes: vec![],
            action_error: None,
            convergence,
        }
    }

    #[test]
    fn test_action_mapping() {
        assert_eq!(LifecycleAction::Startup.selector(), OrderSelector::StartOrder);
        assert_eq!(LifecycleAction::Shutdown.selector(), OrderSelector::StopOrder);
        assert_eq!(LifecycleAction::Startup.target_state(), InstanceState::Running);
        assert_eq!(LifecycleAction::Shutdown.target_state(), InstanceState::Stopped);
    }

    #[test]
    fn test_tier_report_converged() {
        let mut tier = TierReport {
            index: 1,
            instance_count: 1,
            regions: vec![outcome(Convergence::Converged { attempts: 1 })],
            missing_results: 0,
            elapsed_ms: 30_000,
        };
        assert!(tier.converged());

        tier.missing_results = 1;
        assert!(!tier.converged());

        tier.missing_results = 0;
        tier.regions.push(outcome(Convergence::TimedOut {
            attempts: 1001,
            pending: vec!["i-1".to_string()],
        }));
        assert!(!tier.converged());
    }

    #[test]
    fn test_convergence_serialization() {
        let json = serde_json::to_value(Convergence::TimedOut {
            attempts: 4,
            pending: vec!["i-1".to_string()],
        })
        .unwrap();
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["attempts"], 4);
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::from(PlanError::NoOrdering);
        assert_eq!(
            err.to_string(),
            "no ordering present: no order tag is a positive integer"
        );

        let err = OrchestratorError::from(ProviderError::Timeout);
        assert_eq!(err.to_string(), "instance listing failed: Request timeout");
    }
}
