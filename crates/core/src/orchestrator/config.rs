//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the stack orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Seconds to wait before each instance status poll.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Poll attempts allowed before a region is reported as timed out.
    /// The wait gives up after `max_poll_attempts + 1` unsuccessful polls.
    #[serde(default = "default_max_attempts")]
    pub max_poll_attempts: u32,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1000
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_attempts(),
        }
    }
}
