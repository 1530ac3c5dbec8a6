//! Trait definitions for instance providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::instance::{Instance, InstanceState, InstanceStatus};

/// State transition reported by a start or stop call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStateChange {
    pub instance_id: String,
    pub previous_state: InstanceState,
    pub current_state: InstanceState,
}

/// Lists every instance visible to the caller.
#[async_trait]
pub trait InstanceSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Take a snapshot of all instances across every configured region.
    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError>;
}

/// Issues state changes and status queries against one region endpoint.
#[async_trait]
pub trait InstanceController: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Request that the instances start. Returns once the request is accepted,
    /// not when the instances are running.
    async fn start_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError>;

    /// Request that the instances stop. Returns once the request is accepted.
    async fn stop_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError>;

    /// Current state of the instances, queried as one batch.
    async fn instance_statuses(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStatus>, ProviderError>;
}
