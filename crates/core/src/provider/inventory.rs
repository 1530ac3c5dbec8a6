//! File-backed instance provider.
//!
//! Reads a JSON snapshot of instances and applies start/stop requests to it in
//! memory. When loaded from a file, every state change is written back so a
//! later run sees the result of the previous one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::ProviderError;
use super::traits::{InstanceController, InstanceSource, InstanceStateChange};
use crate::instance::{Instance, InstanceState, InstanceStatus};

/// On-disk inventory format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryFile {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// Instance provider backed by an inventory snapshot.
#[derive(Debug)]
pub struct InventoryProvider {
    path: Option<PathBuf>,
    instances: RwLock<Vec<Instance>>,
}

impl InventoryProvider {
    /// Load an inventory file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let file: InventoryFile = serde_json::from_str(&contents)
            .map_err(|e| ProviderError::InvalidInventory(format!("{}: {}", path.display(), e)))?;

        info!(
            "Loaded {} instances from inventory {}",
            file.instances.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            instances: RwLock::new(file.instances),
        })
    }

    /// In-memory inventory that is never persisted.
    pub fn from_instances(instances: Vec<Instance>) -> Self {
        Self {
            path: None,
            instances: RwLock::new(instances),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn transition(
        &self,
        instance_ids: &[String],
        target: InstanceState,
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        let mut instances = self.instances.write().await;

        // Reject the whole batch before touching anything.
        for id in instance_ids {
            match instances.iter().find(|i| &i.id == id) {
                None => return Err(ProviderError::InstanceNotFound(id.clone())),
                Some(instance) if instance.state == InstanceState::Terminated => {
                    return Err(ProviderError::RequestFailed(format!(
                        "instance {} is terminated",
                        id
                    )));
                }
                Some(_) => {}
            }
        }

        let mut changes = Vec::with_capacity(instance_ids.len());
        for instance in instances.iter_mut().filter(|i| instance_ids.contains(&i.id)) {
            debug!("{} {} -> {}", instance.id, instance.state, target);
            changes.push(InstanceStateChange {
                instance_id: instance.id.clone(),
                previous_state: instance.state,
                current_state: target,
            });
            instance.state = target;
        }

        if let Some(path) = &self.path {
            let file = InventoryFile {
                instances: instances.clone(),
            };
            let json = serde_json::to_string_pretty(&file)
                .map_err(|e| ProviderError::InvalidInventory(e.to_string()))?;
            tokio::fs::write(path, json).await?;
        }

        Ok(changes)
    }
}

#[async_trait]
impl InstanceSource for InventoryProvider {
    fn name(&self) -> &str {
        "inventory"
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        Ok(self.instances.read().await.clone())
    }
}

#[async_trait]
impl InstanceController for InventoryProvider {
    fn name(&self) -> &str {
        "inventory"
    }

    async fn start_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        debug!("Starting {:?} via {}", instance_ids, endpoint);
        self.transition(instance_ids, InstanceState::Running).await
    }

    async fn stop_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        debug!("Stopping {:?} via {}", instance_ids, endpoint);
        self.transition(instance_ids, InstanceState::Stopped).await
    }

    async fn instance_statuses(
        &self,
        _endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStatus>, ProviderError> {
        let instances = self.instances.read().await;
        Ok(instances
            .iter()
            .filter(|i| instance_ids.contains(&i.id))
            .map(|i| InstanceStatus {
                instance_id: i.id.clone(),
                state: i.state,
            })
            .collect())
    }
}
