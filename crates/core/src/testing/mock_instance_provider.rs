//! Mock instance provider for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::instance::{Instance, InstanceState, InstanceStatus};
use crate::provider::{InstanceController, InstanceSource, InstanceStateChange, ProviderError};

/// Kind of provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    List,
    Start,
    Stop,
    Status,
}

/// A recorded provider call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Endpoint the call was addressed to (empty for listing).
    pub endpoint: String,
    pub instance_ids: Vec<String>,
    /// Position of the call among all recorded calls.
    pub sequence: usize,
}

#[derive(Debug, Clone)]
struct MockInstance {
    instance: Instance,
    /// Target state and status queries left before the instance reaches it.
    settling: Option<(InstanceState, usize)>,
}

/// Mock implementation of both provider traits.
///
/// Provides controllable behavior for testing:
/// - Track every call for assertions
/// - Keep instances in a transitional state for a number of status queries
/// - Pin instances so they never settle
/// - Simulate listing, action and status query failures
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockInstanceProvider::with_instances(vec![instance]);
/// provider.set_polls_until_settled(2).await;
///
/// provider.stop_instances("r1", &ids).await?;
/// // First two status queries report "stopping", the third "stopped".
/// ```
#[derive(Debug)]
pub struct MockInstanceProvider {
    instances: Arc<RwLock<Vec<MockInstance>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// Status queries an instance spends in a transitional state.
    polls_until_settled: Arc<RwLock<usize>>,
    /// Instances that never leave their transitional state.
    stuck: Arc<RwLock<HashSet<String>>>,
    /// Remaining status queries that fail.
    failing_status_queries: Arc<RwLock<usize>>,
    /// Failing status queries report a missing instance instead of a request failure.
    status_failure_not_found: Arc<RwLock<bool>>,
    /// If set, the next start/stop call fails with this error.
    next_action_error: Arc<RwLock<Option<ProviderError>>>,
    /// If set, the next listing fails with this error.
    next_list_error: Arc<RwLock<Option<ProviderError>>>,
    /// Simulated duration of a start/stop call.
    action_delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockInstanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInstanceProvider {
    /// Create a provider with no instances.
    pub fn new() -> Self {
        Self::with_instances(Vec::new())
    }

    /// Create a provider seeded with instances.
    pub fn with_instances(instances: Vec<Instance>) -> Self {
        Self {
            instances: Arc::new(RwLock::new(
                instances
                    .into_iter()
                    .map(|instance| MockInstance {
                        instance,
                        settling: None,
                    })
                    .collect(),
            )),
            calls: Arc::new(RwLock::new(Vec::new())),
            polls_until_settled: Arc::new(RwLock::new(0)),
            stuck: Arc::new(RwLock::new(HashSet::new())),
            failing_status_queries: Arc::new(RwLock::new(0)),
            status_failure_not_found: Arc::new(RwLock::new(false)),
            next_action_error: Arc::new(RwLock::new(None)),
            next_list_error: Arc::new(RwLock::new(None)),
            action_delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current state of an instance.
    pub async fn state_of(&self, id: &str) -> Option<InstanceState> {
        self.instances
            .read()
            .await
            .iter()
            .find(|m| m.instance.id == id)
            .map(|m| m.instance.state)
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get recorded calls of one kind.
    pub async fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of status queries made so far.
    pub async fn status_query_count(&self) -> usize {
        self.calls_of(CallKind::Status).await.len()
    }

    /// Highest number of start/stop calls observed in flight at once.
    pub fn max_concurrent_actions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Keep started/stopped instances transitional for `polls` status queries.
    pub async fn set_polls_until_settled(&self, polls: usize) {
        *self.polls_until_settled.write().await = polls;
    }

    /// Never let `id` reach its target state.
    pub async fn set_stuck(&self, id: &str) {
        self.stuck.write().await.insert(id.to_string());
    }

    /// Fail the next `count` status queries with a request failure.
    pub async fn fail_next_status_queries(&self, count: usize) {
        *self.status_failure_not_found.write().await = false;
        *self.failing_status_queries.write().await = count;
    }

    /// Fail the next `count` status queries with a missing instance error.
    pub async fn fail_next_status_queries_not_found(&self, count: usize) {
        *self.status_failure_not_found.write().await = true;
        *self.failing_status_queries.write().await = count;
    }

    /// Configure the next start/stop call to fail with the given error.
    pub async fn set_next_action_error(&self, error: ProviderError) {
        *self.next_action_error.write().await = Some(error);
    }

    /// Configure the next listing to fail with the given error.
    pub async fn set_next_list_error(&self, error: ProviderError) {
        *self.next_list_error.write().await = Some(error);
    }

    /// Set the simulated duration of start/stop calls.
    pub async fn set_action_delay(&self, delay: Duration) {
        *self.action_delay.write().await = delay;
    }

    async fn record(&self, kind: CallKind, endpoint: &str, instance_ids: &[String]) {
        let mut calls = self.calls.write().await;
        let sequence = calls.len();
        calls.push(RecordedCall {
            kind,
            endpoint: endpoint.to_string(),
            instance_ids: instance_ids.to_vec(),
            sequence,
        });
    }

    async fn transition(
        &self,
        kind: CallKind,
        endpoint: &str,
        instance_ids: &[String],
        transitional: InstanceState,
        target: InstanceState,
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        self.record(kind, endpoint, instance_ids).await;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.action_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self
            .apply_transition(instance_ids, transitional, target)
            .await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn apply_transition(
        &self,
        instance_ids: &[String],
        transitional: InstanceState,
        target: InstanceState,
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        if let Some(err) = self.next_action_error.write().await.take() {
            return Err(err);
        }

        let polls = *self.polls_until_settled.read().await;
        let stuck = self.stuck.read().await;
        let mut instances = self.instances.write().await;

        if let Some(missing) = instance_ids
            .iter()
            .find(|id| !instances.iter().any(|m| &m.instance.id == *id))
        {
            return Err(ProviderError::InstanceNotFound(missing.clone()));
        }

        let mut changes = Vec::with_capacity(instance_ids.len());
        for mock in instances
            .iter_mut()
            .filter(|m| instance_ids.contains(&m.instance.id))
        {
            let previous_state = mock.instance.state;
            if stuck.contains(&mock.instance.id) {
                mock.instance.state = transitional;
                mock.settling = None;
            } else if polls == 0 {
                mock.instance.state = target;
                mock.settling = None;
            } else {
                mock.instance.state = transitional;
                mock.settling = Some((target, polls));
            }
            changes.push(InstanceStateChange {
                instance_id: mock.instance.id.clone(),
                previous_state,
                current_state: mock.instance.state,
            });
        }
        Ok(changes)
    }
}

#[async_trait]
impl InstanceSource for MockInstanceProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        self.record(CallKind::List, "", &[]).await;
        if let Some(err) = self.next_list_error.write().await.take() {
            return Err(err);
        }
        Ok(self
            .instances
            .read()
            .await
            .iter()
            .map(|m| m.instance.clone())
            .collect())
    }
}

#[async_trait]
impl InstanceController for MockInstanceProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        self.transition(
            CallKind::Start,
            endpoint,
            instance_ids,
            InstanceState::Pending,
            InstanceState::Running,
        )
        .await
    }

    async fn stop_instances(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStateChange>, ProviderError> {
        self.transition(
            CallKind::Stop,
            endpoint,
            instance_ids,
            InstanceState::Stopping,
            InstanceState::Stopped,
        )
        .await
    }

    async fn instance_statuses(
        &self,
        endpoint: &str,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceStatus>, ProviderError> {
        self.record(CallKind::Status, endpoint, instance_ids).await;

        {
            let mut failing = self.failing_status_queries.write().await;
            if *failing > 0 {
                *failing -= 1;
                if *self.status_failure_not_found.read().await {
                    let id = instance_ids.first().cloned().unwrap_or_default();
                    return Err(ProviderError::InstanceNotFound(id));
                }
                return Err(ProviderError::RequestFailed(
                    "simulated status failure".to_string(),
                ));
            }
        }

        let mut instances = self.instances.write().await;
        let mut statuses = Vec::with_capacity(instance_ids.len());
        for mock in instances
            .iter_mut()
            .filter(|m| instance_ids.contains(&m.instance.id))
        {
            statuses.push(InstanceStatus {
                instance_id: mock.instance.id.clone(),
                state: mock.instance.state,
            });
            if let Some((target, remaining)) = mock.settling {
                if remaining <= 1 {
                    mock.instance.state = target;
                    mock.settling = None;
                } else {
                    mock.settling = Some((target, remaining - 1));
                }
            }
        }
        Ok(statuses)
    }
}
