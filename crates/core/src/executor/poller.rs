//! Convergence polling.
//!
//! Waits for a batch of instances to reach a target state by querying their
//! status on a fixed interval, within a bounded number of attempts.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::instance::InstanceState;
use crate::metrics::CONVERGENCE_POLLS;
use crate::provider::InstanceController;

use super::types::ConvergenceError;

/// Polls instance status until a batch converges or the budget runs out.
#[derive(Clone)]
pub struct ConvergencePoller {
    controller: Arc<dyn InstanceController>,
    interval: Duration,
    max_attempts: u32,
}

impl ConvergencePoller {
    pub fn new(
        controller: Arc<dyn InstanceController>,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            controller,
            interval,
            max_attempts,
        }
    }

    /// Wait until every reported instance is in `target`.
    ///
    /// Each attempt sleeps one interval and then queries all ids as one batch.
    /// Query errors and state mismatches consume attempts from the same
    /// budget; the wait fails after `max_attempts + 1` unsuccessful attempts.
    /// Returns the number of attempts used on success.
    pub async fn wait_until(
        &self,
        endpoint: &str,
        instance_ids: &[String],
        target: InstanceState,
    ) -> Result<u32, ConvergenceError> {
        let budget = self.max_attempts.saturating_add(1);
        let mut pending: Vec<String> = instance_ids.to_vec();

        for attempt in 1..=budget {
            tokio::time::sleep(self.interval).await;

            let statuses = match self
                .controller
                .instance_statuses(endpoint, instance_ids)
                .await
            {
                Ok(statuses) => statuses,
                Err(e) => {
                    if e.is_transient() {
                        warn!("Lookup error on attempt {}: {}", attempt, e);
                    } else {
                        error!("Lookup error on attempt {}: {}", attempt, e);
                    }
                    CONVERGENCE_POLLS.with_label_values(&["error"]).inc();
                    continue;
                }
            };

            pending = statuses
                .iter()
                .filter(|status| {
                    debug!("{} does {} == {}", status.instance_id, target, status.state);
                    status.state != target
                })
                .map(|status| status.instance_id.clone())
                .collect();

            if pending.is_empty() {
                CONVERGENCE_POLLS.with_label_values(&["converged"]).inc();
                return Ok(attempt);
            }
            CONVERGENCE_POLLS.with_label_values(&["mismatch"]).inc();
        }

        CONVERGENCE_POLLS.with_label_values(&["timeout"]).inc();
        Err(ConvergenceError::Timeout {
            attempts: budget,
            target,
            pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::testing::MockInstanceProvider;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn provider(state: InstanceState) -> Arc<MockInstanceProvider> {
        Arc::new(MockInstanceProvider::with_instances(vec![
            Instance::new("i-1", "r1", "p", state),
            Instance::new("i-2", "r1", "p", state),
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_converged_on_first_attempt() {
        let provider = provider(InstanceState::Stopped);
        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 1000);

        let start = tokio::time::Instant::now();
        let attempts = poller
            .wait_until("r1", &ids(&["i-1", "i-2"]), InstanceState::Stopped)
            .await
            .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(provider.status_query_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_converges_after_transition() {
        let provider = provider(InstanceState::Running);
        provider.set_polls_until_settled(3).await;
        provider.stop_instances("r1", &ids(&["i-1", "i-2"])).await.unwrap();

        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 1000);
        let attempts = poller
            .wait_until("r1", &ids(&["i-1", "i-2"]), InstanceState::Stopped)
            .await
            .unwrap();

        assert_eq!(attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_budget_plus_one() {
        let provider = provider(InstanceState::Running);
        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 1000);

        let err = poller
            .wait_until("r1", &ids(&["i-1", "i-2"]), InstanceState::Stopped)
            .await
            .unwrap_err();

        let ConvergenceError::Timeout {
            attempts,
            target,
            pending,
        } = err;
        assert_eq!(attempts, 1001);
        assert_eq!(target, InstanceState::Stopped);
        assert_eq!(pending, ids(&["i-1", "i-2"]));
        assert_eq!(provider.status_query_count().await, 1001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_time_out_early() {
        let provider = provider(InstanceState::Running);
        provider.set_polls_until_settled(1000).await;
        provider.stop_instances("r1", &ids(&["i-1", "i-2"])).await.unwrap();

        // 1000 mismatches, converged on the 1001st and last attempt.
        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 1000);
        let attempts = poller
            .wait_until("r1", &ids(&["i-1", "i-2"]), InstanceState::Stopped)
            .await
            .unwrap();
        assert_eq!(attempts, 1001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_share_budget() {
        let provider = provider(InstanceState::Stopped);
        provider.fail_next_status_queries(2).await;

        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 5);
        let attempts = poller
            .wait_until("r1", &ids(&["i-1"]), InstanceState::Stopped)
            .await
            .unwrap();
        assert_eq!(attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_query_errors_share_budget() {
        let provider = provider(InstanceState::Stopped);
        provider.fail_next_status_queries_not_found(3).await;

        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(30), 3);
        let attempts = poller
            .wait_until("r1", &ids(&["i-1"]), InstanceState::Stopped)
            .await
            .unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(provider.status_query_count().await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_query_errors_time_out() {
        let provider = provider(InstanceState::Stopped);
        provider.fail_next_status_queries(usize::MAX).await;

        let poller = ConvergencePoller::new(provider.clone(), Duration::from_secs(1), 3);
        let err = poller
            .wait_until("r1", &ids(&["i-1"]), InstanceState::Stopped)
            .await
            .unwrap_err();

        let ConvergenceError::Timeout {
            attempts, pending, ..
        } = err;
        assert_eq!(attempts, 4);
        assert_eq!(pending, ids(&["i-1"]));
    }
}
