//! Stack orchestrator implementation.
//!
//! Drives one stack through startup or shutdown:
//! - Validating: snapshot, tier plan, tagging gates (no state change on failure)
//! - Executing: tiers in ascending order, one task per region, each waiting
//!   for its instances to converge
//! - Reporting: notifications and the final [`RunReport`]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::executor::{
    ConvergenceError, ConvergencePoller, RegionBatch, TierAction, TieredExecutor,
};
use crate::metrics::{ORCHESTRATION_RUNS, REGION_OUTCOMES, STATE_CHANGE_CALLS, TIER_DURATION};
use crate::notify::{Notifier, StackEvent};
use crate::provider::{InstanceController, InstanceSource, RegionMap};
use crate::tier::{build_tier_plan, PlanError, StackTarget, TierPlan};

use super::config::OrchestratorConfig;
use super::types::{
    Convergence, LifecycleAction, OrchestratorError, RegionOutcome, RunReport, TierReport,
};

/// Per-region work for one tier: issue the state change, then wait for it.
struct LifecycleTierAction {
    action: LifecycleAction,
    controller: Arc<dyn InstanceController>,
    poller: ConvergencePoller,
    notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl TierAction for LifecycleTierAction {
    type Output = RegionOutcome;

    async fn run(&self, batch: RegionBatch) -> RegionOutcome {
        let call = match self.action {
            LifecycleAction::Startup => {
                self.controller
                    .start_instances(&batch.endpoint, &batch.instance_ids)
                    .await
            }
            LifecycleAction::Shutdown => {
                self.controller
                    .stop_instances(&batch.endpoint, &batch.instance_ids)
                    .await
            }
        };

        // A failed call is recorded but the region is still polled; the
        // instances may already be transitioning.
        let (state_changes, action_error) = match call {
            Ok(changes) => {
                STATE_CHANGE_CALLS
                    .with_label_values(&[self.action.as_str(), "ok"])
                    .inc();
                for change in &changes {
                    debug!(
                        "{}: {} -> {}",
                        change.instance_id, change.previous_state, change.current_state
                    );
                }
                (changes, None)
            }
            Err(e) => {
                STATE_CHANGE_CALLS
                    .with_label_values(&[self.action.as_str(), "error"])
                    .inc();
                error!(
                    "Tier {}: {} call failed for {}: {}",
                    batch.tier,
                    self.action.as_str(),
                    batch.endpoint,
                    e
                );
                (Vec::new(), Some(e.to_string()))
            }
        };

        let convergence = match self
            .poller
            .wait_until(
                &batch.endpoint,
                &batch.instance_ids,
                self.action.target_state(),
            )
            .await
        {
            Ok(attempts) => {
                info!(
                    "Tier {}: {} reached {} after {} poll(s)",
                    batch.tier,
                    batch.endpoint,
                    self.action.target_state(),
                    attempts
                );
                REGION_OUTCOMES
                    .with_label_values(&[self.action.as_str(), "converged"])
                    .inc();
                self.notifier
                    .notify(StackEvent::tier_complete(self.action))
                    .await;
                Convergence::Converged { attempts }
            }
            Err(ConvergenceError::Timeout {
                attempts, pending, ..
            }) => {
                warn!(
                    "Tier {}: {} still waiting on {:?} after {} poll(s), skipping to next",
                    batch.tier, batch.endpoint, pending, attempts
                );
                REGION_OUTCOMES
                    .with_label_values(&[self.action.as_str(), "timed_out"])
                    .inc();
                self.notifier.notify(StackEvent::TierTimedOut).await;
                Convergence::TimedOut { attempts, pending }
            }
        };

        RegionOutcome {
            region: batch.region,
            endpoint: batch.endpoint,
            instance_ids: batch.instance_ids,
            state_changes,
            action_error,
            convergence,
        }
    }
}

/// Orchestrates ordered startup and shutdown of tagged stacks.
pub struct StackOrchestrator {
    config: OrchestratorConfig,
    source: Arc<dyn InstanceSource>,
    controller: Arc<dyn InstanceController>,
    notifier: Arc<dyn Notifier>,
    executor: TieredExecutor,
}

impl StackOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        source: Arc<dyn InstanceSource>,
        controller: Arc<dyn InstanceController>,
        notifier: Arc<dyn Notifier>,
        regions: RegionMap,
    ) -> Self {
        Self {
            config,
            source,
            controller,
            notifier,
            executor: TieredExecutor::new(regions),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// List instances and build the tier plan for `action` without validating
    /// it or changing anything.
    pub async fn plan(
        &self,
        target: &StackTarget,
        action: LifecycleAction,
    ) -> Result<TierPlan, OrchestratorError> {
        let instances = self.source.list_instances().await?;
        debug!(
            "Listed {} instance(s) from {}",
            instances.len(),
            self.source.name()
        );
        Ok(build_tier_plan(&instances, target, action.selector()))
    }

    /// Start every tier of the stack, lowest start order first.
    pub async fn startup(&self, target: &StackTarget) -> Result<RunReport, OrchestratorError> {
        self.run(LifecycleAction::Startup, target).await
    }

    /// Stop every tier of the stack, lowest stop order first.
    pub async fn shutdown(&self, target: &StackTarget) -> Result<RunReport, OrchestratorError> {
        self.run(LifecycleAction::Shutdown, target).await
    }

    async fn run(
        &self,
        action: LifecycleAction,
        target: &StackTarget,
    ) -> Result<RunReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "orchestration",
            %run_id,
            action = action.as_str(),
            stack = %target
        );

        async move {
            let started_at = Utc::now();
            info!("Starting {} of {}", action.as_str(), target);

            let plan = match self.plan(target, action).await {
                Ok(plan) => plan,
                Err(e) => {
                    error!("{}", e);
                    ORCHESTRATION_RUNS
                        .with_label_values(&[action.as_str(), "listing_failed"])
                        .inc();
                    return Err(e);
                }
            };

            info!("{}", plan.summary());
            info!("Max tier: {}", plan.max_tier());

            if let Err(e) = plan.validate() {
                let (event, result) = match &e {
                    PlanError::IncompleteTagging { .. } => {
                        (StackEvent::IncompleteTagging, "incomplete_tagging")
                    }
                    PlanError::NoOrdering => (StackEvent::NoOrdering, "no_ordering"),
                };
                error!("{}", e);
                self.notifier.notify(event).await;
                ORCHESTRATION_RUNS
                    .with_label_values(&[action.as_str(), result])
                    .inc();
                return Err(e.into());
            }

            let unvisited: Vec<String> = plan.unvisited().iter().map(|i| i.id.clone()).collect();
            if !unvisited.is_empty() {
                warn!(
                    "{} instance(s) have an order tag no tier reaches: {:?}",
                    unvisited.len(),
                    unvisited
                );
            }

            let tier_action = Arc::new(LifecycleTierAction {
                action,
                controller: Arc::clone(&self.controller),
                poller: ConvergencePoller::new(
                    Arc::clone(&self.controller),
                    self.config.poll_interval(),
                    self.config.max_poll_attempts,
                ),
                notifier: Arc::clone(&self.notifier),
            });

            let tiers: Vec<TierReport> = self
                .executor
                .execute(&plan, tier_action)
                .await
                .into_iter()
                .map(|tier| {
                    TIER_DURATION
                        .with_label_values(&[action.as_str()])
                        .observe(tier.elapsed.as_secs_f64());
                    let missing_results = tier.missing();
                    let elapsed_ms = u64::try_from(tier.elapsed.as_millis()).unwrap_or(u64::MAX);
                    TierReport {
                        index: tier.index,
                        instance_count: tier.instance_count,
                        regions: tier.results,
                        missing_results,
                        elapsed_ms,
                    }
                })
                .collect();

            self.notifier
                .notify(StackEvent::stack_complete(action))
                .await;
            ORCHESTRATION_RUNS
                .with_label_values(&[action.as_str(), "completed"])
                .inc();

            let report = RunReport {
                run_id,
                action,
                target: target.clone(),
                max_tier: plan.max_tier(),
                tiers,
                unvisited,
                started_at,
                finished_at: Utc::now(),
            };

            if report.converged() {
                info!("Finished {} of {}", action.as_str(), target);
            } else {
                warn!(
                    "Finished {} of {} with {} timed out region(s)",
                    action.as_str(),
                    target,
                    report.timed_out_regions()
                );
            }

            Ok(report)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceState;
    use crate::testing::{fixtures, CallKind, MockInstanceProvider, RecordingNotifier};
    use std::time::Duration;

    fn orchestrator(
        provider: &Arc<MockInstanceProvider>,
        notifier: &RecordingNotifier,
    ) -> StackOrchestrator {
        StackOrchestrator::new(
            OrchestratorConfig::default(),
            provider.clone(),
            provider.clone(),
            Arc::new(notifier.clone()),
            fixtures::regions(),
        )
    }

    #[tokio::test]
    async fn test_plan_does_not_change_state() {
        let provider = Arc::new(MockInstanceProvider::with_instances(vec![
            fixtures::tiered_instance("a", "r1", "1", "2"),
            fixtures::tiered_instance("b", "r1", "2", "1"),
        ]));
        let notifier = RecordingNotifier::new();
        let orchestrator = orchestrator(&provider, &notifier);

        let plan = orchestrator
            .plan(&fixtures::target(), LifecycleAction::Shutdown)
            .await
            .unwrap();

        assert_eq!(plan.max_tier(), 2);
        assert_eq!(plan.tier(1).unwrap()[0].id, "b");
        assert!(provider.calls_of(CallKind::Stop).await.is_empty());
        assert!(notifier.events().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_tier_shutdown_waits_one_interval() {
        let provider = Arc::new(MockInstanceProvider::with_instances(vec![
            fixtures::tiered_instance("a", "r1", "1", "1"),
        ]));
        let notifier = RecordingNotifier::new();
        let orchestrator = orchestrator(&provider, &notifier);

        let start = tokio::time::Instant::now();
        let report = orchestrator.shutdown(&fixtures::target()).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert!(report.converged());
        assert_eq!(report.tiers[0].regions[0].state_changes.len(), 1);
        assert_eq!(provider.state_of("a").await, Some(InstanceState::Stopped));
        assert_eq!(
            notifier.events().await,
            vec![StackEvent::TierShutDown, StackEvent::StackShutDown]
        );
    }
}
