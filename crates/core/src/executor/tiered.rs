//! Tier-by-tier execution.
//!
//! Tiers run strictly one after another in ascending index order. Within a
//! tier, instances are grouped by region endpoint and one task per region runs
//! the tier action concurrently. The tier is joined by receiving exactly one
//! result per region task before the next tier starts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::instance::Instance;
use crate::provider::RegionMap;
use crate::tier::TierPlan;

use super::types::{RegionBatch, TierResult};

/// Work performed for one region of one tier.
#[async_trait]
pub trait TierAction: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn run(&self, batch: RegionBatch) -> Self::Output;
}

/// Runs a tier action over every tier of a plan.
#[derive(Debug, Clone)]
pub struct TieredExecutor {
    regions: RegionMap,
}

impl TieredExecutor {
    pub fn new(regions: RegionMap) -> Self {
        Self { regions }
    }

    /// Execute `action` over the plan's visited tiers in ascending order.
    ///
    /// Indices without a bucket are skipped, not renumbered. Returns one
    /// result per tier that had instances.
    pub async fn execute<A: TierAction>(
        &self,
        plan: &TierPlan,
        action: Arc<A>,
    ) -> Vec<TierResult<A::Output>> {
        let mut tiers = Vec::new();

        for (index, instances) in plan.visited_tiers() {
            tiers.push(self.execute_tier(index, instances, &action).await);
        }

        tiers
    }

    async fn execute_tier<A: TierAction>(
        &self,
        index: u64,
        instances: &[Instance],
        action: &Arc<A>,
    ) -> TierResult<A::Output> {
        info!("Invoking tier: {}", index);
        info!("Number of instances: {}", instances.len());

        let started = Instant::now();
        let batches = partition_by_region(index, instances, &self.regions);
        let region_count = batches.len();
        let (tx, mut rx) = mpsc::channel(region_count.max(1));

        for batch in batches {
            debug!(
                "Tier {}: launching {} for {:?}",
                index, batch.endpoint, batch.instance_ids
            );
            let tx = tx.clone();
            let action = Arc::clone(action);
            tokio::spawn(async move {
                let output = action.run(batch).await;
                let _ = tx.send(output).await;
            });
        }
        // Only the region tasks hold senders now, so the channel closes if
        // one of them dies without reporting.
        drop(tx);

        let mut results = Vec::with_capacity(region_count);
        while results.len() < region_count {
            match rx.recv().await {
                Some(output) => {
                    debug!(
                        "Got result {} of {} for tier {}",
                        results.len() + 1,
                        region_count,
                        index
                    );
                    results.push(output);
                }
                None => break,
            }
        }

        if results.len() < region_count {
            error!(
                "Tier {}: {} of {} region tasks ended without a result",
                index,
                region_count - results.len(),
                region_count
            );
        }

        TierResult {
            index,
            instance_count: instances.len(),
            region_count,
            results,
            elapsed: started.elapsed(),
        }
    }
}

/// Group a tier's instances by resolved region endpoint.
///
/// Batches come out in the order their endpoint was first seen; instance ids
/// keep their tier order within a batch.
pub fn partition_by_region(
    tier: u64,
    instances: &[Instance],
    regions: &RegionMap,
) -> Vec<RegionBatch> {
    let mut batches: Vec<RegionBatch> = Vec::new();

    for instance in instances {
        debug!("Invoking instance: {}", instance.id);
        let endpoint = regions.resolve(&instance.region);
        match batches.iter_mut().find(|b| b.endpoint == endpoint) {
            Some(batch) => batch.instance_ids.push(instance.id.clone()),
            None => batches.push(RegionBatch {
                tier,
                region: instance.region.clone(),
                endpoint: endpoint.to_string(),
                instance_ids: vec![instance.id.clone()],
            }),
        }
    }

    batches
}
