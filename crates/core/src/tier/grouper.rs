//! Groups a snapshot of instances into ordered tiers.

use std::collections::BTreeMap;

use tracing::debug;

use crate::instance::{classify, Instance};

use super::types::{OrderSelector, StackTarget, TierPlan};

/// Build the tier plan for `target` from a full instance snapshot.
///
/// Only instances whose classified stack and environment, and whose profile,
/// equal the target exactly are kept. They are bucketed by the literal value of
/// the selected order tag, so a non-numeric tag gets a bucket of its own. The
/// max tier only counts values that parse as positive integers.
pub fn build_tier_plan(
    instances: &[Instance],
    target: &StackTarget,
    selector: OrderSelector,
) -> TierPlan {
    let mut tiers: BTreeMap<String, Vec<Instance>> = BTreeMap::new();
    let mut max_tier: u64 = 0;

    for instance in instances {
        let tags = classify(instance);
        let order = selector.order(&tags);
        debug!(
            "For instance {}, found {}, {}, {}",
            instance.id, tags.environment, tags.stack, order
        );

        if instance.profile != target.profile
            || tags.environment != target.environment
            || tags.stack != target.stack
        {
            continue;
        }

        if let Some(index) = parse_tier_index(order) {
            max_tier = max_tier.max(index);
        }
        tiers
            .entry(order.to_string())
            .or_default()
            .push(instance.clone());
    }

    TierPlan::new(selector, tiers, max_tier)
}

/// Parse an order tag as a positive tier index.
fn parse_tier_index(order: &str) -> Option<u64> {
    match order.parse::<i64>() {
        Ok(value) if value > 0 => Some(value as u64),
        _ => None,
    }
}
