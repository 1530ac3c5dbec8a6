//! Types for tier planning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::instance::{Instance, InstanceTags};

/// Errors raised by pre-flight validation of a tier plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// At least one matched instance has no order tag.
    #[error(
        "incomplete tagging: {} instance(s) missing an order tag: {}",
        .instance_ids.len(),
        .instance_ids.join(", ")
    )]
    IncompleteTagging { instance_ids: Vec<String> },

    /// No matched instance has a positive integer order tag.
    #[error("no ordering present: no order tag is a positive integer")]
    NoOrdering,
}

/// Which order tag drives tiering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSelector {
    StartOrder,
    StopOrder,
}

impl OrderSelector {
    /// Pick the selected order value out of classified tags.
    pub fn order<'a>(&self, tags: &'a InstanceTags) -> &'a str {
        match self {
            OrderSelector::StartOrder => &tags.start_order,
            OrderSelector::StopOrder => &tags.stop_order,
        }
    }
}

/// The stack an orchestration applies to.
///
/// Matching is exact: no case folding, no wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTarget {
    pub stack: String,
    pub environment: String,
    pub profile: String,
}

impl StackTarget {
    pub fn new(
        stack: impl Into<String>,
        environment: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            environment: environment.into(),
            profile: profile.into(),
        }
    }
}

impl fmt::Display for StackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.stack, self.environment, self.profile)
    }
}

/// Matched instances bucketed by their literal order tag.
///
/// Built fresh for every orchestration and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TierPlan {
    selector: OrderSelector,
    tiers: BTreeMap<String, Vec<Instance>>,
    max_tier: u64,
}

impl TierPlan {
    pub(crate) fn new(
        selector: OrderSelector,
        tiers: BTreeMap<String, Vec<Instance>>,
        max_tier: u64,
    ) -> Self {
        Self {
            selector,
            tiers,
            max_tier,
        }
    }

    pub fn selector(&self) -> OrderSelector {
        self.selector
    }

    /// All buckets keyed by literal order tag, including the empty key.
    pub fn tiers(&self) -> &BTreeMap<String, Vec<Instance>> {
        &self.tiers
    }

    /// Largest positive integer order value, 0 when none parse.
    pub fn max_tier(&self) -> u64 {
        self.max_tier
    }

    /// Instances of tier `index`, looked up by the index's canonical string form.
    pub fn tier(&self, index: u64) -> Option<&[Instance]> {
        self.tiers.get(&index.to_string()).map(Vec::as_slice)
    }

    /// Instances whose order tag is empty.
    pub fn untagged(&self) -> &[Instance] {
        self.tiers.get("").map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of matched instances.
    pub fn instance_count(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    /// Tiers execution reaches, in ascending index order.
    ///
    /// A tier is visited when its key is the canonical string of an index in
    /// `1..=max_tier`. Only existing buckets are walked, so gaps in the order
    /// values cost nothing.
    pub fn visited_tiers(&self) -> impl Iterator<Item = (u64, &[Instance])> {
        let mut visited: Vec<(u64, &[Instance])> = self
            .tiers
            .iter()
            .filter(|(key, _)| self.is_visited(key))
            .filter_map(|(key, instances)| {
                key.parse::<u64>()
                    .ok()
                    .map(|index| (index, instances.as_slice()))
            })
            .collect();
        visited.sort_unstable_by_key(|(index, _)| *index);
        visited.into_iter()
    }

    /// Matched instances that execution will never reach.
    ///
    /// Buckets such as `"web"`, `"0"`, `"-2"` or `"01"` are classified but
    /// skipped by [`visited_tiers`](Self::visited_tiers). The empty bucket is
    /// excluded; it fails validation instead.
    pub fn unvisited(&self) -> Vec<&Instance> {
        self.tiers
            .iter()
            .filter(|(key, _)| !key.is_empty() && !self.is_visited(key))
            .flat_map(|(_, instances)| instances.iter())
            .collect()
    }

    fn is_visited(&self, key: &str) -> bool {
        match key.parse::<u64>() {
            Ok(index) => index >= 1 && index <= self.max_tier && index.to_string() == key,
            Err(_) => false,
        }
    }

    /// Pre-flight gates, checked in order: every matched instance carries an
    /// order tag, then at least one tier is orderable.
    pub fn validate(&self) -> Result<(), PlanError> {
        let untagged = self.untagged();
        if !untagged.is_empty() {
            return Err(PlanError::IncompleteTagging {
                instance_ids: untagged.iter().map(|i| i.id.clone()).collect(),
            });
        }
        if self.max_tier < 1 {
            return Err(PlanError::NoOrdering);
        }
        Ok(())
    }

    /// One-line description for logs: `{"1": [ids], "2": [ids]} max=2`.
    pub fn summary(&self) -> String {
        let buckets: BTreeMap<&str, Vec<&str>> = self
            .tiers
            .iter()
            .map(|(key, instances)| {
                (
                    key.as_str(),
                    instances.iter().map(|i| i.id.as_str()).collect(),
                )
            })
            .collect();
        format!(
            "{} max={}",
            serde_json::to_string(&buckets).unwrap_or_default(),
            self.max_tier
        )
    }
}
